use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::schema::Schema;

/// Declares a closed set of lowercase wire values. Parsing is
/// case-insensitive; serialization always emits the canonical form.
macro_rules! string_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub const VALUES: &'static [&'static str] = &[$($value),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(format!("invalid value '{}', expected one of: {}", s, Self::VALUES.join(", "))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Implements [`Resource`] for a struct whose key is a plain `i64` field.
macro_rules! resource {
    ($ty:ty, $schema:path, $field:ident) => {
        impl $crate::database::models::Resource for $ty {
            const SCHEMA: &'static $crate::schema::Schema = &$schema;

            fn id(&self) -> i64 {
                self.$field
            }

            fn set_id(&mut self, id: i64) {
                self.$field = id;
            }
        }
    };
}

pub mod application;
pub mod assignment;
pub mod module;
pub mod notification;
pub mod organization;
pub mod profile;
pub mod scenario;
pub mod skill;
pub mod training;
pub mod user;

pub use application::*;
pub use assignment::*;
pub use module::*;
pub use notification::*;
pub use organization::*;
pub use profile::*;
pub use scenario::*;
pub use skill::*;
pub use training::*;
pub use user::*;

/// A typed record stored as one document in a schema-guarded collection.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    const SCHEMA: &'static Schema;

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
}

/// Structured payloads arrive either as JSON or as a string holding JSON.
/// Strings that do not parse are kept verbatim.
pub fn opaque_json<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        other => other,
    })
}

pub fn empty_object() -> Value {
    Value::Object(Default::default())
}
