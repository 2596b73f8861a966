// handlers/mod.rs - Route handlers grouped by resource
//
// Public reads and token acquisition need no credentials; every write goes
// through the bearer middleware attached in `lib.rs` and then a `Policy`
// check inside the handler.

pub mod applications;
pub mod auth;
pub mod modules;
pub mod organizations;
pub mod profiles;
pub mod query;
pub mod resources;
pub mod root;
pub mod scenarios;
pub mod users;

use serde_json::json;

use crate::database::models::UserProfile;
use crate::database::{DatabaseError, Repository};
use crate::filter::FilterData;

/// The profile belonging to `user_id`, if one was created.
pub(crate) async fn profile_of(
    profiles: &Repository<UserProfile>,
    user_id: i64,
) -> Result<Option<UserProfile>, DatabaseError> {
    profiles.select_one(FilterData::with_where(json!({ "userId": user_id }))).await
}
