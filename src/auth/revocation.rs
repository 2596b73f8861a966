use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

/// Token ids revoked before their expiry.
///
/// Held in process memory: entries are lost on restart and are not shared
/// between instances. Entries drop out once the token would have expired
/// anyway.
#[derive(Debug, Default)]
pub struct RevocationList {
    entries: RwLock<HashMap<String, i64>>,
}

impl RevocationList {
    pub async fn revoke(&self, jti: &str, exp: i64) {
        let now = Utc::now().timestamp();
        let mut entries = self.entries.write().await;
        entries.retain(|_, expires| *expires >= now);
        entries.insert(jti.to_string(), exp);
    }

    pub async fn is_revoked(&self, jti: &str) -> bool {
        self.entries.read().await.contains_key(jti)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
