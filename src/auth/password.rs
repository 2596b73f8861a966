use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// bcrypt on the blocking pool; hashing at production cost takes long
/// enough to stall a runtime worker.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

/// A stored value that is not a bcrypt hash never matches.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?;
    match outcome {
        Ok(matches) => Ok(matches),
        Err(e) => {
            warn!("Stored password hash is unusable: {}", e);
            Ok(false)
        }
    }
}
