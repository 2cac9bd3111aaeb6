use crate::error::WalletError;

/// bcrypt work factor for every stored hash.
pub const PASSWORD_HASH_COST: u32 = 10;

/// Hash `password` on the blocking pool; bcrypt would otherwise stall the runtime.
pub async fn hash_password(password: &str) -> Result<String, WalletError> {
    let password = password.to_owned();
    let hash =
        tokio::task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_HASH_COST)).await??;
    Ok(hash)
}

/// Compare `password` against a stored bcrypt `hash`.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, WalletError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(ok)
}
