use argon2::{
    password_hash::{self, PasswordHashString, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use rand::rngs::OsRng;

/// Hashes a password with argon2 and a fresh random salt, in PHC string form.
pub fn hash_password(pw: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default().hash_password(pw.as_bytes(), &salt)?.to_string())
}

/// False for a wrong password; an error only when the stored hash is malformed.
pub fn verify_password(pw: &str, hash: &str) -> Result<bool, password_hash::Error> {
    let hash = PasswordHashString::new(hash)?;
    Ok(Argon2::default()
        .verify_password(pw.as_bytes(), &hash.password_hash())
        .is_ok())
}

/// `hash_password` on the blocking pool, off the async workers.
pub async fn spawn_hash_password(pw: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&pw))
        .await?
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))
}

/// `verify_password` on the blocking pool. The outer error is a failed task.
pub async fn spawn_verify_password(
    pw: String,
    hash: String,
) -> anyhow::Result<Result<bool, password_hash::Error>> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&pw, &hash)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawned_hash_then_verify() {
        let hash = spawn_hash_password("correct horse".to_string()).await.unwrap();
        assert!(spawn_verify_password("correct horse".to_string(), hash.clone())
            .await
            .unwrap()
            .unwrap());
        assert!(!spawn_verify_password("wrong horse".to_string(), hash)
            .await
            .unwrap()
            .unwrap());
        assert!(spawn_verify_password("pw".to_string(), "garbage".to_string())
            .await
            .unwrap()
            .is_err());
    }

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("pw", "not-a-phc-string").is_err());
    }
}
