use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

/// Memory cost in KiB.
const M_COST: u32 = 19_456;
/// Passes over memory.
const T_COST: u32 = 2;
const P_COST: u32 = 1;

/// Argon2id v1.3 with the work factor spelled out. Verification reads the
/// parameters back from each stored hash, so raising them later stays compatible.
fn hasher() -> anyhow::Result<Argon2<'static>> {
    let params = Params::new(M_COST, T_COST, P_COST, None)
        .map_err(|e| anyhow::anyhow!("argon2 params: {e}"))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes `plain` with a fresh random salt. The PHC string embeds salt and parameters.
pub fn hash(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Constant-time check of `plain` against a stored PHC string.
/// A hash that cannot be parsed is an error rather than a mismatch.
pub fn verify(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(hasher()?
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

// Argon2 is deliberately slow; keep it off the async workers.

pub async fn hash_blocking(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash(&plain))
        .await
        .context("password hashing task")?
}

pub async fn verify_blocking(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify(&plain, &hash))
        .await
        .context("password verification task")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_differs_from_input_and_verifies() {
        let password = "Secur3P@ssw0rd!";
        let hashed = hash(password).expect("hashing should succeed");
        assert_ne!(hashed, password);
        assert!(!hashed.contains(password));
        assert!(verify(password, &hashed).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hashed = hash("correct-horse-battery-staple").expect("hashing should succeed");
        assert!(!verify("wrong-password", &hashed).expect("verify should not error"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash("Abcdef1!").unwrap();
        let b = hash("Abcdef1!").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn hash_records_explicit_parameters() {
        let hashed = hash("Abcdef1!").unwrap();
        assert!(
            hashed.starts_with(&format!("$argon2id$v=19$m={M_COST},t={T_COST},p={P_COST}$")),
            "{hashed}"
        );
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn blocking_wrappers_roundtrip() {
        let hashed = hash_blocking("Abcdef1!".into()).await.unwrap();
        assert!(verify_blocking("Abcdef1!".into(), hashed.clone()).await.unwrap());
        assert!(!verify_blocking("Abcdef1?".into(), hashed).await.unwrap());
    }
}
