use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use blogs_shared::errors::AppError;

/// Argon2id digest in PHC string form.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Verifies `password` against a throwaway digest and reports no match, so a
/// login for an unknown account does the same Argon2 work as a wrong password.
pub fn verify_unknown_account(password: &str) -> Result<bool, AppError> {
    static PLACEHOLDER: OnceLock<Option<String>> = OnceLock::new();
    let Some(hash) = PLACEHOLDER.get_or_init(|| hash_password("unknown-account").ok()) else {
        return Ok(false);
    };
    verify_password(password, hash)?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        assert_ne!(hash_password("pw").unwrap(), hash_password("pw").unwrap());
    }

    #[test]
    fn corrupt_digest_is_an_internal_error() {
        let err = verify_password("pw", "not-a-phc-string").unwrap_err();
        assert!(err.status_code().is_server_error());
    }

    #[test]
    fn unknown_account_never_matches() {
        assert!(!verify_unknown_account("unknown-account").unwrap());
        assert!(!verify_unknown_account("anything").unwrap());
    }
}
