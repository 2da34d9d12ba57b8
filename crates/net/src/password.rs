/// Fixed salt mixed into every password hash. Not a secret; its only job is
/// to keep a stored hash from being a bare password digest.
const PASSWORD_SALT: &str = "tinymush-core";

/// Hashes a password for storage in the `ATTR_PASSWORD` attribute (spec.md
/// §4.H "password-checked" connect contract). This is a stable digest, not
/// a cryptographic KDF — it matches the scope of the attribute-store
/// password slot without pulling in an external hashing crate the rest of
/// the workspace doesn't otherwise need.
pub fn hash_password(password: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    PASSWORD_SALT.hash(&mut hasher);
    password.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Checks a login attempt against a stored hash.
pub fn verify_password(stored_hash: &str, attempt: &str) -> bool {
    stored_hash == hash_password(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_password_verifies() {
        let hash = hash_password("hunter2");
        assert!(verify_password(&hash, "hunter2"));
    }

    #[test]
    fn wrong_password_fails() {
        let hash = hash_password("hunter2");
        assert!(!verify_password(&hash, "wrong"));
    }

    #[test]
    fn hash_is_not_the_plaintext_password() {
        assert_ne!(hash_password("hunter2"), "hunter2");
    }
}
