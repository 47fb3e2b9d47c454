use crate::errors::ApiError;

/// Salted adaptive hash for stored credentials.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|_| ApiError::Internal)
}

/// Fails closed: any verification failure reads as "wrong password".
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = bcrypt::hash("hunter2", 4).unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn garbage_hash_fails_closed() {
        assert!(!verify_password("hunter2", "not-a-bcrypt-hash"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = bcrypt::hash("same-password", 4).unwrap();
        let b = bcrypt::hash("same-password", 4).unwrap();
        assert_ne!(a, b);
    }
}
