//! Salted PBKDF2-SHA256 password hashes, stored as
//! `pbkdf2_sha256$<iterations>$<salt>$<hex digest>`.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use uuid::Uuid;

const ALGORITHM: &str = "pbkdf2_sha256";
const KEY_LEN: usize = 32;

#[cfg(not(test))]
const ITERATIONS: u32 = 600_000;
#[cfg(test)]
const ITERATIONS: u32 = 1_000;

pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    encode(password, &salt, ITERATIONS)
}

fn encode(password: &str, salt: &str, iterations: u32) -> String {
    format!(
        "{ALGORITHM}${iterations}${salt}${}",
        derive(password, salt, iterations)
    )
}

fn derive(password: &str, salt: &str, iterations: u32) -> String {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    hex::encode(key)
}

/// False for a wrong password and for anything that is not one of our hashes.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(ALGORITHM), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    if iterations == 0 || salt.is_empty() {
        return false;
    }

    constant_time_eq(derive(password, salt, iterations).as_bytes(), expected.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verifies_only_the_same_password() {
        let stored = hash_password("vocacion2025");
        assert!(stored.starts_with("pbkdf2_sha256$1000$"));
        assert!(verify_password("vocacion2025", &stored));
        assert!(!verify_password("vocacion2026", &stored));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("secreto123"), hash_password("secreto123"));
    }

    #[test]
    fn test_iterations_come_from_the_stored_hash() {
        let stored = encode("secreto123", "sal", 7);
        assert!(verify_password("secreto123", &stored));
    }

    #[test]
    fn test_malformed_hashes_never_verify() {
        for stored in [
            "",
            "secreto123",
            "md5$1$sal$abc",
            "pbkdf2_sha256$x$sal$abc",
            "pbkdf2_sha256$0$sal$abc",
            "pbkdf2_sha256$10$$abc",
            "pbkdf2_sha256$10$sal$abc$extra",
        ] {
            assert!(!verify_password("secreto123", stored), "{stored}");
        }
    }
}
