//! Salted, iterated SHA-256 password digests.
//!
//! Stored form: `sha256$<rounds>$<salt, base64>$<digest, hex>`.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use rand::Rng;
use sha2::{Digest, Sha256};

const ROUNDS: u32 = 10_000;
const SCHEME: &str = "sha256";

fn digest(password: &str, salt: &[u8], rounds: u32) -> String {
    let mut hash = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..rounds {
        hash = Sha256::new().chain_update(salt).chain_update(hash).finalize();
    }
    format!("{:x}", hash)
}

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::rng().fill(&mut salt);
    format!(
        "{SCHEME}${ROUNDS}${}${}",
        STANDARD_NO_PAD.encode(salt),
        digest(password, &salt, ROUNDS)
    )
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    let Ok(rounds) = rounds.parse::<u32>() else {
        return false;
    };
    let Ok(salt) = STANDARD_NO_PAD.decode(salt) else {
        return false;
    };

    let actual = digest(password, &salt, rounds.max(1));
    // compare without short-circuiting
    actual.len() == expected.len()
        && actual
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let stored = hash_password("hunter22");
        assert!(stored.starts_with("sha256$10000$"));
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        assert_ne!(hash_password("pw"), hash_password("pw"));
    }

    #[test]
    fn malformed_digests_never_verify() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "plaintext"));
        assert!(!verify_password("pw", "md5$1$AAAA$00"));
        assert!(!verify_password("pw", "sha256$x$AAAA$00"));
    }
}
