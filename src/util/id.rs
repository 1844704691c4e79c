//! Entity identifiers: creation timestamp followed by a short random suffix.

use rand::Rng;
use time::OffsetDateTime;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 8;

/// Generate a fresh entity id such as `1718031234567k3v9x0qa`.
///
/// The millisecond prefix keeps ids roughly creation-ordered; the base-36 suffix
/// separates entities created within the same millisecond (bulk imports).
pub fn new_entity_id() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())]))
        .collect();
    format!("{millis}{suffix}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_within_one_millisecond_do_not_collide() {
        let ids: HashSet<String> = (0..500).map(|_| new_entity_id()).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn id_starts_with_timestamp_digits() {
        let id = new_entity_id();
        let digits = id.chars().take_while(char::is_ascii_digit).count();
        assert!(digits >= 13, "unexpected id {id}");
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}
