use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;

/// Fixed width of an API key identifier. Identity resolution splits incoming
/// `X-API-KEY` values at this offset, so it must match the column width.
pub const IDENTIFIER_LENGTH: usize = 35;

/// Builds a fresh API key identifier: 17 UTC timestamp digits plus the last
/// 6 digits of the owner id (zero padded), every digit re-cased into a letter
/// with a coin flip, then random alphanumeric padding up to 35 characters.
/// The padding keeps two identifiers minted in the same millisecond for the
/// same owner distinct; the storage layer still enforces uniqueness.
#[must_use]
pub fn generate_identifier(owner_id: i32) -> String {
    let mut rng = rand::rng();

    let stamp = Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
    let owner_digits = format!("{:06}", owner_id.unsigned_abs() % 1_000_000);

    let mut identifier = String::with_capacity(IDENTIFIER_LENGTH);
    for ch in stamp.chars().chain(owner_digits.chars()) {
        identifier.push(recase_digit(ch, &mut rng));
    }
    while identifier.len() < IDENTIFIER_LENGTH {
        identifier.push(char::from(rng.sample(Alphanumeric)));
    }

    identifier
}

/// Maps a decimal digit onto 'A'..'J' or 'a'..'j' at random. Widens the
/// alphabet without changing the length; anything else passes through.
fn recase_digit(ch: char, rng: &mut impl Rng) -> char {
    match ch.to_digit(10) {
        Some(d) => {
            let base = if rng.random_bool(0.5) {
                u32::from(b'A')
            } else {
                u32::from(b'a')
            };
            char::from_u32(base + d).unwrap_or(ch)
        }
        None => ch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identifiers_are_fixed_length_alphanumeric() {
        for owner_id in [1, 42, 999_999, 1_234_567, i32::MAX] {
            let id = generate_identifier(owner_id);
            assert_eq!(id.len(), IDENTIFIER_LENGTH);
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric()), "{id}");
        }
    }

    #[test]
    fn same_owner_same_instant_yields_distinct_identifiers() {
        let mut seen = HashSet::new();
        for _ in 0..200 {
            assert!(seen.insert(generate_identifier(7)));
        }
    }

    #[test]
    fn owner_digits_are_recoverable_from_fixed_positions() {
        let id = generate_identifier(1_234_567);

        // Positions 17..23 hold the owner id's last six digits, re-cased.
        let decoded: String = id[17..23]
            .chars()
            .map(|c| {
                let base = if c.is_ascii_uppercase() { b'A' } else { b'a' };
                char::from(b'0' + (c as u8 - base))
            })
            .collect();
        assert_eq!(decoded, "234567");
    }

    #[test]
    fn timestamp_digits_only_use_the_widened_alphabet() {
        let id = generate_identifier(1);
        assert!(
            id[..23]
                .chars()
                .all(|c| ('A'..='J').contains(&c) || ('a'..='j').contains(&c)),
            "{id}"
        );
    }
}
