//! Random character strings.

use rand::Rng;

/// Alphabets for [`generate_characters`].
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterSet {
    /// `A-Z`, `a-z` and `0-9`.
    #[default]
    AZaz09,
    /// `A-Z` and `a-z`.
    AZaz,
    /// `A-Z` and `0-9`.
    AZ09,
    /// `a-z` and `0-9`.
    az09,
    /// `A-Z`.
    AZ,
    /// `a-z`.
    az,
}

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";

impl CharacterSet {
    fn alphabet(self) -> Vec<u8> {
        let parts: &[&str] = match self {
            Self::AZaz09 => &[UPPER, LOWER, DIGITS],
            Self::AZaz => &[UPPER, LOWER],
            Self::AZ09 => &[UPPER, DIGITS],
            Self::az09 => &[LOWER, DIGITS],
            Self::AZ => &[UPPER],
            Self::az => &[LOWER],
        };
        parts.iter().flat_map(|p| p.bytes()).collect()
    }
}

/// Generate `length` characters drawn uniformly from `set`.
pub fn generate_characters(length: usize, set: CharacterSet) -> String {
    let alphabet = set.alphabet();
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_in(s: &str, pred: impl Fn(char) -> bool) -> bool {
        s.chars().all(pred)
    }

    #[test]
    fn test_length_and_default_set() {
        let s = generate_characters(32, CharacterSet::default());
        assert_eq!(s.len(), 32);
        assert!(all_in(&s, |c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_each_set_stays_in_its_alphabet() {
        for _ in 0..20 {
            assert!(all_in(&generate_characters(32, CharacterSet::AZ09), |c| {
                c.is_ascii_uppercase() || c.is_ascii_digit()
            }));
            assert!(all_in(&generate_characters(32, CharacterSet::az09), |c| {
                c.is_ascii_lowercase() || c.is_ascii_digit()
            }));
            assert!(all_in(&generate_characters(32, CharacterSet::AZaz), |c| {
                c.is_ascii_alphabetic()
            }));
            assert!(all_in(&generate_characters(32, CharacterSet::AZ), |c| {
                c.is_ascii_uppercase()
            }));
            assert!(all_in(&generate_characters(32, CharacterSet::az), |c| {
                c.is_ascii_lowercase()
            }));
        }
    }

    #[test]
    fn test_zero_length() {
        assert!(generate_characters(0, CharacterSet::AZ).is_empty());
    }
}
