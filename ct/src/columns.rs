//! Spreadsheet column names (A, B, ..., Z, AA, ...) and their numbers

use thiserror::Error;

const LETTERS: u32 = 26;

/// Errors converting a column name to its number
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColumnError {
    #[error("Empty column name")]
    Empty,

    #[error("Invalid character '{ch}' in column name '{name}'")]
    InvalidCharacter { name: String, ch: char },

    #[error("Column name '{name}' is too large")]
    Overflow { name: String },
}

/// Column name for a 1-based column number; 0 has no name
///
/// 1 → `A`, 26 → `Z`, 27 → `AA`, 703 → `AAA`.
pub fn column_name(n: u32) -> String {
    let mut letters = Vec::new();
    let mut n = n;
    while n > 0 {
        let r = (n - 1) % LETTERS;
        n = (n - 1) / LETTERS;
        letters.push(char::from(b'A' + r as u8));
    }
    letters.iter().rev().collect()
}

/// 1-based column number for a column name, case-insensitive
pub fn column_number(name: &str) -> Result<u32, ColumnError> {
    if name.is_empty() {
        return Err(ColumnError::Empty);
    }

    name.chars().try_fold(0u32, |acc, ch| {
        if !ch.is_ascii_alphabetic() {
            return Err(ColumnError::InvalidCharacter {
                name: name.to_string(),
                ch,
            });
        }
        let digit = u32::from(ch.to_ascii_uppercase() as u8 - b'A') + 1;
        acc.checked_mul(LETTERS)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| ColumnError::Overflow { name: name.to_string() })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_column_name_boundaries() {
        assert_eq!(column_name(0), "");
        assert_eq!(column_name(1), "A");
        assert_eq!(column_name(26), "Z");
        assert_eq!(column_name(27), "AA");
        assert_eq!(column_name(52), "AZ");
        assert_eq!(column_name(53), "BA");
        assert_eq!(column_name(702), "ZZ");
        assert_eq!(column_name(703), "AAA");
        assert_eq!(column_name(16384), "XFD");
    }

    #[test]
    fn test_column_number_known_values() {
        assert_eq!(column_number("A"), Ok(1));
        assert_eq!(column_number("Z"), Ok(26));
        assert_eq!(column_number("AA"), Ok(27));
        assert_eq!(column_number("AAA"), Ok(703));
        assert_eq!(column_number("xfd"), Ok(16384));
    }

    #[test]
    fn test_column_number_rejects_bad_input() {
        assert_eq!(column_number(""), Err(ColumnError::Empty));
        assert_eq!(
            column_number("A1"),
            Err(ColumnError::InvalidCharacter {
                name: "A1".to_string(),
                ch: '1'
            })
        );
        assert!(matches!(column_number("Ñ"), Err(ColumnError::InvalidCharacter { ch: 'Ñ', .. })));
        assert!(matches!(column_number("ZZZZZZZZ"), Err(ColumnError::Overflow { .. })));
    }

    #[test]
    fn test_max_column_round_trips() {
        let name = column_name(u32::MAX);
        assert_eq!(column_number(&name), Ok(u32::MAX));
    }

    proptest! {
        #[test]
        fn prop_name_number_round_trip(n in 1u32..=u32::MAX) {
            prop_assert_eq!(column_number(&column_name(n)), Ok(n));
        }

        #[test]
        fn prop_lower_case_matches_upper(n in 1u32..1_000_000) {
            let name = column_name(n);
            prop_assert_eq!(column_number(&name.to_lowercase()), Ok(n));
        }
    }
}
