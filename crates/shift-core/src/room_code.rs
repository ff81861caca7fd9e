//! Short, human-shareable room codes.
//!
//! Codes are meant to be read aloud or typed from a screen, so the alphabet
//! leaves out look-alike characters (I, O, 0, 1). They identify a room; they
//! grant no access and are not secret.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const ROOM_CODE_LEN: usize = 6;
pub const ROOM_CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomCodeError {
    #[error("room code must be {expected} chars, got {found}")]
    InvalidLength { expected: usize, found: usize },

    #[error("invalid character '{ch}' at position {index}")]
    InvalidCharacter { ch: char, index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Parse a code, accepting lowercase input
    pub fn parse(value: &str) -> Result<Self, RoomCodeError> {
        let value = value.trim();
        let found = value.chars().count();
        if found != ROOM_CODE_LEN {
            return Err(RoomCodeError::InvalidLength {
                expected: ROOM_CODE_LEN,
                found,
            });
        }

        let upper = value.to_ascii_uppercase();
        for (index, ch) in upper.chars().enumerate() {
            if !ROOM_CODE_ALPHABET.contains(ch) {
                return Err(RoomCodeError::InvalidCharacter { ch, index });
            }
        }
        Ok(Self(upper))
    }

    /// A random code drawn from `rng`
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let alphabet = ROOM_CODE_ALPHABET.as_bytes();
        let code = (0..ROOM_CODE_LEN)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RoomCode {
    type Err = RoomCodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = RoomCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> String {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_codes_parse() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let code = RoomCode::generate(&mut rng);
            assert_eq!(RoomCode::parse(code.as_str()), Ok(code));
        }
    }

    #[test]
    fn test_parse_normalizes_case() {
        let code: RoomCode = "ab3xyz".parse().unwrap();
        assert_eq!(code.as_str(), "AB3XYZ");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            RoomCode::parse("ABC"),
            Err(RoomCodeError::InvalidLength {
                expected: 6,
                found: 3
            })
        );
        assert_eq!(
            RoomCode::parse("ABCDE0"),
            Err(RoomCodeError::InvalidCharacter { ch: '0', index: 5 })
        );
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<RoomCode>(r#""ABCDEF""#).is_ok());
        assert!(serde_json::from_str::<RoomCode>(r#""ABCDE!""#).is_err());
    }
}
