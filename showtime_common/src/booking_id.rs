use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

pub const MAX_BOOKING_ID_LEN: usize = 64;

//--------------------------------------     BookingId       ---------------------------------------------------------
/// The identifier of a booking record. Booking ids are opaque strings issued by whoever created the booking; the only
/// rules are that they are non-empty, contain no whitespace and are at most [`MAX_BOOKING_ID_LEN`] bytes long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct BookingId(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingIdError {
    #[error("Booking id is empty")]
    Empty,
    #[error("Booking id is longer than {MAX_BOOKING_ID_LEN} bytes")]
    TooLong,
    #[error("Booking id contains whitespace")]
    ContainsWhitespace,
}

impl BookingId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for BookingId {
    type Err = BookingIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(BookingIdError::Empty);
        }
        if s.len() > MAX_BOOKING_ID_LEN {
            return Err(BookingIdError::TooLong);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(BookingIdError::ContainsWhitespace);
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for BookingId {
    type Error = BookingIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.as_str().parse()
    }
}

impl From<BookingId> for String {
    fn from(value: BookingId) -> Self {
        value.0
    }
}

impl AsRef<str> for BookingId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
