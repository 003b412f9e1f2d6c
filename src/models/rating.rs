// src/models/rating.rs

use crate::errors::GopherError;
use serde::Serialize;
use std::fmt;

/// A 1-5 star rating, 0 meaning that no rating has been given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    /// No rating has been given
    pub const NONE: Rating = Rating(0);
    /// Pretty bad
    pub const ONE: Rating = Rating(1);
    /// Mediocre
    pub const TWO: Rating = Rating(2);
    /// Okay
    pub const THREE: Rating = Rating(3);
    /// Great
    pub const FOUR: Rating = Rating(4);
    /// Excellent
    pub const FIVE: Rating = Rating(5);

    pub const MAX_STARS: u8 = 5;

    /// Every rating a user can give, worst first
    pub const SCALE: [Rating; 5] = [
        Rating::ONE,
        Rating::TWO,
        Rating::THREE,
        Rating::FOUR,
        Rating::FIVE,
    ];

    pub fn new(value: i64) -> Result<Self, GopherError> {
        match u8::try_from(value) {
            Ok(stars) if stars <= Self::MAX_STARS => Ok(Rating(stars)),
            _ => Err(GopherError::ValidationError(format!(
                "rating must be between 0 and {}, got {}",
                Self::MAX_STARS,
                value
            ))),
        }
    }

    pub fn stars(self) -> u8 {
        self.0
    }

    pub fn is_rated(self) -> bool {
        self.0 > 0
    }

    /// Average of many ratings, rounded half up
    /// DOCUMENTATION: Mirrors ROUND(AVG(rating)) in the relational backend
    pub fn average(ratings: &[Rating]) -> Rating {
        if ratings.is_empty() {
            return Rating::NONE;
        }
        let n = ratings.len() as u64;
        let sum: u64 = ratings.iter().map(|r| u64::from(r.0)).sum();
        // floor(sum / n + 1/2)
        let rounded = (2 * sum + n) / (2 * n);
        Rating(rounded as u8)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
