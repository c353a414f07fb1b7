//! 4 character Maidenhead locators
//!
//! A field (two letters `A`-`R`) is 20° of longitude by 10° of latitude, and
//! a square (two digits) divides it into 2° by 1° cells. Positions are
//! reported at the center of the cell.
//!
//! <https://en.wikipedia.org/wiki/Maidenhead_Locator_System>

use std::{
    fmt::{
        Debug,
        Display,
    },
    str::FromStr,
};

use crate::Coordinate;

const FIELD_WIDTH: f64 = 20.0;
const FIELD_HEIGHT: f64 = 10.0;
const SQUARE_WIDTH: f64 = 2.0;
const SQUARE_HEIGHT: f64 = 1.0;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gridsquare {
    field: [u8; 2],
    square: [u8; 2],
}

impl Gridsquare {
    /// Center of the 2°x1° cell.
    pub fn center(&self) -> Coordinate {
        let south_west = self.south_west();
        Coordinate::new_unchecked(
            south_west.latitude + SQUARE_HEIGHT / 2.0,
            south_west.longitude + SQUARE_WIDTH / 2.0,
        )
    }

    pub fn south_west(&self) -> Coordinate {
        let longitude = -180.0
            + f64::from(self.field[0] - b'A') * FIELD_WIDTH
            + f64::from(self.square[0] - b'0') * SQUARE_WIDTH;
        let latitude = -90.0
            + f64::from(self.field[1] - b'A') * FIELD_HEIGHT
            + f64::from(self.square[1] - b'0') * SQUARE_HEIGHT;
        Coordinate::new_unchecked(latitude, longitude)
    }
}

impl Display for Gridsquare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.field[0] as char, self.field[1] as char, self.square[0] as char, self.square[1] as char
        )
    }
}

impl Debug for Gridsquare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Gridsquare({self})")
    }
}

impl FromStr for Gridsquare {
    type Err = InvalidGridsquare;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || {
            InvalidGridsquare {
                input: s.to_owned(),
            }
        };

        let &[f0, f1, s0, s1] = s.as_bytes()
        else {
            return Err(err());
        };

        let is_field = |b: u8| (b'A'..=b'R').contains(&b);
        if !is_field(f0) || !is_field(f1) || !s0.is_ascii_digit() || !s1.is_ascii_digit() {
            return Err(err());
        }

        Ok(Self {
            field: [f0, f1],
            square: [s0, s1],
        })
    }
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("Invalid gridsquare: {input:?}")]
pub struct InvalidGridsquare {
    pub input: String,
}

/// Approximate position of a 4 character gridsquare (center of the cell).
pub fn geocode(gridsquare: &str) -> Result<Coordinate, InvalidGridsquare> {
    Ok(gridsquare.parse::<Gridsquare>()?.center())
}
