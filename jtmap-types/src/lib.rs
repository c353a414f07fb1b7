//! Shared value types for jtmap: positions, Maidenhead gridsquares, distances
//! and the normalized contact records produced by callsign lookups.

mod contact;
mod coordinate;
mod distance;
mod gridsquare;

pub use contact::{
    ContactRecord,
    HomeStation,
};
pub use coordinate::Coordinate;
pub use distance::{
    Distance,
    DistanceUnit,
    DistanceUnitFromStrError,
    distance,
    geodesic_distance,
};
pub use gridsquare::{
    Gridsquare,
    InvalidGridsquare,
    geocode,
};
