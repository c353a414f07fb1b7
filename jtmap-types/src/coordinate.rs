use std::fmt::Display;

/// Latitude and longitude in degrees (WGS-84).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `None` if either component is non-finite or outside
    /// `[-90, 90]` / `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        ((-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude))
            .then(|| Self::new_unchecked(latitude, longitude))
    }

    /// Position reported by a lookup provider.
    ///
    /// Providers report `0.0, 0.0` when they don't know where a station is, so
    /// that exact value is treated as unresolved along with anything [`new`]
    /// rejects.
    ///
    /// [`new`]: Self::new
    pub fn resolved(latitude: f64, longitude: f64) -> Option<Self> {
        if latitude == 0.0 && longitude == 0.0 {
            None
        }
        else {
            Self::new(latitude, longitude)
        }
    }

    /// Parses a position from the decimal strings most lookup services use.
    pub fn resolved_from_strs(latitude: &str, longitude: &str) -> Option<Self> {
        let latitude = latitude.trim().parse().ok()?;
        let longitude = longitude.trim().parse().ok()?;
        Self::resolved(latitude, longitude)
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use crate::Coordinate;

    #[test]
    fn it_rejects_out_of_range_components() {
        assert!(Coordinate::new(90.5, 0.0).is_none());
        assert!(Coordinate::new(-91.0, 0.0).is_none());
        assert!(Coordinate::new(0.0, 180.1).is_none());
        assert!(Coordinate::new(f64::NAN, 0.0).is_none());
        assert!(Coordinate::new(-90.0, 180.0).is_some());
    }

    #[test]
    fn zero_zero_is_unresolved() {
        assert!(Coordinate::resolved(0.0, 0.0).is_none());
        assert!(Coordinate::resolved(0.0, 1.0).is_some());
        assert!(Coordinate::resolved_from_strs("0", "0.0").is_none());
        assert!(Coordinate::resolved_from_strs("", "").is_none());
        assert_eq!(
            Coordinate::resolved_from_strs(" 41.714775", "-72.727260"),
            Some(Coordinate::new_unchecked(41.714775, -72.72726))
        );
    }
}
