//! Geodesic distance on the WGS-84 ellipsoid
//!
//! Uses Vincenty's inverse formula. It doesn't converge for nearly antipodal
//! points, in which case we fall back to the great-circle distance on a
//! sphere with the mean earth radius.
//!
//! - <https://en.wikipedia.org/wiki/Vincenty%27s_formulae>
//! - <https://www.movable-type.co.uk/scripts/latlong-vincenty.html>

use std::{
    cmp::Ordering,
    fmt::Display,
    str::FromStr,
};

use crate::Coordinate;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE_THRESHOLD: f64 = 1e-12;

const METERS_PER_KILOMETER: f64 = 1000.0;
const METERS_PER_MILE: f64 = 1609.344;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DistanceUnit {
    Kilometers,
    #[default]
    Miles,
}

impl DistanceUnit {
    pub fn convert_meters(&self, meters: f64) -> f64 {
        match self {
            DistanceUnit::Kilometers => meters / METERS_PER_KILOMETER,
            DistanceUnit::Miles => meters / METERS_PER_MILE,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
        }
    }
}

impl Display for DistanceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for DistanceUnit {
    type Err = DistanceUnitFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => Ok(Self::Kilometers),
            "mi" | "mile" | "miles" => Ok(Self::Miles),
            _ => {
                Err(DistanceUnitFromStrError {
                    input: s.to_owned(),
                })
            }
        }
    }
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("Invalid distance unit: {input}")]
pub struct DistanceUnitFromStrError {
    pub input: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Distance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl Distance {
    pub fn between(a: Coordinate, b: Coordinate, unit: DistanceUnit) -> Self {
        Self {
            value: distance(a, b, unit),
            unit,
        }
    }
}

impl Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0} {}", self.value, self.unit)
    }
}

/// Distance between two positions in the given unit.
pub fn distance(a: Coordinate, b: Coordinate, unit: DistanceUnit) -> f64 {
    unit.convert_meters(geodesic_distance(a, b))
}

/// Distance between two positions in meters.
pub fn geodesic_distance(a: Coordinate, b: Coordinate) -> f64 {
    // evaluate in a fixed order, so swapping the arguments gives the exact same
    // result.
    let (a, b) = match compare(&a, &b) {
        Ordering::Greater => (b, a),
        _ => (a, b),
    };

    vincenty_inverse(a, b).unwrap_or_else(|| haversine(a, b))
}

fn compare(a: &Coordinate, b: &Coordinate) -> Ordering {
    a.latitude
        .total_cmp(&b.latitude)
        .then_with(|| a.longitude.total_cmp(&b.longitude))
}

fn haversine(a: Coordinate, b: Coordinate) -> f64 {
    let phi_1 = a.latitude.to_radians();
    let phi_2 = b.latitude.to_radians();
    let d_phi = phi_2 - phi_1;
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi_1.cos() * phi_2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * MEAN_EARTH_RADIUS * h.sqrt().min(1.0).asin()
}

fn vincenty_inverse(a: Coordinate, b: Coordinate) -> Option<f64> {
    let l = (b.longitude - a.longitude).to_radians();

    // reduced latitudes
    let u_1 = ((1.0 - WGS84_F) * a.latitude.to_radians().tan()).atan();
    let u_2 = ((1.0 - WGS84_F) * b.latitude.to_radians().tan()).atan();
    let (sin_u_1, cos_u_1) = u_1.sin_cos();
    let (sin_u_2, cos_u_2) = u_2.sin_cos();

    let mut lambda = l;

    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();

        let sin_sigma = ((cos_u_2 * sin_lambda).powi(2)
            + (cos_u_1 * sin_u_2 - sin_u_1 * cos_u_2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            // coincident points
            return Some(0.0);
        }

        let cos_sigma = sin_u_1 * sin_u_2 + cos_u_1 * cos_u_2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);

        let sin_alpha = cos_u_1 * cos_u_2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;

        // on the equator cos_sq_alpha is 0
        let cos_2_sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u_1 * sin_u_2 / cos_sq_alpha
        }
        else {
            0.0
        };

        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));

        let lambda_previous = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2_sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2_sigma_m.powi(2))));

        if (lambda - lambda_previous).abs() < CONVERGENCE_THRESHOLD {
            let u_sq = cos_sq_alpha * (WGS84_A.powi(2) - WGS84_B.powi(2)) / WGS84_B.powi(2);
            let big_a =
                1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = big_b
                * sin_sigma
                * (cos_2_sigma_m
                    + big_b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2_sigma_m.powi(2))
                            - big_b / 6.0
                                * cos_2_sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2_sigma_m.powi(2))));

            return Some(WGS84_B * big_a * (sigma - delta_sigma));
        }
    }

    None
}
