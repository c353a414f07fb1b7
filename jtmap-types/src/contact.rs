use crate::Coordinate;

/// Normalized result of a callsign lookup.
///
/// Text fields are empty when unknown. `coordinate` is `None` if the lookup
/// service couldn't place the station, in which case the position derived from
/// the gridsquare must be used instead.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContactRecord {
    pub callsign: String,
    pub name: String,
    pub qth: String,
    pub gridsquare: String,
    pub coordinate: Option<Coordinate>,
}

impl ContactRecord {
    /// Record for a station we only know from the QSO itself.
    pub fn unresolved(callsign: impl Into<String>, gridsquare: impl Into<String>) -> Self {
        Self {
            callsign: callsign.into(),
            gridsquare: gridsquare.into(),
            ..Default::default()
        }
    }

    /// Joins the non-empty, trimmed parts with `separator`.
    pub fn join_parts<'a>(parts: impl IntoIterator<Item = &'a str>, separator: &str) -> String {
        parts
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// The operator's own station.
#[derive(Clone, Debug, PartialEq)]
pub struct HomeStation {
    /// Empty if WSJT-X didn't tell us.
    pub callsign: String,
    pub coordinate: Coordinate,
}
