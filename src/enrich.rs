use chrono::{
    DateTime,
    Utc,
};
use jtmap_lookup::Resolver;
use jtmap_types::{
    ContactRecord,
    Coordinate,
    Distance,
    DistanceUnit,
    HomeStation,
    geocode,
};
use jtmap_wsjtx::QsoRecord;

/// Why a datagram didn't produce a contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Heartbeats, status updates, decodes, ...
    NotLoggedQso,
    Malformed,
    NoCallsign,
    NoGridsquare,
    InvalidGridsquare,
    /// Neither configured nor logged by WSJT-X.
    NoHomePosition,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Skipped(SkipReason),
    Enriched(EnrichedContact),
}

impl Outcome {
    pub fn enriched(&self) -> Option<&EnrichedContact> {
        match self {
            Outcome::Enriched(contact) => Some(contact),
            Outcome::Skipped(_) => None,
        }
    }
}

/// A confirmed QSO with everything we know about the other station.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrichedContact {
    /// From the lookup service if it knew the callsign, otherwise just what
    /// WSJT-X logged.
    pub contact: ContactRecord,

    /// Where the other station is. This is the lookup service's position if it
    /// had one, otherwise the center of the logged gridsquare.
    pub position: Coordinate,

    pub home: HomeStation,
    pub distance: Distance,

    /// Whether the lookup service knew the callsign.
    pub looked_up: bool,

    pub confirmed_at: DateTime<Utc>,
    pub mode: Option<String>,
    pub band: Option<String>,
}

#[derive(Debug)]
pub struct Enricher {
    resolver: Option<Resolver>,
    home_position: Option<Coordinate>,
    home: Option<HomeStation>,
    unit: DistanceUnit,
}

impl Enricher {
    /// `home_position` overrides the gridsquare WSJT-X logs for our own
    /// station. Without a `resolver` only the logged data is used.
    pub fn new(
        resolver: Option<Resolver>,
        home_position: Option<Coordinate>,
        unit: DistanceUnit,
    ) -> Self {
        Self {
            resolver,
            home_position,
            home: None,
            unit,
        }
    }

    /// The home station, once it's known.
    pub fn home(&self) -> Option<&HomeStation> {
        self.home.as_ref()
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    pub async fn enrich(&mut self, qso: &QsoRecord) -> Outcome {
        let Some(call) = qso.call()
        else {
            tracing::warn!(adif = ?qso.adif(), "logged qso without callsign");
            return Outcome::Skipped(SkipReason::NoCallsign);
        };
        tracing::info!(%call, mode = ?qso.mode(), band = ?qso.band(), "qso confirmed");

        let Some(gridsquare) = qso.gridsquare()
        else {
            tracing::info!(%call, "no gridsquare logged");
            return Outcome::Skipped(SkipReason::NoGridsquare);
        };

        let Some(home) = self.resolve_home(qso)
        else {
            tracing::warn!(%call, "home position unknown. set --latitude/--longitude or log your gridsquare");
            return Outcome::Skipped(SkipReason::NoHomePosition);
        };

        let provisional = match geocode(locator(gridsquare)) {
            Ok(coordinate) => coordinate,
            Err(error) => {
                tracing::warn!(%call, %error, "can't place contact");
                return Outcome::Skipped(SkipReason::InvalidGridsquare);
            }
        };

        let found = match &mut self.resolver {
            Some(resolver) => resolver.resolve(call).await,
            None => None,
        };
        let looked_up = found.is_some();

        let mut contact = found.unwrap_or_else(|| ContactRecord::unresolved(call, gridsquare));
        let position = match contact.coordinate {
            Some(coordinate) => {
                if contact.gridsquare.is_empty() {
                    contact.gridsquare = gridsquare.to_owned();
                }
                coordinate
            }
            None => {
                // placed by the logged gridsquare, so that's the one to show
                contact.gridsquare = gridsquare.to_owned();
                provisional
            }
        };
        let distance = Distance::between(home.coordinate, position, self.unit);

        let enriched = EnrichedContact {
            contact,
            position,
            home,
            distance,
            looked_up,
            confirmed_at: Utc::now(),
            mode: qso.mode().map(ToOwned::to_owned),
            band: qso.band().map(ToOwned::to_owned),
        };
        tracing::info!(
            call = %enriched.contact.callsign,
            name = %enriched.contact.name,
            qth = %enriched.contact.qth,
            position = %enriched.position,
            distance = %enriched.distance,
            "contact enriched"
        );

        Outcome::Enriched(enriched)
    }

    fn resolve_home(&mut self, qso: &QsoRecord) -> Option<HomeStation> {
        if let Some(home) = &self.home {
            return Some(home.clone());
        }

        let coordinate = match self.home_position {
            Some(coordinate) => coordinate,
            None => {
                let my_gridsquare = qso.my_gridsquare()?;
                match geocode(locator(my_gridsquare)) {
                    Ok(coordinate) => coordinate,
                    Err(error) => {
                        tracing::warn!(%error, "can't place home station");
                        return None;
                    }
                }
            }
        };

        let home = HomeStation {
            callsign: qso.station_callsign().unwrap_or_default().to_owned(),
            coordinate,
        };
        tracing::info!(callsign = %home.callsign, position = %home.coordinate, "home station");
        self.home = Some(home.clone());
        Some(home)
    }
}

/// ADIF gridsquares can have 6 or 8 characters. We only place stations by the
/// 4 character square.
fn locator(gridsquare: &str) -> &str {
    gridsquare.get(..4).unwrap_or(gridsquare)
}
