//! # jtmap
//!
//! Listens for QSOs logged by [WSJT-X][1], looks up the other station and
//! works out how far away it is.
//!
//! WSJT-X sends a `LoggedADIF` message to its UDP server port whenever the
//! operator logs a contact. [`Ingest`] receives those, [`Enricher`] turns them
//! into an [`EnrichedContact`] and a [`Surface`] shows the result.
//!
//! [1]: https://wsjt.sourceforge.io/wsjtx.html

pub mod config;
pub mod enrich;
pub mod ingest;
pub mod surface;

pub use crate::{
    enrich::{
        EnrichedContact,
        Enricher,
        Outcome,
        SkipReason,
    },
    ingest::Ingest,
    surface::{
        ConsoleSurface,
        Surface,
    },
};

#[derive(Debug, thiserror::Error)]
#[error("jtmap error")]
pub enum Error {
    Io(#[from] std::io::Error),
    Lookup(#[from] jtmap_lookup::Error),
    #[error("invalid home position: {latitude}, {longitude}")]
    InvalidHomePosition { latitude: f64, longitude: f64 },
    #[error("--lookup qrz needs --qrz-username and --qrz-password")]
    MissingQrzCredentials,
}
