//! Callsign lookups
//!
//! Resolves a callsign to the operator's name, QTH and position using one of
//! the supported lookup services:
//!
//! - [callook.info][1] (US callsigns, no account needed)
//! - [HamDB][2] (no account needed)
//! - [QRZ.com XML data][3] (needs a subscription, uses a session key)
//!
//! [1]: https://callook.info/
//! [2]: https://hamdb.org/
//! [3]: https://www.qrz.com/XML/current_spec.html

mod callook;
mod hamdb;
pub mod json;
mod qrz;

use std::time::Duration;

pub use jtmap_types::ContactRecord;
use jtmap_types::Coordinate;
use url::Url;

pub use crate::{
    callook::Callook,
    hamdb::HamDb,
    qrz::{
        Qrz,
        QrzCredentials,
        SessionKey,
    },
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("jtmap/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
#[error("callsign lookup error")]
pub enum Error {
    Http(#[from] reqwest::Error),
    Json(#[from] crate::json::PrettyJsonError),
    Xml(#[from] quick_xml::DeError),
    #[error("invalid api url: {url}")]
    InvalidApiUrl { url: Url },
    #[error("{provider} did not issue a session key: {message}")]
    NoSessionKey {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} session expired: {message}")]
    SessionExpired {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },
}

impl Error {
    /// Drops the request URL from HTTP errors, for requests that carry
    /// credentials in the query.
    pub fn without_url(self) -> Self {
        match self {
            Self::Http(error) => Self::Http(error.without_url()),
            error => error,
        }
    }
}

/// A callsign lookup service.
#[allow(async_fn_in_trait)]
pub trait Lookup {
    fn name(&self) -> &'static str;

    /// Looks up a callsign.
    ///
    /// Returns `Ok(None)` if the service doesn't know the callsign.
    async fn lookup(
        &mut self,
        client: &reqwest::Client,
        callsign: &str,
    ) -> Result<Option<ContactRecord>, Error>;
}

#[derive(Debug)]
pub enum Provider {
    Callook(Callook),
    HamDb(HamDb),
    Qrz(Qrz),
}

impl Provider {
    pub fn callook() -> Self {
        Self::Callook(Callook::default())
    }

    pub fn hamdb() -> Self {
        Self::HamDb(HamDb::default())
    }

    pub fn qrz(credentials: QrzCredentials) -> Self {
        Self::Qrz(Qrz::new(credentials))
    }
}

impl Lookup for Provider {
    fn name(&self) -> &'static str {
        match self {
            Provider::Callook(callook) => callook.name(),
            Provider::HamDb(hamdb) => hamdb.name(),
            Provider::Qrz(qrz) => qrz.name(),
        }
    }

    async fn lookup(
        &mut self,
        client: &reqwest::Client,
        callsign: &str,
    ) -> Result<Option<ContactRecord>, Error> {
        match self {
            Provider::Callook(callook) => callook.lookup(client, callsign).await,
            Provider::HamDb(hamdb) => hamdb.lookup(client, callsign).await,
            Provider::Qrz(qrz) => qrz.lookup(client, callsign).await,
        }
    }
}

/// Looks up callsigns and never fails.
///
/// Any error is logged and turned into `None`, so the caller falls back to what
/// WSJT-X told us.
#[derive(Debug)]
pub struct Resolver {
    client: reqwest::Client,
    provider: Provider,
}

impl Resolver {
    pub fn new(provider: Provider, timeout: Duration) -> Result<Self, Error> {
        Ok(Self::with_client(http_client(timeout)?, provider))
    }

    pub fn with_client(client: reqwest::Client, provider: Provider) -> Self {
        Self { client, provider }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub async fn resolve(&mut self, callsign: &str) -> Option<ContactRecord> {
        let provider = self.provider.name();
        tracing::info!(%callsign, provider, "looking up callsign");

        match self.provider.lookup(&self.client, callsign).await {
            Ok(Some(contact)) => {
                tracing::info!(?contact, provider, "callsign found");
                Some(contact)
            }
            Ok(None) => {
                tracing::info!(%callsign, provider, "callsign not found");
                None
            }
            Err(Error::SessionExpired { message, .. }) => {
                // the next lookup will log in again
                tracing::info!(%callsign, provider, %message, "session expired");
                None
            }
            Err(error) => {
                tracing::warn!(%callsign, provider, ?error, "lookup failed");
                None
            }
        }
    }
}

pub fn http_client(timeout: Duration) -> Result<reqwest::Client, Error> {
    Ok(reqwest::ClientBuilder::new()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Appends path segments to an API base URL. Segments are percent-encoded, so
/// portable callsigns like `W1AW/P` stay in one segment.
fn endpoint(api_url: &Url, segments: &[&str]) -> Result<Url, Error> {
    let mut url = api_url.clone();
    url.path_segments_mut()
        .map_err(|()| {
            Error::InvalidApiUrl {
                url: api_url.clone(),
            }
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn fetch(request: reqwest::RequestBuilder, provider: &'static str) -> Result<String, Error> {
    let body = request.send().await?.error_for_status()?.text().await?;
    tracing::debug!(provider, %body, "lookup response");
    Ok(body)
}

fn coordinate(latitude: Option<&str>, longitude: Option<&str>) -> Option<Coordinate> {
    Coordinate::resolved_from_strs(latitude?, longitude?)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use url::Url;

    use crate::endpoint;

    #[test]
    fn it_appends_path_segments() {
        let api_url: Url = "https://callook.info/".parse().unwrap();
        assert_eq!(
            endpoint(&api_url, &["W1AW", "json"]).unwrap().as_str(),
            "https://callook.info/W1AW/json"
        );

        let api_url: Url = "http://localhost:8080/hamdb".parse().unwrap();
        assert_eq!(
            endpoint(&api_url, &["W1AW/P", "json", "jtmap"])
                .unwrap()
                .as_str(),
            "http://localhost:8080/hamdb/W1AW%2FP/json/jtmap"
        );
    }

    #[test]
    fn it_rejects_cannot_be_a_base_urls() {
        let api_url: Url = "mailto:w1aw@arrl.org".parse().unwrap();
        assert!(endpoint(&api_url, &["W1AW"]).is_err());
    }
}
