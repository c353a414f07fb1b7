//! QRZ.com XML data service
//!
//! Lookups need a session key, which we get by logging in with the
//! subscriber's username and password. The key is kept until QRZ.com reports
//! it as expired; the lookup that saw the expiry fails and the next one logs in
//! again.
//!
//! <https://www.qrz.com/XML/current_spec.html>

use std::fmt::Debug;

use serde::Deserialize;
use url::Url;

use crate::{
    ContactRecord,
    Error,
    Lookup,
    coordinate,
    fetch,
    non_empty,
};

const API_URL: &str = "https://xmldata.qrz.com/xml/current/";
const NAME: &str = "qrz.com";
const AGENT: &str = concat!("jtmap-", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct QrzCredentials {
    pub username: String,
    pub password: String,
}

impl Debug for QrzCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrzCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionKey(***)")
    }
}

#[derive(Debug)]
pub struct Qrz {
    api_url: Url,
    credentials: QrzCredentials,
    session: Option<SessionKey>,
}

impl Qrz {
    pub fn new(credentials: QrzCredentials) -> Self {
        Self::with_api_url(
            Url::parse(API_URL).expect("invalid qrz.com api url"),
            credentials,
        )
    }

    pub fn with_api_url(api_url: Url, credentials: QrzCredentials) -> Self {
        Self {
            api_url,
            credentials,
            session: None,
        }
    }

    /// The cached session key, if we're logged in.
    pub fn session_key(&self) -> Option<&SessionKey> {
        self.session.as_ref()
    }

    async fn login(&self, client: &reqwest::Client) -> Result<SessionKey, Error> {
        tracing::debug!(username = %self.credentials.username, "requesting qrz.com session key");

        let request = client.get(self.api_url.clone()).query(&[
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
            ("agent", AGENT),
        ]);
        // the query holds the password
        let body = fetch(request, NAME).await.map_err(Error::without_url)?;
        let database = Database::decode(&body)?;

        non_empty(database.session.key)
            .map(SessionKey)
            .ok_or_else(|| {
                Error::NoSessionKey {
                    provider: NAME,
                    message: database.session.error.unwrap_or_default(),
                }
            })
    }

    async fn session_key_or_login(&mut self, client: &reqwest::Client) -> Result<SessionKey, Error> {
        if let Some(session_key) = &self.session {
            return Ok(session_key.clone());
        }

        let session_key = self.login(client).await?;
        self.session = Some(session_key.clone());
        Ok(session_key)
    }
}

impl Lookup for Qrz {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn lookup(
        &mut self,
        client: &reqwest::Client,
        callsign: &str,
    ) -> Result<Option<ContactRecord>, Error> {
        let session_key = self.session_key_or_login(client).await?;

        let request = client
            .get(self.api_url.clone())
            .query(&[("s", session_key.as_str()), ("callsign", callsign)]);
        // the query holds the session key
        let body = fetch(request, NAME).await.map_err(Error::without_url)?;
        let database = Database::decode(&body)?;

        // every response carries the currently valid key
        if let Some(key) = non_empty(database.session.key) {
            self.session = Some(SessionKey(key));
        }

        if let Some(found) = database.callsign {
            return Ok(Some(found.into_contact(callsign)));
        }

        match database.session.error {
            None => Ok(None),
            Some(message) => {
                match SessionError::classify(&message) {
                    SessionError::NotFound => Ok(None),
                    SessionError::Expired => {
                        self.session = None;
                        Err(Error::SessionExpired {
                            provider: NAME,
                            message,
                        })
                    }
                    SessionError::Other => {
                        Err(Error::Provider {
                            provider: NAME,
                            message,
                        })
                    }
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionError {
    NotFound,
    Expired,
    Other,
}

impl SessionError {
    fn classify(message: &str) -> Self {
        let message = message.to_ascii_lowercase();
        if message.starts_with("not found") {
            Self::NotFound
        }
        else if message.contains("session timeout") || message.contains("invalid session key") {
            Self::Expired
        }
        else {
            Self::Other
        }
    }
}

#[derive(Debug, Deserialize)]
struct Database {
    #[serde(rename = "Callsign")]
    callsign: Option<Callsign>,
    #[serde(rename = "Session", default)]
    session: Session,
}

impl Database {
    fn decode(xml: &str) -> Result<Self, Error> {
        Ok(quick_xml::de::from_str(xml)?)
    }
}

#[derive(Debug, Default, Deserialize)]
struct Session {
    #[serde(rename = "Key")]
    key: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Callsign {
    call: Option<String>,
    fname: Option<String>,
    name: Option<String>,
    addr2: Option<String>,
    state: Option<String>,
    country: Option<String>,
    grid: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
}

impl Callsign {
    fn into_contact(self, callsign: &str) -> ContactRecord {
        ContactRecord {
            callsign: non_empty(self.call).unwrap_or_else(|| callsign.to_owned()),
            name: ContactRecord::join_parts(
                [self.fname.as_deref(), self.name.as_deref()]
                    .into_iter()
                    .flatten(),
                " ",
            ),
            qth: ContactRecord::join_parts(
                [
                    self.addr2.as_deref(),
                    self.state.as_deref(),
                    self.country.as_deref(),
                ]
                .into_iter()
                .flatten(),
                ", ",
            ),
            gridsquare: non_empty(self.grid).unwrap_or_default(),
            coordinate: coordinate(self.lat.as_deref(), self.lon.as_deref()),
        }
    }
}
