//! <https://callook.info/api_reference.php>

use serde::Deserialize;
use url::Url;

use crate::{
    ContactRecord,
    Error,
    Lookup,
    coordinate,
    endpoint,
    fetch,
    json::json_decode,
    non_empty,
};

const API_URL: &str = "https://callook.info/";
const NAME: &str = "callook.info";

#[derive(Clone, Debug)]
pub struct Callook {
    api_url: Url,
}

impl Callook {
    pub fn new(api_url: Url) -> Self {
        Self { api_url }
    }
}

impl Default for Callook {
    fn default() -> Self {
        Self::new(Url::parse(API_URL).expect("invalid callook.info api url"))
    }
}

impl Lookup for Callook {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn lookup(
        &mut self,
        client: &reqwest::Client,
        callsign: &str,
    ) -> Result<Option<ContactRecord>, Error> {
        let url = endpoint(&self.api_url, &[callsign, "json"])?;
        let body = fetch(client.get(url), NAME).await?;
        let response: Response = json_decode(&body)?;
        Ok(response.into_contact(callsign))
    }
}

#[derive(Debug, Deserialize)]
struct Response {
    status: Status,
    current: Option<Current>,
    name: Option<String>,
    address: Option<Address>,
    location: Option<Location>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum Status {
    Valid,
    Invalid,
    Updating,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct Current {
    callsign: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    line2: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Location {
    latitude: Option<String>,
    longitude: Option<String>,
    gridsquare: Option<String>,
}

impl Response {
    fn into_contact(self, callsign: &str) -> Option<ContactRecord> {
        if self.status != Status::Valid {
            tracing::debug!(status = ?self.status, "callook.info has no valid license");
            return None;
        }

        let address = self.address.unwrap_or_default();
        let location = self.location.unwrap_or_default();

        Some(ContactRecord {
            callsign: non_empty(self.current.and_then(|current| current.callsign))
                .unwrap_or_else(|| callsign.to_owned()),
            name: non_empty(self.name).unwrap_or_default(),
            qth: non_empty(address.line2).unwrap_or_default(),
            gridsquare: non_empty(location.gridsquare).unwrap_or_default(),
            coordinate: coordinate(
                location.latitude.as_deref(),
                location.longitude.as_deref(),
            ),
        })
    }
}
