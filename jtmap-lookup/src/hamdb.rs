//! <https://hamdb.org/api>

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

const API_URL: &str = "https://api.hamdb.org/";
const NAME: &str = "hamdb.org";

/// HamDB asks clients to identify themselves in the URL.
const APP_NAME: &str = "jtmap";

const NOT_FOUND: &str = "NOT_FOUND";

#[derive(Clone, Debug)]
pub struct HamDb {
    api_url: Url,
}

impl HamDb {
    pub fn new(api_url: Url) -> Self {
        Self { api_url }
    }
}

impl Default for HamDb {
    fn default() -> Self {
        Self::new(Url::parse(API_URL).expect("invalid hamdb.org api url"))
    }
}

impl Lookup for HamDb {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn lookup(
        &mut self,
        client: &reqwest::Client,
        callsign: &str,
    ) -> Result<Option<ContactRecord>, Error> {
        let url = endpoint(&self.api_url, &[callsign, "json", APP_NAME])?;
        let body = fetch(client.get(url), NAME).await?;
        let response: Response = json_decode(&body)?;
        Ok(response.hamdb.callsign.into_contact(callsign))
    }
}

#[derive(Debug, Deserialize)]
struct Response {
    hamdb: Body,
}

#[derive(Debug, Deserialize)]
struct Body {
    callsign: Callsign,
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
    fn into_contact(self, callsign: &str) -> Option<ContactRecord> {
        let call = non_empty(self.call);
        if call.as_deref().is_none_or(|call| call == NOT_FOUND) {
            return None;
        }

        Some(ContactRecord {
            callsign: call.unwrap_or_else(|| callsign.to_owned()),
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
        })
    }
}
