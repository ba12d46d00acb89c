use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::SetId;
use crate::error::IltError;

const ILTHERMO_BASE: &str = "https://ilthermo.boulder.nist.gov";

/// Web form fields of an ILThermo search. `prop_key` carries the resolved
/// search hash, not the abbreviation; see `search::query`.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub comp: String,
    pub num_of_comp: u32,
    pub year: String,
    pub author: String,
    pub keywords: String,
    pub prop_key: Option<String>,
}

/// Decoded `/ILT2/ilsearch` response: a header row plus positionally aligned
/// result rows, and a list of server-side error messages.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchResponse {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub header: Vec<String>,
    #[serde(default)]
    pub res: Vec<Vec<Value>>,
}

/// One numeric cell of a data set. The server mixes JSON numbers and numeric
/// strings, so both decode.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCell {
    Num(f64),
    Text(String),
}

impl RawCell {
    pub fn value(&self) -> Result<f64, IltError> {
        match self {
            RawCell::Num(value) => Ok(*value),
            RawCell::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| IltError::Decode(format!("non-numeric data cell {text:?}"))),
        }
    }
}

/// Decoded `/ILT2/ilset` response for one data set.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSetResponse {
    #[serde(default)]
    pub dhead: Vec<Vec<Option<String>>>,
    #[serde(default)]
    pub data: Vec<Vec<Vec<RawCell>>>,
    #[serde(rename = "ref")]
    pub reference: Option<RawSetReference>,
    #[serde(default)]
    pub components: Vec<RawComponent>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub expmeth: Option<String>,
    #[serde(default)]
    pub phases: Vec<String>,
    #[serde(default)]
    pub solvent: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSetReference {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub full: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawComponent {
    #[serde(default)]
    pub name: String,
}

/// Decoded `/ILT2/ilprpls` response: property classes, each with parallel
/// name and search-key lists.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPropertyList {
    #[serde(default)]
    pub plist: Vec<RawPropertyClass>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPropertyClass {
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub key: Vec<String>,
}

/// Access to the three ILThermo endpoints the library uses. One request per
/// call; resilience (retries, backoff) is the caller's concern.
pub trait IltApi: Send + Sync {
    fn search(&self, query: &SearchQuery) -> Result<RawSearchResponse, IltError>;
    fn fetch_set(&self, setid: &SetId) -> Result<RawSetResponse, IltError>;
    fn property_list(&self) -> Result<RawPropertyList, IltError>;
}

#[derive(Clone)]
pub struct IltHttpClient {
    client: Client,
    base_url: String,
}

impl IltHttpClient {
    pub fn new() -> Result<Self, IltError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ilthermo/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| IltError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| IltError::Http(err.to_string()))?;
        Ok(Self {
            client,
            base_url: ILTHERMO_BASE.to_string(),
        })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, IltError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "ILThermo request failed".to_string());
        Err(IltError::Status { status, message })
    }
}

impl IltApi for IltHttpClient {
    fn search(&self, query: &SearchQuery) -> Result<RawSearchResponse, IltError> {
        let url = format!("{}/ILT2/ilsearch", self.base_url);
        let ncmp = query.num_of_comp.to_string();
        let prp = query.prop_key.as_deref().unwrap_or("");
        tracing::debug!(comp = %query.comp, prp, "ilsearch request");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("cmp", query.comp.as_str()),
                ("ncmp", ncmp.as_str()),
                ("year", query.year.as_str()),
                ("auth", query.author.as_str()),
                ("keyw", query.keywords.as_str()),
                ("prp", prp),
            ])
            .send()
            .map_err(|err| IltError::Http(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response.json().map_err(|err| IltError::Decode(err.to_string()))
    }

    fn fetch_set(&self, setid: &SetId) -> Result<RawSetResponse, IltError> {
        let url = format!("{}/ILT2/ilset", self.base_url);
        tracing::debug!(setid = %setid, "ilset request");
        let response = self
            .client
            .get(&url)
            .query(&[("set", setid.as_str())])
            .send()
            .map_err(|err| IltError::Http(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let body = response
            .text()
            .map_err(|err| IltError::Http(err.to_string()))?;
        // The server answers 200 with an empty body for unknown setids.
        if body.trim().is_empty() {
            return Err(IltError::SetNotFound(setid.as_str().to_string()));
        }
        serde_json::from_str(&body).map_err(|err| IltError::Decode(err.to_string()))
    }

    fn property_list(&self) -> Result<RawPropertyList, IltError> {
        let url = format!("{}/ILT2/ilprpls", self.base_url);
        tracing::debug!("ilprpls request");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| IltError::Http(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response.json().map_err(|err| IltError::Decode(err.to_string()))
    }
}
