use std::collections::HashMap;
use std::ops::Index;
use std::slice;

use serde_json::Value;

use crate::client::{IltApi, RawSearchResponse, SearchQuery};
use crate::dataset::Dataset;
use crate::domain::{Citation, SetId};
use crate::error::IltError;
use crate::props::PropertyCatalog;

/// User-facing search parameters. `prop` is a property abbreviation from the
/// catalog (e.g. `dens`), not a search hash.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    /// Chemical formula (case-sensitive), CAS registry number, or name
    /// (part or full).
    pub comp: String,
    /// Number of mixture components; 0 means any number.
    pub num_of_comp: u32,
    /// Publication year.
    pub year: String,
    /// Author's last name.
    pub author: String,
    /// Keyword(s).
    pub keywords: String,
    /// Physical property abbreviation; None means unspecified.
    pub prop: Option<String>,
}

/// Runs a search against ILThermo and decodes the hits.
///
/// An unknown property abbreviation fails with `UnknownProperty` before any
/// network traffic. A response carrying server-side errors fails with
/// `Query`; no partial result is returned.
pub fn query(
    api: &dyn IltApi,
    catalog: &PropertyCatalog,
    params: &QueryParams,
) -> Result<SearchResult, IltError> {
    let prop_key = params
        .prop
        .as_deref()
        .map(|abbr| catalog.search_key(abbr).map(str::to_string))
        .transpose()?;

    let raw = api.search(&SearchQuery {
        comp: params.comp.clone(),
        num_of_comp: params.num_of_comp,
        year: params.year.clone(),
        author: params.author.clone(),
        keywords: params.keywords.clone(),
        prop_key,
    })?;

    SearchResult::from_response(raw)
}

/// Decoded search hits, one `RefRecord` per matched reference, in server
/// order. Indexable and freely re-iterable.
#[derive(Debug, Clone)]
pub struct SearchResult {
    records: Vec<RefRecord>,
}

impl SearchResult {
    pub fn from_response(raw: RawSearchResponse) -> Result<Self, IltError> {
        if !raw.errors.is_empty() {
            return Err(IltError::Query(raw.errors.join(" *** ")));
        }
        let records = raw
            .res
            .into_iter()
            .map(|row| {
                let fields = raw
                    .header
                    .iter()
                    .cloned()
                    .zip(row)
                    .collect::<HashMap<String, Value>>();
                RefRecord { fields }
            })
            .collect();
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RefRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, RefRecord> {
        self.records.iter()
    }
}

impl Index<usize> for SearchResult {
    type Output = RefRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a SearchResult {
    type Item = &'a RefRecord;
    type IntoIter = slice::Iter<'a, RefRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// One search hit: the server's header fields zipped with one result row.
/// Identity fields (citation key, year, author) are derived on read from the
/// raw citation string and never stored.
#[derive(Debug, Clone)]
pub struct RefRecord {
    fields: HashMap<String, Value>,
}

impl RefRecord {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn text_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn setid(&self) -> Result<SetId, IltError> {
        self.text_field("setid")
            .ok_or_else(|| IltError::Decode("reference record has no setid field".to_string()))?
            .parse()
    }

    /// Citation as shown in the result table on the website.
    pub fn citation(&self) -> Result<Citation, IltError> {
        let text = self
            .text_field("ref")
            .ok_or_else(|| IltError::Decode("reference record has no ref field".to_string()))?;
        Ok(Citation::new(text))
    }

    /// Short per-publication key, like `MusterEtal2018`.
    pub fn citation_key(&self) -> Result<String, IltError> {
        self.citation()?.key()
    }

    /// Year of publication.
    pub fn year(&self) -> Result<i32, IltError> {
        self.citation()?.year()
    }

    /// First author's last name.
    pub fn author(&self) -> Result<String, IltError> {
        Ok(self.citation()?.first_author()?.to_string())
    }

    /// Physical property measured in this data set.
    pub fn prop(&self) -> Option<String> {
        self.text_field("prp").map(|value| value.trim().to_string())
    }

    /// Number of data points.
    pub fn points(&self) -> Option<u64> {
        match self.fields.get("np")? {
            Value::Number(num) => num.as_u64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Component names from the fixed fields nm1..nm3, non-empty ones only,
    /// in field order.
    pub fn component_names(&self) -> Vec<String> {
        ["nm1", "nm2", "nm3"]
            .iter()
            .filter_map(|name| self.text_field(name))
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn component_count(&self) -> usize {
        self.component_names().len()
    }

    /// Fetches and builds the full data set for this reference. Failures from
    /// the API (including `SetNotFound`) surface unchanged; no retries.
    pub fn retrieve(&self, api: &dyn IltApi) -> Result<Dataset, IltError> {
        let setid = self.setid()?;
        let raw = api.fetch_set(&setid)?;
        Dataset::from_raw(setid, raw)
    }
}
