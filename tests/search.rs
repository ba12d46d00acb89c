use std::sync::Mutex;

use assert_matches::assert_matches;
use serde_json::{Value, json};

use ilthermo::client::{IltApi, RawPropertyList, RawSearchResponse, RawSetResponse, SearchQuery};
use ilthermo::domain::SetId;
use ilthermo::error::IltError;
use ilthermo::props::PropertyCatalog;
use ilthermo::search::{QueryParams, SearchResult, query};

struct MockApi {
    search_response: Value,
    set_response: Option<Value>,
    search_calls: Mutex<usize>,
    last_query: Mutex<Option<SearchQuery>>,
}

impl MockApi {
    fn new(search_response: Value) -> Self {
        Self {
            search_response,
            set_response: None,
            search_calls: Mutex::new(0),
            last_query: Mutex::new(None),
        }
    }

    fn with_set(mut self, set_response: Value) -> Self {
        self.set_response = Some(set_response);
        self
    }
}

impl IltApi for MockApi {
    fn search(&self, query: &SearchQuery) -> Result<RawSearchResponse, IltError> {
        *self.search_calls.lock().unwrap() += 1;
        *self.last_query.lock().unwrap() = Some(query.clone());
        Ok(serde_json::from_value(self.search_response.clone()).unwrap())
    }

    fn fetch_set(&self, setid: &SetId) -> Result<RawSetResponse, IltError> {
        match &self.set_response {
            Some(value) => Ok(serde_json::from_value(value.clone()).unwrap()),
            None => Err(IltError::SetNotFound(setid.as_str().to_string())),
        }
    }

    fn property_list(&self) -> Result<RawPropertyList, IltError> {
        Ok(serde_json::from_value(json!({
            "plist": [{"name": ["Density ", "Made-up property"], "key": ["ZZZZ", "QQQQ"]}]
        }))
        .unwrap())
    }
}

fn hits_response() -> Value {
    json!({
        "errors": [],
        "header": ["setid", "ref", "prp", "np", "nm1", "nm2", "nm3"],
        "res": [
            ["aaAA1", "Krolikowska et al. (2012)", "Specific density ", 65,
             "1-ethyl-3-methylimidazolium thiocyanate", "", ""],
            ["bbBB2", "Klomfar and Mann (2015)", "Specific density ", 37,
             "1-ethyl-3-methylimidazolium thiocyanate", "", ""],
            ["ccCC3", "Neves (2013a)", "Specific density ", 18,
             "water", "", "ethanol"]
        ]
    })
}

#[test]
fn server_errors_fail_the_whole_query() {
    let api = MockApi::new(json!({
        "errors": ["bad year", "bad author"],
        "header": ["setid"],
        "res": [["aaAA1"]]
    }));
    let err = query(&api, &PropertyCatalog::builtin(), &QueryParams::default()).unwrap_err();
    assert_matches!(err, IltError::Query(message) if message == "bad year *** bad author");
}

#[test]
fn decodes_one_record_per_row_in_order() {
    let api = MockApi::new(hits_response());
    let result = query(&api, &PropertyCatalog::builtin(), &QueryParams::default()).unwrap();
    assert_eq!(result.len(), 3);

    let keys: Vec<String> = result
        .iter()
        .map(|record| record.citation_key().unwrap())
        .collect();
    assert_eq!(keys, ["KrolikowskaEtal2012", "KlomfarMann2015", "Neves2013a"]);

    // Iteration is freely restartable.
    let again: Vec<String> = result
        .iter()
        .map(|record| record.citation_key().unwrap())
        .collect();
    assert_eq!(again, keys);

    assert_eq!(result[0].year().unwrap(), 2012);
    assert_eq!(result[2].year().unwrap(), 2013);
    assert_eq!(result[0].author().unwrap(), "Krolikowska");
    assert_eq!(result[1].points(), Some(37));
    assert_eq!(result[0].setid().unwrap().as_str(), "aaAA1");
}

#[test]
fn unknown_property_fails_before_any_request() {
    let api = MockApi::new(hits_response());
    let params = QueryParams {
        prop: Some("bogus".to_string()),
        ..QueryParams::default()
    };
    let err = query(&api, &PropertyCatalog::builtin(), &params).unwrap_err();
    assert_matches!(err, IltError::UnknownProperty(_));
    assert_eq!(*api.search_calls.lock().unwrap(), 0);
}

#[test]
fn property_abbreviation_resolves_to_search_key() {
    let api = MockApi::new(hits_response());
    let params = QueryParams {
        prop: Some("dens".to_string()),
        ..QueryParams::default()
    };
    query(&api, &PropertyCatalog::builtin(), &params).unwrap();
    let sent = api.last_query.lock().unwrap().clone().unwrap();
    assert_eq!(sent.prop_key.as_deref(), Some("VehR"));
}

#[test]
fn component_names_skip_empty_fields_keep_order() {
    let api = MockApi::new(hits_response());
    let result = query(&api, &PropertyCatalog::builtin(), &QueryParams::default()).unwrap();
    let record = &result[2];
    assert_eq!(record.component_names(), ["water", "ethanol"]);
    assert_eq!(record.component_count(), 2);
}

#[test]
fn retrieve_propagates_set_not_found() {
    let api = MockApi::new(hits_response());
    let result = query(&api, &PropertyCatalog::builtin(), &QueryParams::default()).unwrap();
    let err = result[0].retrieve(&api).unwrap_err();
    assert_matches!(err, IltError::SetNotFound(setid) if setid == "aaAA1");
}

#[test]
fn retrieve_builds_an_aligned_dataset() {
    let api = MockApi::new(hits_response()).with_set(json!({
        "dhead": [["Temperature, K"], ["Specific density, kg/m<SUP>3</SUP>", "Liquid"]],
        "data": [
            [["298.15"], ["1100.1", "0.6"]],
            [["308.15"], ["1092.8", "0.6"]]
        ],
        "ref": {"title": "Densities", "full": "Krolikowska, M. (2012)"},
        "components": [{"name": "1-ethyl-3-methylimidazolium thiocyanate"}],
        "title": "Binary system: Specific density",
        "expmeth": "Vibrating tube method",
        "phases": ["Liquid"]
    }));
    let result = query(&api, &PropertyCatalog::builtin(), &QueryParams::default()).unwrap();
    let dataset = result[0].retrieve(&api).unwrap();
    assert_eq!(dataset.shape(), (2, 3));
    assert_eq!(dataset.columns().len(), dataset.matrix().cols());
    assert_eq!(dataset.setid().as_str(), "aaAA1");
}

#[test]
fn empty_result_decodes_to_empty_sequence() {
    let raw: ilthermo::client::RawSearchResponse = serde_json::from_value(json!({
        "errors": [],
        "header": ["setid", "ref"],
        "res": []
    }))
    .unwrap();
    let result = SearchResult::from_response(raw).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.iter().count(), 0);
}

#[test]
fn catalog_fetch_overrides_builtin_keys() {
    let api = MockApi::new(hits_response());
    let catalog = PropertyCatalog::fetch(&api).unwrap();
    // "Density" refreshed from the server list; unknown names are skipped and
    // everything else keeps its built-in key.
    assert_eq!(catalog.search_key("dens").unwrap(), "ZZZZ");
    assert_eq!(catalog.search_key("visc").unwrap(), "AJfy");
}
