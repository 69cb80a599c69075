//! Stub upstream for pricing tests
//!
//! Canned payloads keyed by `resource:id`, e.g. `project:P-100` or
//! `cartageCharges:W1`. Unknown keys answer 404.

#![allow(dead_code)]

use async_trait::async_trait;
use athena_pricing::client::{ApiEndpoints, FetchError, ResourceFetcher, TokenError, TokenProvider};
use athena_pricing::query::{PricingService, QueryOptions};
use athena_pricing::session::{ApiCredentials, SessionState};
use reqwest::Url;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "https://api.test/ords/app/v1";
pub const PROJECT: &str = "P-100";
pub const TOKEN: &str = "test-token";

#[derive(Debug, Clone)]
pub enum StubResponse {
    Json(Value),
    Status(u16),
    Delayed(Duration, Value),
    /// Never answers
    Hang,
}

#[derive(Default)]
pub struct StubFetcher {
    responses: HashMap<String, StubResponse>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, response: StubResponse) -> Self {
        self.responses.insert(key.to_string(), response);
        self
    }

    pub fn json(self, key: &str, body: Value) -> Self {
        self.with(key, StubResponse::Json(body))
    }

    /// Keys requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// `https://host/v1/cartageCharges?well_id=W1` → `cartageCharges:W1`
pub fn request_key(url: &Url) -> String {
    let resource = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default()
        .to_string();
    let id = url
        .query_pairs()
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default();
    format!("{}:{}", resource, id)
}

#[async_trait]
impl ResourceFetcher for StubFetcher {
    async fn fetch_json(&self, url: &Url, token: &str) -> Result<Value, FetchError> {
        assert_eq!(token, TOKEN, "fetch must carry the acquired token");
        let key = request_key(url);
        self.requests.lock().unwrap().push(key.clone());

        match self.responses.get(&key).cloned() {
            Some(StubResponse::Json(body)) => Ok(body),
            Some(StubResponse::Delayed(delay, body)) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            Some(StubResponse::Status(status)) => {
                Err(FetchError::Api(status, format!("stub status {}", status)))
            }
            Some(StubResponse::Hang) => std::future::pending().await,
            None => Err(FetchError::Api(404, format!("no stub for {}", key))),
        }
    }
}

#[derive(Default)]
pub struct StubTokens {
    pub fail: bool,
    calls: AtomicUsize,
}

impl StubTokens {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for StubTokens {
    async fn token(&self, credentials: &ApiCredentials) -> Result<String, TokenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TokenError::Api(401, "invalid_client".to_string()));
        }
        assert_eq!(credentials.client_id(), "client");
        Ok(TOKEN.to_string())
    }
}

pub fn service(fetcher: Arc<StubFetcher>, tokens: Arc<StubTokens>, max_concurrent: usize) -> PricingService {
    PricingService::new(
        ApiEndpoints::new(BASE_URL).unwrap(),
        tokens,
        fetcher,
        QueryOptions {
            max_concurrent_fetches: max_concurrent,
            ..QueryOptions::default()
        },
    )
}

pub fn ready_session() -> SessionState {
    SessionState::new(false).submit_credentials("client", "secret").unwrap()
}

pub fn project_payload(wells: &[&str]) -> Value {
    json!({
        "projectNumber": PROJECT,
        "customer": {"name": "Basin Energy"},
        "wellIDs": wells.iter().map(|w| json!({"id": w})).collect::<Vec<_>>(),
    })
}

/// One proppant line: 0.09 × 100000 = 9000 discounted, 10000 list
pub fn completion_design_payload() -> Value {
    json!([{
        "stage": 1,
        "proppantsTypeMesh": [{
            "proppantSizeCatalogExternal": "PR-100",
            "proppantSizeDescription": "100 mesh",
            "proppantCommercialName": "Northern White",
            "unit": "lb",
            "unitPrice": 0.1,
            "discountPercentage": 10,
            "discountedUnitPrice": 0.09,
            "quotedQuantity": 100000
        }]
    }])
}

/// One chemical line with string numbers: 20 × 50 = 1000 discounted, 1250 list
pub fn frac_chemicals_payload() -> Value {
    json!([{
        "chemTypes": [{
            "chemicalTypeCatalogExternal": "CH-1",
            "chemicalTypeDescription": "Friction reducer",
            "commercialName": "FR-200",
            "concentration": "0.5 gpt",
            "unit": "gal",
            "unitPrice": "25.00",
            "discount": "20",
            "discountedUnitPrice": "20.00",
            "quotedQuantity": "50"
        }]
    }])
}

/// Two cartage lines: 4 × 120 + 5 × 30 = 630
pub fn cartage_payload() -> Value {
    json!([
        {
            "cartageCatalogExternal": "CT-1",
            "cartageDescription": "Sand haul",
            "measurementUnits": {"label": "mi"},
            "unitPrice": 4,
            "discountPercentage": 0,
            "discountedUnitPrice": 4,
            "quotedQuantity": 120
        },
        {
            "cartageCatalogExternal": "CT-2",
            "cartageDescription": "Water haul",
            "measurementUnits": {"label": "mi"},
            "unitPrice": 5,
            "discountPercentage": 0,
            "discountedUnitPrice": 5,
            "quotedQuantity": 30
        }
    ])
}

/// Project `P-100` with wells `W2` then `W1`
///
/// - W2: one proppant line, one chemical line, empty cartage, service fails (500)
/// - W1: two cartage lines; completion design body empty, frac chemicals
///   object without `chemTypes`, service charges empty list
pub fn standard_fetcher() -> StubFetcher {
    StubFetcher::new()
        .json("project:P-100", project_payload(&["W2", "W1"]))
        .json("completionDesign:W2", completion_design_payload())
        .json("fracChemicals:W2", frac_chemicals_payload())
        .json("cartageCharges:W2", json!([]))
        .with("serviceCharges:W2", StubResponse::Status(500))
        .json("completionDesign:W1", Value::Null)
        .json("fracChemicals:W1", json!({"note": "none"}))
        .json("cartageCharges:W1", cartage_payload())
        .json("serviceCharges:W1", json!([]))
        .json("generalWellInformation:W1", json!({"wellName": "Alpha 1H", "county": "Reeves"}))
}
