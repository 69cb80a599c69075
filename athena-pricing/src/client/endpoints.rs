//! Upstream URL construction

use athena_common::SourceAttribute;
use reqwest::Url;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::FetchError;

/// Per-well resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum WellResource {
    /// Descriptive well record, inspected but never priced
    GeneralWellInformation,
    Pricing(SourceAttribute),
}

impl WellResource {
    pub const ALL: [WellResource; 5] = [
        WellResource::GeneralWellInformation,
        WellResource::Pricing(SourceAttribute::CompletionDesign),
        WellResource::Pricing(SourceAttribute::FracChemicals),
        WellResource::Pricing(SourceAttribute::CartageCharges),
        WellResource::Pricing(SourceAttribute::ServiceCharges),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WellResource::GeneralWellInformation => "generalWellInformation",
            WellResource::Pricing(source) => source.as_str(),
        }
    }
}

impl fmt::Display for WellResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<WellResource> for String {
    fn from(resource: WellResource) -> Self {
        resource.as_str().to_string()
    }
}

impl FromStr for WellResource {
    type Err = athena_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "generalWellInformation" {
            return Ok(WellResource::GeneralWellInformation);
        }
        s.parse::<SourceAttribute>().map(WellResource::Pricing)
    }
}

/// URL builder rooted at the resource API base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    base_url: String,
}

impl ApiEndpoints {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/project/?project_number={n}`
    pub fn project_url(&self, project_number: &str) -> Result<Url, FetchError> {
        self.build(&format!("{}/project/", self.base_url), "project_number", project_number)
    }

    /// `{base}/{resource}?well_id={id}`
    pub fn resource_url(&self, resource: WellResource, well_id: &str) -> Result<Url, FetchError> {
        self.build(&format!("{}/{}", self.base_url, resource), "well_id", well_id)
    }

    fn build(&self, path: &str, key: &str, value: &str) -> Result<Url, FetchError> {
        Url::parse_with_params(path, &[(key, value)])
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))
    }
}
