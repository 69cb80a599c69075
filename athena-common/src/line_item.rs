//! Normalized pricing line items

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Upstream pricing resource a line item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceAttribute {
    #[serde(rename = "completionDesign")]
    CompletionDesign,
    #[serde(rename = "fracChemicals")]
    FracChemicals,
    #[serde(rename = "cartageCharges")]
    CartageCharges,
    #[serde(rename = "serviceCharges")]
    ServiceCharges,
}

impl SourceAttribute {
    /// Fixed fetch and concatenation order
    pub const ALL: [SourceAttribute; 4] = [
        SourceAttribute::CompletionDesign,
        SourceAttribute::FracChemicals,
        SourceAttribute::CartageCharges,
        SourceAttribute::ServiceCharges,
    ];

    /// Resource name as used in upstream URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceAttribute::CompletionDesign => "completionDesign",
            SourceAttribute::FracChemicals => "fracChemicals",
            SourceAttribute::CartageCharges => "cartageCharges",
            SourceAttribute::ServiceCharges => "serviceCharges",
        }
    }

    pub fn line_type(&self) -> LineType {
        match self {
            SourceAttribute::CompletionDesign => LineType::Proppant,
            SourceAttribute::FracChemicals => LineType::Chemical,
            SourceAttribute::CartageCharges => LineType::Cartage,
            SourceAttribute::ServiceCharges => LineType::Service,
        }
    }
}

impl fmt::Display for SourceAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceAttribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceAttribute::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown source attribute: {}", s)))
    }
}

/// Kind of priced entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Proppant,
    Chemical,
    Cartage,
    Service,
}

impl LineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineType::Proppant => "proppant",
            LineType::Chemical => "chemical",
            LineType::Cartage => "cartage",
            LineType::Service => "service",
        }
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One priced entity attributable to one well and one source resource
///
/// Identifiers come from the call context, never from the payload. Every
/// other field is optional because upstream payloads may omit anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub project_number: String,
    pub well_id: String,
    pub source_attribute: SourceAttribute,
    pub line_type: LineType,
    pub catalog_external: Option<String>,
    pub item_description: Option<String>,
    pub commercial_name: Option<String>,
    /// Chemicals only
    pub concentration: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<f64>,
    pub discount_pct: Option<f64>,
    pub discounted_unit_price: Option<f64>,
    pub quoted_quantity: Option<f64>,
}

impl LineItem {
    /// Item with only identifier and provenance fields populated
    pub fn bare(
        project_number: impl Into<String>,
        well_id: impl Into<String>,
        source_attribute: SourceAttribute,
    ) -> Self {
        Self {
            project_number: project_number.into(),
            well_id: well_id.into(),
            source_attribute,
            line_type: source_attribute.line_type(),
            catalog_external: None,
            item_description: None,
            commercial_name: None,
            concentration: None,
            unit: None,
            unit_price: None,
            discount_pct: None,
            discounted_unit_price: None,
            quoted_quantity: None,
        }
    }

    /// `discounted_unit_price × quoted_quantity`, missing operands count as 0
    pub fn extended_discounted(&self) -> f64 {
        self.discounted_unit_price.unwrap_or(0.0) * self.quoted_quantity.unwrap_or(0.0)
    }

    /// `unit_price × quoted_quantity`, missing operands count as 0
    pub fn extended_list(&self) -> f64 {
        self.unit_price.unwrap_or(0.0) * self.quoted_quantity.unwrap_or(0.0)
    }

    /// True when nothing beyond identifiers and provenance is known
    pub fn is_bare(&self) -> bool {
        self.catalog_external.is_none()
            && self.item_description.is_none()
            && self.commercial_name.is_none()
            && self.concentration.is_none()
            && self.unit.is_none()
            && self.unit_price.is_none()
            && self.discount_pct.is_none()
            && self.discounted_unit_price.is_none()
            && self.quoted_quantity.is_none()
    }
}
