//! Source extractors: raw resource JSON to [`LineItem`]s
//!
//! All four resources share one mapping routine driven by a declarative
//! [`SourceFieldMap`]. The field maps carry the upstream key names exactly as
//! the resources publish them, including their inconsistencies:
//! `fracChemicals` names its discount percentage `discount` while the other
//! three resources use `discountPercentage`.
//!
//! Extraction never fails. A payload of the wrong shape yields no items, a
//! missing field yields `None`, and an unparseable number yields `None` for
//! that field only.

use crate::coerce::coerce_f64;
use crate::line_item::{LineItem, SourceAttribute};
use crate::payload::PayloadExt;
use serde_json::Value;
use tracing::debug;

/// Where a text field lives inside an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    /// Not published by this resource
    Absent,
    /// Top-level key of the element
    Key(&'static str),
    /// Key of a nested object, e.g. `measurementUnits.label`
    Nested(&'static str, &'static str),
}

impl FieldKey {
    fn text(&self, element: &Value) -> Option<String> {
        match *self {
            FieldKey::Absent => None,
            FieldKey::Key(key) => element.text(key),
            FieldKey::Nested(outer, inner) => element
                .path(&[outer, inner])
                .and_then(crate::payload::scalar_text),
        }
    }
}

/// Upstream key names for one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFieldMap {
    pub source: SourceAttribute,
    /// Nested list holding the priced elements inside each group; `None` when
    /// the top-level elements are the priced elements
    pub group_list: Option<&'static str>,
    pub catalog_external: FieldKey,
    pub item_description: FieldKey,
    pub commercial_name: FieldKey,
    pub concentration: FieldKey,
    pub unit: FieldKey,
    pub unit_price: &'static str,
    pub discount_pct: &'static str,
    pub discounted_unit_price: &'static str,
    pub quoted_quantity: &'static str,
}

const MEASUREMENT_UNIT: FieldKey = FieldKey::Nested("measurementUnits", "label");

pub const COMPLETION_DESIGN: SourceFieldMap = SourceFieldMap {
    source: SourceAttribute::CompletionDesign,
    group_list: Some("proppantsTypeMesh"),
    catalog_external: FieldKey::Key("proppantSizeCatalogExternal"),
    item_description: FieldKey::Key("proppantSizeDescription"),
    commercial_name: FieldKey::Key("proppantCommercialName"),
    concentration: FieldKey::Absent,
    unit: FieldKey::Key("unit"),
    unit_price: "unitPrice",
    discount_pct: "discountPercentage",
    discounted_unit_price: "discountedUnitPrice",
    quoted_quantity: "quotedQuantity",
};

pub const FRAC_CHEMICALS: SourceFieldMap = SourceFieldMap {
    source: SourceAttribute::FracChemicals,
    group_list: Some("chemTypes"),
    catalog_external: FieldKey::Key("chemicalTypeCatalogExternal"),
    item_description: FieldKey::Key("chemicalTypeDescription"),
    commercial_name: FieldKey::Key("commercialName"),
    concentration: FieldKey::Key("concentration"),
    unit: FieldKey::Key("unit"),
    unit_price: "unitPrice",
    // Upstream publishes `discount` here, not `discountPercentage`
    discount_pct: "discount",
    discounted_unit_price: "discountedUnitPrice",
    quoted_quantity: "quotedQuantity",
};

pub const CARTAGE_CHARGES: SourceFieldMap = SourceFieldMap {
    source: SourceAttribute::CartageCharges,
    group_list: None,
    catalog_external: FieldKey::Key("cartageCatalogExternal"),
    item_description: FieldKey::Key("cartageDescription"),
    commercial_name: FieldKey::Absent,
    concentration: FieldKey::Absent,
    unit: MEASUREMENT_UNIT,
    unit_price: "unitPrice",
    discount_pct: "discountPercentage",
    discounted_unit_price: "discountedUnitPrice",
    quoted_quantity: "quotedQuantity",
};

pub const SERVICE_CHARGES: SourceFieldMap = SourceFieldMap {
    source: SourceAttribute::ServiceCharges,
    group_list: None,
    catalog_external: FieldKey::Key("serviceCatalogExternal"),
    item_description: FieldKey::Key("serviceDescription"),
    commercial_name: FieldKey::Absent,
    concentration: FieldKey::Absent,
    unit: MEASUREMENT_UNIT,
    unit_price: "unitPrice",
    discount_pct: "discountPercentage",
    discounted_unit_price: "discountedUnitPrice",
    quoted_quantity: "quotedQuantity",
};

impl SourceFieldMap {
    pub fn for_source(source: SourceAttribute) -> &'static SourceFieldMap {
        match source {
            SourceAttribute::CompletionDesign => &COMPLETION_DESIGN,
            SourceAttribute::FracChemicals => &FRAC_CHEMICALS,
            SourceAttribute::CartageCharges => &CARTAGE_CHARGES,
            SourceAttribute::ServiceCharges => &SERVICE_CHARGES,
        }
    }

    /// Map one resource payload to line items
    pub fn extract(&self, raw: &Value, project_number: &str, well_id: &str) -> Vec<LineItem> {
        self.elements(raw)
            .into_iter()
            .map(|element| self.line_item(element, project_number, well_id))
            .collect()
    }

    /// Priced elements of the payload, in order
    fn elements<'a>(&self, raw: &'a Value) -> Vec<&'a Value> {
        let top: Vec<&Value> = match (raw, self.group_list) {
            (Value::Array(items), _) => items.iter().collect(),
            // A bare group object is accepted when it carries the locator key
            (Value::Object(_), Some(locator)) if raw.list(locator).is_some() => vec![raw],
            _ => {
                debug!(
                    source = %self.source,
                    shape = shape_name(raw),
                    "Payload is not a list, no line items extracted"
                );
                return Vec::new();
            }
        };

        match self.group_list {
            None => top,
            Some(locator) => top
                .into_iter()
                .filter_map(|group| group.list(locator))
                .flatten()
                .collect(),
        }
    }

    fn line_item(&self, element: &Value, project_number: &str, well_id: &str) -> LineItem {
        LineItem {
            catalog_external: self.catalog_external.text(element),
            item_description: self.item_description.text(element),
            commercial_name: self.commercial_name.text(element),
            concentration: self.concentration.text(element),
            unit: self.unit.text(element),
            unit_price: coerce_f64(element.field(self.unit_price)),
            discount_pct: coerce_f64(element.field(self.discount_pct)),
            discounted_unit_price: coerce_f64(element.field(self.discounted_unit_price)),
            quoted_quantity: coerce_f64(element.field(self.quoted_quantity)),
            ..LineItem::bare(project_number, well_id, self.source)
        }
    }
}

/// Extract line items for any source
pub fn extract(
    source: SourceAttribute,
    raw: &Value,
    project_number: &str,
    well_id: &str,
) -> Vec<LineItem> {
    SourceFieldMap::for_source(source).extract(raw, project_number, well_id)
}

pub fn extract_completion_design(raw: &Value, project_number: &str, well_id: &str) -> Vec<LineItem> {
    COMPLETION_DESIGN.extract(raw, project_number, well_id)
}

pub fn extract_frac_chemicals(raw: &Value, project_number: &str, well_id: &str) -> Vec<LineItem> {
    FRAC_CHEMICALS.extract(raw, project_number, well_id)
}

pub fn extract_cartage_charges(raw: &Value, project_number: &str, well_id: &str) -> Vec<LineItem> {
    CARTAGE_CHARGES.extract(raw, project_number, well_id)
}

pub fn extract_service_charges(raw: &Value, project_number: &str, well_id: &str) -> Vec<LineItem> {
    SERVICE_CHARGES.extract(raw, project_number, well_id)
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
