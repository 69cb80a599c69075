//! Concatenation, extended totals and grouped summaries

use crate::line_item::{LineItem, LineType, SourceAttribute};
use crate::tabular::Tabular;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Column the summary is grouped by, next to `well_id`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    LineType,
    SourceAttribute,
}

impl GroupBy {
    pub fn column_name(&self) -> &'static str {
        match self {
            GroupBy::LineType => "line_type",
            GroupBy::SourceAttribute => "source_attribute",
        }
    }
}

impl std::str::FromStr for GroupBy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line_type" => Ok(GroupBy::LineType),
            "source_attribute" => Ok(GroupBy::SourceAttribute),
            other => Err(crate::Error::InvalidInput(format!("Unknown group column: {}", other))),
        }
    }
}

/// Line item with its derived extended totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedLineItem {
    #[serde(flatten)]
    pub item: LineItem,
    pub extended_discounted: f64,
    pub extended_list: f64,
}

impl From<LineItem> for PricedLineItem {
    fn from(item: LineItem) -> Self {
        Self {
            extended_discounted: item.extended_discounted(),
            extended_list: item.extended_list(),
            item,
        }
    }
}

/// All line items of one project query, in concatenation order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LineItemTable {
    items: Vec<PricedLineItem>,
}

impl LineItemTable {
    pub fn items(&self) -> &[PricedLineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

const LINE_ITEM_COLUMNS: [&str; 15] = [
    "project_number",
    "well_id",
    "source_attribute",
    "line_type",
    "catalog_external",
    "item_description",
    "commercial_name",
    "concentration",
    "unit",
    "unit_price",
    "discount_pct",
    "discounted_unit_price",
    "quoted_quantity",
    "extended_discounted",
    "extended_list",
];

impl Tabular for LineItemTable {
    fn columns(&self) -> Vec<String> {
        LINE_ITEM_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn rows(&self) -> Vec<Vec<Value>> {
        self.items
            .iter()
            .map(|p| {
                let i = &p.item;
                vec![
                    json!(i.project_number),
                    json!(i.well_id),
                    json!(i.source_attribute),
                    json!(i.line_type),
                    json!(i.catalog_external),
                    json!(i.item_description),
                    json!(i.commercial_name),
                    json!(i.concentration),
                    json!(i.unit),
                    json!(i.unit_price),
                    json!(i.discount_pct),
                    json!(i.discounted_unit_price),
                    json!(i.quoted_quantity),
                    json!(p.extended_discounted),
                    json!(p.extended_list),
                ]
            })
            .collect()
    }
}

/// Group key of a summary row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum SummaryGroup {
    LineType(LineType),
    SourceAttribute(SourceAttribute),
}

impl SummaryGroup {
    fn of(item: &LineItem, group_by: GroupBy) -> Self {
        match group_by {
            GroupBy::LineType => SummaryGroup::LineType(item.line_type),
            GroupBy::SourceAttribute => SummaryGroup::SourceAttribute(item.source_attribute),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryGroup::LineType(t) => t.as_str(),
            SummaryGroup::SourceAttribute(s) => s.as_str(),
        }
    }
}

/// Totals for one (well_id, group) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub well_id: String,
    pub group: SummaryGroup,
    pub lines: usize,
    pub total_qty: f64,
    pub total_extended_discounted: f64,
    pub total_extended_list: f64,
}

impl SummaryRecord {
    fn empty(well_id: String, group: SummaryGroup) -> Self {
        Self {
            well_id,
            group,
            lines: 0,
            total_qty: 0.0,
            total_extended_discounted: 0.0,
            total_extended_list: 0.0,
        }
    }

    fn add(&mut self, priced: &PricedLineItem) {
        self.lines += 1;
        self.total_qty += priced.item.quoted_quantity.unwrap_or(0.0);
        self.total_extended_discounted += priced.extended_discounted;
        self.total_extended_list += priced.extended_list;
    }
}

/// Column totals across every summary row
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GrandTotal {
    pub lines: usize,
    pub total_qty: f64,
    pub total_extended_discounted: f64,
    pub total_extended_list: f64,
}

/// Summary rows ordered by well_id, then group
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTable {
    pub group_by: GroupBy,
    pub records: Vec<SummaryRecord>,
}

impl SummaryTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Row for one (well, group) pair, e.g. `get("W1", "cartage")`
    pub fn get(&self, well_id: &str, group: &str) -> Option<&SummaryRecord> {
        self.records
            .iter()
            .find(|r| r.well_id == well_id && r.group.as_str() == group)
    }

    pub fn grand_total(&self) -> GrandTotal {
        self.records.iter().fold(GrandTotal::default(), |mut acc, r| {
            acc.lines += r.lines;
            acc.total_qty += r.total_qty;
            acc.total_extended_discounted += r.total_extended_discounted;
            acc.total_extended_list += r.total_extended_list;
            acc
        })
    }
}

impl Tabular for SummaryTable {
    fn columns(&self) -> Vec<String> {
        vec![
            "well_id".to_string(),
            self.group_by.column_name().to_string(),
            "lines".to_string(),
            "total_qty".to_string(),
            "total_extended_discounted".to_string(),
            "total_extended_list".to_string(),
        ]
    }

    fn rows(&self) -> Vec<Vec<Value>> {
        self.records
            .iter()
            .map(|r| {
                vec![
                    json!(r.well_id),
                    json!(r.group.as_str()),
                    json!(r.lines),
                    json!(r.total_qty),
                    json!(r.total_extended_discounted),
                    json!(r.total_extended_list),
                ]
            })
            .collect()
    }
}

/// Aggregate grouped by `(well_id, line_type)`
pub fn aggregate(items: Vec<Vec<LineItem>>) -> (LineItemTable, SummaryTable) {
    aggregate_by(items, GroupBy::LineType)
}

/// Concatenate extractor outputs in order, price them and summarize
///
/// Empty input gives two empty tables; that is "no data", not an error.
pub fn aggregate_by(items: Vec<Vec<LineItem>>, group_by: GroupBy) -> (LineItemTable, SummaryTable) {
    let priced: Vec<PricedLineItem> = items
        .into_iter()
        .flatten()
        .map(PricedLineItem::from)
        .collect();

    let mut groups: BTreeMap<(String, SummaryGroup), SummaryRecord> = BTreeMap::new();
    for p in &priced {
        let group = SummaryGroup::of(&p.item, group_by);
        groups
            .entry((p.item.well_id.clone(), group))
            .or_insert_with(|| SummaryRecord::empty(p.item.well_id.clone(), group))
            .add(p);
    }

    (
        LineItemTable { items: priced },
        SummaryTable {
            group_by,
            records: groups.into_values().collect(),
        },
    )
}
