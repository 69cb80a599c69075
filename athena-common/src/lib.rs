//! # Athena Common Library
//!
//! Pricing core shared by the Athena services:
//! - Safe-get payload accessors and numeric coercion
//! - Recursive JSON flattening for diagnostic tables
//! - Source extractors mapping the four pricing resources to line items
//! - Aggregation into priced line items and grouped summaries
//! - Configuration loading
//!
//! Everything here is synchronous and free of I/O apart from reading the
//! configuration file.

pub mod aggregate;
pub mod coerce;
pub mod config;
pub mod error;
pub mod extract;
pub mod flatten;
pub mod line_item;
pub mod payload;
pub mod project;
pub mod tabular;

pub use aggregate::{aggregate, aggregate_by, GroupBy, LineItemTable, SummaryTable};
pub use error::{Error, Result};
pub use flatten::{flatten, FlatTable, Flattener};
pub use line_item::{LineItem, LineType, SourceAttribute};
pub use tabular::{TableView, Tabular};
