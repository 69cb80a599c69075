//! Project pricing queries
//!
//! One query: acquire a token, look up the project, enumerate its wells, then
//! fetch and extract every (well, source) pair and aggregate the result.
//!
//! Pairs are fetched concurrently up to `max_concurrent_fetches`, but results
//! are consumed in submission order, so line items always come out in well
//! enumeration order, then [`SourceAttribute::ALL`] order, then element order.
//!
//! A failed pair becomes a [`SourceNote`] and the query carries on. Token,
//! project lookup and cancellation failures end the whole query.

use athena_common::aggregate::{aggregate_by, GroupBy, LineItemTable, SummaryTable};
use athena_common::extract::extract;
use athena_common::project::well_ids;
use athena_common::{FlatTable, Flattener, LineItem, SourceAttribute};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::pin::pin;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::{
    ApiEndpoints, FetchError, ResourceFetcher, TokenError, TokenProvider, WellResource,
};
use crate::session::{ApiCredentials, SessionState};

/// Errors that end one project query
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("API credentials have not been provided")]
    CredentialsPending,

    #[error("Token request failed: {0}")]
    Token(#[from] TokenError),

    #[error("Project lookup failed: {0}")]
    ProjectLookup(FetchError),

    #[error("Query cancelled")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Query tuning
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub max_concurrent_fetches: usize,
    pub group_by: GroupBy,
    pub flattener: Flattener,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 4,
            group_by: GroupBy::default(),
            flattener: Flattener::default(),
        }
    }
}

/// Why a (well, source) pair contributed no line items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoteKind {
    /// Fetched fine, nothing to extract
    NoData,
    FetchFailed { message: String },
}

/// Informational note for one (well, source) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceNote {
    pub well_id: String,
    pub source_attribute: SourceAttribute,
    #[serde(flatten)]
    pub kind: NoteKind,
}

/// Outcome of one project query
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub query_id: Uuid,
    pub project_number: String,
    pub generated_at: DateTime<Utc>,
    /// Project lookup payload, flattened for display
    pub project: FlatTable,
    pub wells: Vec<String>,
    pub line_items: LineItemTable,
    pub summary: SummaryTable,
    pub notes: Vec<SourceNote>,
}

impl ProjectReport {
    pub fn has_wells(&self) -> bool {
        !self.wells.is_empty()
    }
}

/// One resource of one well, flattened for inspection
#[derive(Debug, Clone, Serialize)]
pub struct ResourceInspection {
    pub well_id: String,
    pub resource: WellResource,
    pub url: String,
    pub table: Option<FlatTable>,
    pub error: Option<String>,
}

struct PairOutcome {
    items: Vec<LineItem>,
    note: Option<SourceNote>,
}

/// Runs project queries against the upstream resource API
pub struct PricingService {
    endpoints: ApiEndpoints,
    tokens: Arc<dyn TokenProvider>,
    fetcher: Arc<dyn ResourceFetcher>,
    options: QueryOptions,
}

impl PricingService {
    pub fn new(
        endpoints: ApiEndpoints,
        tokens: Arc<dyn TokenProvider>,
        fetcher: Arc<dyn ResourceFetcher>,
        options: QueryOptions,
    ) -> Self {
        Self {
            endpoints,
            tokens,
            fetcher,
            options,
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    /// Price every well of a project
    ///
    /// # Errors
    /// Session not ready, token failure, project lookup failure, or
    /// cancellation. Partial results are discarded on error.
    pub async fn project_report(
        &self,
        session: &SessionState,
        project_number: &str,
        group_by: GroupBy,
        cancel: &CancellationToken,
    ) -> Result<ProjectReport, QueryError> {
        let project_number = project_number.trim();
        if project_number.is_empty() {
            return Err(QueryError::InvalidInput("project number is empty".to_string()));
        }
        let credentials = session.credentials().ok_or(QueryError::CredentialsPending)?;

        let query_id = Uuid::new_v4();
        let span = info_span!("project_query", query_id = %query_id, project = %project_number);

        self.run_project_query(credentials, query_id, project_number, group_by, cancel)
            .instrument(span)
            .await
    }

    async fn run_project_query(
        &self,
        credentials: &ApiCredentials,
        query_id: Uuid,
        project_number: &str,
        group_by: GroupBy,
        cancel: &CancellationToken,
    ) -> Result<ProjectReport, QueryError> {
        info!("Starting project query");

        let token = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(QueryError::Cancelled),
            token = self.tokens.token(credentials) => token?,
        };

        let project_url = self
            .endpoints
            .project_url(project_number)
            .map_err(QueryError::ProjectLookup)?;
        let raw_project = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(QueryError::Cancelled),
            raw = self.fetcher.fetch_json(&project_url, &token) => {
                raw.map_err(QueryError::ProjectLookup)?
            }
        };

        let project = self.options.flattener.flatten(&raw_project).unwrap_or_else(|e| {
            warn!(error = %e, "Project payload could not be flattened");
            FlatTable::default()
        });
        let wells = well_ids(&raw_project);
        if wells.is_empty() {
            info!("No wells found for this project");
        } else {
            info!(wells = wells.len(), "Wells enumerated");
        }

        let pairs: Vec<(String, SourceAttribute)> = wells
            .iter()
            .flat_map(|well| SourceAttribute::ALL.map(|source| (well.clone(), source)))
            .collect();

        let token = token.as_str();
        let mut outcomes = pin!(stream::iter(pairs)
            .map(|(well_id, source)| self.fetch_and_extract(token, project_number, well_id, source))
            .buffered(self.options.max_concurrent_fetches.max(1)));

        let mut item_groups = Vec::new();
        let mut notes = Vec::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Project query cancelled, discarding partial results");
                    return Err(QueryError::Cancelled);
                }
                next = outcomes.next() => next,
            };
            let Some(outcome) = next else { break };
            item_groups.push(outcome.items);
            notes.extend(outcome.note);
        }

        let (line_items, summary) = aggregate_by(item_groups, group_by);
        info!(
            line_items = line_items.len(),
            summary_rows = summary.len(),
            notes = notes.len(),
            "Project query complete"
        );

        Ok(ProjectReport {
            query_id,
            project_number: project_number.to_string(),
            generated_at: Utc::now(),
            project,
            wells,
            line_items,
            summary,
            notes,
        })
    }

    async fn fetch_and_extract(
        &self,
        token: &str,
        project_number: &str,
        well_id: String,
        source: SourceAttribute,
    ) -> PairOutcome {
        let fetched = match self.endpoints.resource_url(WellResource::Pricing(source), &well_id) {
            Ok(url) => self.fetcher.fetch_json(&url, token).await,
            Err(e) => Err(e),
        };

        match fetched {
            Ok(raw) => {
                let items = extract(source, &raw, project_number, &well_id);
                debug!(well_id = %well_id, source = %source, items = items.len(), "Extracted line items");
                let note = items.is_empty().then(|| SourceNote {
                    well_id: well_id.clone(),
                    source_attribute: source,
                    kind: NoteKind::NoData,
                });
                PairOutcome { items, note }
            }
            Err(e) => {
                warn!(well_id = %well_id, source = %source, error = %e, "Fetch failed, treating as no data");
                PairOutcome {
                    items: Vec::new(),
                    note: Some(SourceNote {
                        well_id,
                        source_attribute: source,
                        kind: NoteKind::FetchFailed {
                            message: e.to_string(),
                        },
                    }),
                }
            }
        }
    }

    /// Fetch and flatten the given resources of one well for inspection
    ///
    /// Per-resource failures are recorded in the result; only session and
    /// token failures are errors.
    pub async fn inspect_well(
        &self,
        session: &SessionState,
        well_id: &str,
        resources: &[WellResource],
    ) -> Result<Vec<ResourceInspection>, QueryError> {
        let well_id = well_id.trim();
        if well_id.is_empty() {
            return Err(QueryError::InvalidInput("well id is empty".to_string()));
        }
        let credentials = session.credentials().ok_or(QueryError::CredentialsPending)?;
        let token = self.tokens.token(credentials).await?;

        let mut inspections = Vec::with_capacity(resources.len());
        for &resource in resources {
            let url = match self.endpoints.resource_url(resource, well_id) {
                Ok(url) => url,
                Err(e) => {
                    inspections.push(ResourceInspection {
                        well_id: well_id.to_string(),
                        resource,
                        url: String::new(),
                        table: None,
                        error: Some(e.to_string()),
                    });
                    continue;
                }
            };

            let flattened = self
                .fetcher
                .fetch_json(&url, &token)
                .await
                .map_err(athena_common::Error::from)
                .and_then(|raw| self.options.flattener.flatten(&raw));

            let (table, error) = match flattened {
                Ok(table) => (Some(table), None),
                Err(e) => {
                    warn!(well_id = %well_id, resource = %resource, error = %e, "Inspection failed");
                    (None, Some(e.to_string()))
                }
            };
            inspections.push(ResourceInspection {
                well_id: well_id.to_string(),
                resource,
                url: url.to_string(),
                table,
                error,
            });
        }

        Ok(inspections)
    }
}
