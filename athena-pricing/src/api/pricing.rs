//! Project pricing report API

use athena_common::aggregate::{GrandTotal, GroupBy};
use athena_common::TableView;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::query::{NoteKind, ProjectReport, SourceNote};
use crate::AppState;

/// Query parameters for a pricing report
#[derive(Debug, Deserialize)]
pub struct PricingQuery {
    /// Summary group column, defaults to the configured one
    pub group_by: Option<GroupBy>,
}

/// Overall outcome of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Ok,
    /// The project lists no wells
    NoWells,
    /// Wells exist but no source produced a line item
    NoData,
}

/// Display form of a [`ProjectReport`]: every table as columns plus rows
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReportView {
    pub query_id: Uuid,
    pub project_number: String,
    pub generated_at: DateTime<Utc>,
    pub status: ReportStatus,
    pub wells: Vec<String>,
    pub project: TableView,
    pub line_items: TableView,
    pub summary: TableView,
    pub grand_total: GrandTotal,
    pub notes: Vec<SourceNote>,
}

impl From<&ProjectReport> for ProjectReportView {
    fn from(report: &ProjectReport) -> Self {
        let status = if !report.has_wells() {
            ReportStatus::NoWells
        } else if report.line_items.is_empty() {
            ReportStatus::NoData
        } else {
            ReportStatus::Ok
        };

        Self {
            query_id: report.query_id,
            project_number: report.project_number.clone(),
            generated_at: report.generated_at,
            status,
            wells: report.wells.clone(),
            project: TableView::of(&report.project),
            line_items: TableView::of(&report.line_items),
            summary: TableView::of(&report.summary),
            grand_total: report.summary.grand_total(),
            notes: report.notes.clone(),
        }
    }
}

impl ProjectReportView {
    /// Plain-text rendering for terminals
    pub fn to_text(&self) -> String {
        let mut out = format!("Project {} ({})\n", self.project_number, self.generated_at.to_rfc3339());

        match self.status {
            ReportStatus::NoWells => {
                out.push_str("No wells found for this project.\n");
                return out;
            }
            ReportStatus::NoData => out.push_str("No pricing data found for any well.\n"),
            ReportStatus::Ok => {}
        }
        out.push_str(&format!("Wells: {}\n\n", self.wells.join(", ")));

        out.push_str("Line items\n");
        out.push_str(&self.line_items.to_text());
        out.push_str("\nSummary\n");
        out.push_str(&self.summary.to_text());
        out.push_str(&format!(
            "\nTotal: {} lines, qty {}, discounted {:.2}, list {:.2}\n",
            self.grand_total.lines,
            self.grand_total.total_qty,
            self.grand_total.total_extended_discounted,
            self.grand_total.total_extended_list,
        ));

        if !self.notes.is_empty() {
            out.push_str("\nNotes\n");
            for note in &self.notes {
                out.push_str(&format!("  {} {}: {}\n", note.well_id, note.source_attribute, note_text(note)));
            }
        }
        out
    }
}

fn note_text(note: &SourceNote) -> String {
    match &note.kind {
        NoteKind::NoData => "no data".to_string(),
        NoteKind::FetchFailed { message } => format!("fetch failed ({})", message),
    }
}

/// GET /api/projects/:project_number/pricing
pub async fn get_project_pricing(
    State(state): State<AppState>,
    Path(project_number): Path<String>,
    Query(query): Query<PricingQuery>,
) -> ApiResult<Json<ProjectReportView>> {
    let session = state.session.read().await.clone();
    let group_by = query.group_by.unwrap_or(state.service.options().group_by);
    let cancel = state.shutdown.child_token();

    let report = state
        .service
        .project_report(&session, &project_number, group_by, &cancel)
        .await?;

    Ok(Json(ProjectReportView::from(&report)))
}
