//! Per-well resource inspection API

use athena_common::TableView;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::client::WellResource;
use crate::error::{ApiError, ApiResult};
use crate::query::ResourceInspection;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct InspectQuery {
    /// One resource name; all five when absent
    pub resource: Option<String>,
}

/// Display form of a [`ResourceInspection`]
#[derive(Debug, Clone, Serialize)]
pub struct ResourceInspectionView {
    pub well_id: String,
    pub resource: WellResource,
    pub url: String,
    pub table: Option<TableView>,
    pub error: Option<String>,
}

impl From<&ResourceInspection> for ResourceInspectionView {
    fn from(inspection: &ResourceInspection) -> Self {
        Self {
            well_id: inspection.well_id.clone(),
            resource: inspection.resource,
            url: inspection.url.clone(),
            table: inspection.table.as_ref().map(TableView::of),
            error: inspection.error.clone(),
        }
    }
}

impl ResourceInspectionView {
    pub fn to_text(&self) -> String {
        let mut out = format!("{} ({})\n", self.resource, self.url);
        match (&self.table, &self.error) {
            (_, Some(error)) => out.push_str(&format!("Error: {}\n", error)),
            (Some(table), None) if table.total_rows > 0 => out.push_str(&table.to_text()),
            _ => out.push_str("No data\n"),
        }
        out
    }
}

/// Parse an optional resource name into the list to inspect
pub fn requested_resources(resource: Option<&str>) -> Result<Vec<WellResource>, ApiError> {
    match resource.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(WellResource::ALL.to_vec()),
        Some(name) => Ok(vec![name.parse::<WellResource>()?]),
    }
}

/// GET /api/wells/:well_id/inspect
pub async fn inspect_well(
    State(state): State<AppState>,
    Path(well_id): Path<String>,
    Query(query): Query<InspectQuery>,
) -> ApiResult<Json<Vec<ResourceInspectionView>>> {
    let resources = requested_resources(query.resource.as_deref())?;
    let session = state.session.read().await.clone();

    let inspections = state
        .service
        .inspect_well(&session, &well_id, &resources)
        .await?;

    Ok(Json(inspections.iter().map(ResourceInspectionView::from).collect()))
}
