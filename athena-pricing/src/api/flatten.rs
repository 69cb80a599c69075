//! Ad-hoc flattening of a posted JSON document

use athena_common::{Flattener, TableView};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FlattenQuery {
    pub separator: Option<String>,
}

/// POST /api/flatten
///
/// Flattens the request body with the configured bounds. Needs no API
/// credentials. A body that is not JSON is a 400 in the usual error shape.
pub async fn flatten_payload(
    State(state): State<AppState>,
    Query(query): Query<FlattenQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<TableView>> {
    let Json(raw) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let flattener = match query.separator {
        Some(separator) => Flattener {
            separator,
            ..state.flattener().clone()
        },
        None => state.flattener().clone(),
    };

    let table = flattener.flatten(&raw)?;
    Ok(Json(TableView::of(&table)))
}
