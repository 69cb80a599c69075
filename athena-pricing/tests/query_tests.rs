//! Project query runner tests against a stub upstream
//!
//! Tests cover:
//! - Line item order: well enumeration, then source order, then element order
//! - Order is unaffected by fetch completion order under concurrency
//! - Failed and empty (well, source) pairs become notes, never errors
//! - Summary grouping and grand totals
//! - Projects without wells
//! - Fatal failures: missing credentials, token, project lookup, cancellation
//! - Well inspection across all five resources

mod helpers;

use athena_common::aggregate::GroupBy;
use athena_common::SourceAttribute;
use athena_pricing::client::WellResource;
use athena_pricing::query::{NoteKind, QueryError};
use athena_pricing::session::SessionState;
use helpers::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn item_keys(report: &athena_pricing::query::ProjectReport) -> Vec<(String, SourceAttribute, Option<String>)> {
    report
        .line_items
        .items()
        .iter()
        .map(|p| {
            (
                p.item.well_id.clone(),
                p.item.source_attribute,
                p.item.catalog_external.clone(),
            )
        })
        .collect()
}

// =============================================================================
// Ordering and notes
// =============================================================================

#[tokio::test]
async fn test_report_concatenation_order() {
    let fetcher = Arc::new(standard_fetcher());
    let service = service(fetcher.clone(), Arc::new(StubTokens::ok()), 4);

    let report = service
        .project_report(&ready_session(), PROJECT, GroupBy::LineType, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.project_number, PROJECT);
    assert_eq!(report.wells, vec!["W2", "W1"]);
    assert_eq!(
        item_keys(&report),
        vec![
            ("W2".to_string(), SourceAttribute::CompletionDesign, Some("PR-100".to_string())),
            ("W2".to_string(), SourceAttribute::FracChemicals, Some("CH-1".to_string())),
            ("W1".to_string(), SourceAttribute::CartageCharges, Some("CT-1".to_string())),
            ("W1".to_string(), SourceAttribute::CartageCharges, Some("CT-2".to_string())),
        ]
    );

    // Every item carries the project number from the call
    assert!(report
        .line_items
        .items()
        .iter()
        .all(|p| p.item.project_number == PROJECT));

    // Project lookup plus four resources per well
    assert_eq!(fetcher.requests().len(), 1 + 2 * 4);
}

#[tokio::test]
async fn test_report_order_independent_of_completion_order() {
    // First pair answers last
    let fetcher = standard_fetcher().with(
        "completionDesign:W2",
        StubResponse::Delayed(Duration::from_millis(80), completion_design_payload()),
    );
    let service = service(Arc::new(fetcher), Arc::new(StubTokens::ok()), 8);

    let report = service
        .project_report(&ready_session(), PROJECT, GroupBy::LineType, &CancellationToken::new())
        .await
        .unwrap();

    let keys = item_keys(&report);
    assert_eq!(keys.len(), 4);
    assert_eq!(keys[0].1, SourceAttribute::CompletionDesign);
    assert_eq!(keys[1].1, SourceAttribute::FracChemicals);
    assert_eq!(keys[2].0, "W1");
}

#[tokio::test]
async fn test_sequential_and_concurrent_reports_match() {
    let sequential = service(Arc::new(standard_fetcher()), Arc::new(StubTokens::ok()), 1)
        .project_report(&ready_session(), PROJECT, GroupBy::LineType, &CancellationToken::new())
        .await
        .unwrap();
    let concurrent = service(Arc::new(standard_fetcher()), Arc::new(StubTokens::ok()), 16)
        .project_report(&ready_session(), PROJECT, GroupBy::LineType, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sequential.line_items, concurrent.line_items);
    assert_eq!(sequential.summary, concurrent.summary);
    assert_eq!(sequential.notes, concurrent.notes);
}

#[tokio::test]
async fn test_failed_and_empty_pairs_become_notes() {
    let service = service(Arc::new(standard_fetcher()), Arc::new(StubTokens::ok()), 4);
    let report = service
        .project_report(&ready_session(), PROJECT, GroupBy::LineType, &CancellationToken::new())
        .await
        .unwrap();

    let notes: Vec<(&str, SourceAttribute, bool)> = report
        .notes
        .iter()
        .map(|n| {
            (
                n.well_id.as_str(),
                n.source_attribute,
                matches!(n.kind, NoteKind::FetchFailed { .. }),
            )
        })
        .collect();

    assert_eq!(
        notes,
        vec![
            ("W2", SourceAttribute::CartageCharges, false),
            ("W2", SourceAttribute::ServiceCharges, true),
            ("W1", SourceAttribute::CompletionDesign, false),
            ("W1", SourceAttribute::FracChemicals, false),
            ("W1", SourceAttribute::ServiceCharges, false),
        ]
    );

    match &report.notes[1].kind {
        NoteKind::FetchFailed { message } => assert!(message.contains("500")),
        other => panic!("expected fetch failure, got {:?}", other),
    }
}

// =============================================================================
// Summary
// =============================================================================

#[tokio::test]
async fn test_summary_by_line_type() {
    let service = service(Arc::new(standard_fetcher()), Arc::new(StubTokens::ok()), 4);
    let report = service
        .project_report(&ready_session(), PROJECT, GroupBy::LineType, &CancellationToken::new())
        .await
        .unwrap();

    let rows: Vec<(&str, &str)> = report
        .summary
        .records
        .iter()
        .map(|r| (r.well_id.as_str(), r.group.as_str()))
        .collect();
    // Sorted by well id, then line type order
    assert_eq!(rows, vec![("W1", "cartage"), ("W2", "proppant"), ("W2", "chemical")]);

    let cartage = report.summary.get("W1", "cartage").unwrap();
    assert_eq!(cartage.lines, 2);
    assert_eq!(cartage.total_qty, 150.0);
    assert!((cartage.total_extended_discounted - 630.0).abs() < 1e-9);

    let proppant = report.summary.get("W2", "proppant").unwrap();
    assert!((proppant.total_extended_discounted - 9000.0).abs() < 1e-6);
    assert!((proppant.total_extended_list - 10000.0).abs() < 1e-6);

    let total = report.summary.grand_total();
    assert_eq!(total.lines, 4);
    assert!((total.total_extended_discounted - (9000.0 + 1000.0 + 630.0)).abs() < 1e-6);
    assert!((total.total_extended_list - (10000.0 + 1250.0 + 630.0)).abs() < 1e-6);
}

#[tokio::test]
async fn test_summary_by_source_attribute() {
    let service = service(Arc::new(standard_fetcher()), Arc::new(StubTokens::ok()), 4);
    let report = service
        .project_report(
            &ready_session(),
            PROJECT,
            GroupBy::SourceAttribute,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.summary.group_by, GroupBy::SourceAttribute);
    assert!(report.summary.get("W1", "cartageCharges").is_some());
    assert!(report.summary.get("W2", "fracChemicals").is_some());
    assert!(report.summary.get("W1", "cartage").is_none());
}

#[tokio::test]
async fn test_frac_discount_survives_query() {
    let service = service(Arc::new(standard_fetcher()), Arc::new(StubTokens::ok()), 4);
    let report = service
        .project_report(&ready_session(), PROJECT, GroupBy::LineType, &CancellationToken::new())
        .await
        .unwrap();

    let chemical = report
        .line_items
        .items()
        .iter()
        .find(|p| p.item.source_attribute == SourceAttribute::FracChemicals)
        .unwrap();
    assert_eq!(chemical.item.discount_pct, Some(20.0));
    assert_eq!(chemical.item.concentration.as_deref(), Some("0.5 gpt"));
}

// =============================================================================
// No wells
// =============================================================================

#[tokio::test]
async fn test_project_without_wells() {
    let fetcher = Arc::new(StubFetcher::new().json("project:P-100", project_payload(&[])));
    let service = service(fetcher.clone(), Arc::new(StubTokens::ok()), 4);

    let report = service
        .project_report(&ready_session(), PROJECT, GroupBy::LineType, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!report.has_wells());
    assert!(report.line_items.is_empty());
    assert!(report.summary.is_empty());
    assert!(report.notes.is_empty());
    // Project table is still available for display
    assert_eq!(report.project.len(), 1);
    assert_eq!(fetcher.requests(), vec!["project:P-100"]);
}

// =============================================================================
// Fatal failures
// =============================================================================

#[tokio::test]
async fn test_credentials_pending_makes_no_requests() {
    let fetcher = Arc::new(standard_fetcher());
    let tokens = Arc::new(StubTokens::ok());
    let service = service(fetcher.clone(), tokens.clone(), 4);

    let result = service
        .project_report(&SessionState::new(false), PROJECT, GroupBy::LineType, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(QueryError::CredentialsPending)));
    assert_eq!(tokens.calls(), 0);
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_blank_project_number_rejected() {
    let service = service(Arc::new(standard_fetcher()), Arc::new(StubTokens::ok()), 4);
    let result = service
        .project_report(&ready_session(), "  ", GroupBy::LineType, &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(QueryError::InvalidInput(_))));
}

#[tokio::test]
async fn test_token_failure_is_fatal() {
    let fetcher = Arc::new(standard_fetcher());
    let service = service(fetcher.clone(), Arc::new(StubTokens::failing()), 4);

    let result = service
        .project_report(&ready_session(), PROJECT, GroupBy::LineType, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(QueryError::Token(_))));
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_project_lookup_failure_is_fatal() {
    let fetcher = StubFetcher::new().with("project:P-100", StubResponse::Status(503));
    let service = service(Arc::new(fetcher), Arc::new(StubTokens::ok()), 4);

    let result = service
        .project_report(&ready_session(), PROJECT, GroupBy::LineType, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(QueryError::ProjectLookup(_))));
}

#[tokio::test]
async fn test_cancellation_discards_partial_results() {
    let fetcher = standard_fetcher().with("serviceCharges:W1", StubResponse::Hang);
    let service = service(Arc::new(fetcher), Arc::new(StubTokens::ok()), 2);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        service.project_report(&ready_session(), PROJECT, GroupBy::LineType, &cancel),
    )
    .await
    .expect("cancelled query should return promptly");

    assert!(matches!(result, Err(QueryError::Cancelled)));
}

#[tokio::test]
async fn test_already_cancelled_query() {
    let tokens = Arc::new(StubTokens::ok());
    let service = service(Arc::new(standard_fetcher()), tokens.clone(), 4);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = service
        .project_report(&ready_session(), PROJECT, GroupBy::LineType, &cancel)
        .await;
    assert!(matches!(result, Err(QueryError::Cancelled)));
}

// =============================================================================
// Inspection
// =============================================================================

#[tokio::test]
async fn test_inspect_all_resources() {
    let service = service(Arc::new(standard_fetcher()), Arc::new(StubTokens::ok()), 4);

    let inspections = service
        .inspect_well(&ready_session(), "W1", &WellResource::ALL)
        .await
        .unwrap();

    let resources: Vec<WellResource> = inspections.iter().map(|i| i.resource).collect();
    assert_eq!(resources, WellResource::ALL.to_vec());

    let general = &inspections[0];
    assert_eq!(
        general.url,
        format!("{}/generalWellInformation?well_id=W1", BASE_URL)
    );
    let table = general.table.as_ref().unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.records()[0]["wellName"], json!("Alpha 1H"));

    // Empty body flattens to an empty table
    assert_eq!(inspections[1].table.as_ref().map(|t| t.len()), Some(0));

    let cartage = inspections[3].table.as_ref().unwrap();
    assert_eq!(cartage.len(), 2);
    assert_eq!(cartage.records()[0]["measurementUnits_label"], json!("mi"));
}

#[tokio::test]
async fn test_inspect_records_per_resource_errors() {
    let service = service(Arc::new(standard_fetcher()), Arc::new(StubTokens::ok()), 4);

    let inspections = service
        .inspect_well(
            &ready_session(),
            "W2",
            &[
                WellResource::GeneralWellInformation,
                WellResource::Pricing(SourceAttribute::CompletionDesign),
            ],
        )
        .await
        .unwrap();

    assert_eq!(inspections.len(), 2);
    assert!(inspections[0].table.is_none());
    assert!(inspections[0].error.as_deref().unwrap().contains("404"));

    let proppant = inspections[1].table.as_ref().unwrap();
    assert_eq!(proppant.len(), 1);
    assert_eq!(
        proppant.records()[0]["proppantsTypeMesh_proppantCommercialName"],
        json!("Northern White")
    );
}
