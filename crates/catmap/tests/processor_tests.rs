//! Per-record state machine tests against the scripted surface.
//!
//! Every test runs on a paused clock, so the fixed settle delays and bounded
//! polls cost no wall time.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use catmap::ledger::FailureEntry;
use catmap::processor::{ProcessorState, ProgressEvent, RecordingProgress};
use catmap::surface::{LeafScript, ResponseBehavior, SurfaceCall, SurfaceTarget};
use catmap::{MappingOutcome, MarketId, OutcomeKind, ScriptedSurface};
use common::{leaf_name, CatalogBuilder, ConfigBuilder, TestHarness};

fn trigger_count(surface: &ScriptedSurface) -> usize {
    surface
        .calls()
        .iter()
        .filter(|c| matches!(c, SurfaceCall::TriggerSettings))
        .count()
}

fn read_count(surface: &ScriptedSurface) -> usize {
    surface
        .calls()
        .iter()
        .filter(|c| matches!(c, SurfaceCall::ReadMarket(_)))
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_resolved_record_is_saved_once() {
    let harness = TestHarness::new();
    let records = CatalogBuilder::new().leaves(1).build();
    let surface = Arc::new(ScriptedSurface::new());
    let processor = harness.processor(surface.clone());
    let progress = RecordingProgress::new();

    let item = processor.process(1, &records[0], &progress).await.unwrap();

    assert_eq!(item.outcome, MappingOutcome::Success);
    assert!(item.failure.is_none());
    assert_eq!(item.settings_attempts, 1);
    assert_eq!(item.response_status, Some(200));
    assert_eq!(item.completion_checks, 1);
    assert_eq!(harness.processed_ids(), vec!["1"]);
    assert_eq!(harness.marker().as_deref(), Some("1"));
    assert_eq!(surface.saved_leaves(), vec![leaf_name(1)]);
    assert!(!surface.settings_open());
    assert!(surface.snapshot_targets().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_hierarchy_is_selected_top_to_leaf() {
    let harness = TestHarness::new();
    let records = CatalogBuilder::new().leaves(1).build();
    let surface = Arc::new(ScriptedSurface::new());
    let processor = harness.processor(surface.clone());

    processor
        .process(1, &records[0], &RecordingProgress::new())
        .await
        .unwrap();

    let calls = surface.calls();
    assert_eq!(
        &calls[..3],
        &[
            SurfaceCall::Select("Fashion".to_string()),
            SurfaceCall::Select("Shoes".to_string()),
            SurfaceCall::Select(leaf_name(1)),
        ]
    );
    // Listener is armed before automatic mapping is triggered
    let armed = calls.iter().position(|c| *c == SurfaceCall::ArmResponse);
    let triggered = calls
        .iter()
        .position(|c| *c == SurfaceCall::TriggerAutoMapping);
    assert!(armed.unwrap() < triggered.unwrap());
    assert!(calls.contains(&SurfaceCall::FillSearch(leaf_name(1))));
}

#[tokio::test(start_paused = true)]
async fn test_progress_walks_every_state() {
    let harness = TestHarness::new();
    let records = CatalogBuilder::new().leaves(1).build();
    let processor = harness.processor(Arc::new(ScriptedSurface::new()));
    let progress = RecordingProgress::new();

    processor.process(1, &records[0], &progress).await.unwrap();

    assert_eq!(
        progress.states(),
        vec![
            ProcessorState::HierarchySelecting,
            ProcessorState::SettingsOpening,
            ProcessorState::MappingTriggering,
            ProcessorState::ResponseWaiting,
            ProcessorState::CompletionPolling,
            ProcessorState::Classifying,
            ProcessorState::Committing,
            ProcessorState::Idle,
        ]
    );
    assert!(progress.events().contains(&ProgressEvent::Finished {
        record_id: "1".to_string(),
        outcome: OutcomeKind::Success,
    }));
}

#[tokio::test(start_paused = true)]
async fn test_malformed_path_never_selects() {
    let harness = TestHarness::new();
    let records = CatalogBuilder::new().leaf("77", "Fashion > Shoes").build();
    let surface = Arc::new(ScriptedSurface::new());
    let processor = harness.processor(surface.clone());

    let item = processor
        .process(1, &records[0], &RecordingProgress::new())
        .await
        .unwrap();

    match &item.outcome {
        MappingOutcome::HardError { message } => {
            assert!(message.contains("Invalid FullPath format"), "{}", message)
        }
        other => panic!("Expected hard error, got {:?}", other),
    }
    assert_eq!(surface.select_count(), 0);
    assert_eq!(harness.marker().as_deref(), Some("77"));
    assert!(harness.processed_ids().is_empty());
    assert_eq!(surface.snapshot_targets(), vec![SurfaceTarget::Main]);
    assert_eq!(harness.snapshot_files(), vec!["error_1_77.png"]);
}

#[tokio::test(start_paused = true)]
async fn test_settings_that_never_open_fail_after_three_attempts() {
    let harness = TestHarness::new();
    let records = CatalogBuilder::new().leaves(1).build();
    let surface = Arc::new(
        ScriptedSurface::new().script(&leaf_name(1), LeafScript::resolved().settings_never_open()),
    );
    let processor = harness.processor(surface.clone());
    let start = Instant::now();

    let item = processor
        .process(1, &records[0], &RecordingProgress::new())
        .await
        .unwrap();

    let message = match &item.outcome {
        MappingOutcome::HardError { message } => message.clone(),
        other => panic!("Expected hard error, got {:?}", other),
    };
    assert!(message.contains('3'), "{}", message);
    assert_eq!(trigger_count(&surface), 3);
    assert_eq!(surface.snapshot_targets(), vec![SurfaceTarget::Main]);
    assert!(!surface
        .calls()
        .iter()
        .any(|c| matches!(c, SurfaceCall::FillSearch(_) | SurfaceCall::CloseSettings)));
    assert!(start.elapsed() >= Duration::from_secs(6));

    match item.failure {
        Some(FailureEntry::Error(entry)) => {
            assert_eq!(entry.index, 1);
            assert_eq!(entry.error, message);
            assert!(entry.screenshot_path.unwrap().ends_with("error_1_1.png"));
        }
        other => panic!("Expected error entry, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_settings_open_on_a_later_attempt() {
    let harness = TestHarness::new();
    let records = CatalogBuilder::new().leaves(1).build();
    let surface = Arc::new(
        ScriptedSurface::new().script(&leaf_name(1), LeafScript::resolved().settings_open_after(2)),
    );
    let processor = harness.processor(surface.clone());

    let item = processor
        .process(1, &records[0], &RecordingProgress::new())
        .await
        .unwrap();

    assert_eq!(item.outcome, MappingOutcome::Success);
    assert_eq!(item.settings_attempts, 3);
    assert_eq!(trigger_count(&surface), 3);
}

#[tokio::test(start_paused = true)]
async fn test_unresolved_markets_are_a_partial_failure() {
    let harness = TestHarness::new();
    let records = CatalogBuilder::new().leaves(1).build();
    let script = LeafScript::resolved()
        .unresolved(&[MarketId::Gmarket])
        .with_market(MarketId::Coupang, Some("  "));
    let surface = Arc::new(ScriptedSurface::new().script(&leaf_name(1), script));
    let processor = harness.processor(surface.clone());

    let item = processor
        .process(1, &records[0], &RecordingProgress::new())
        .await
        .unwrap();

    let expected: BTreeSet<MarketId> = [MarketId::Gmarket, MarketId::Coupang].into_iter().collect();
    match &item.outcome {
        MappingOutcome::PartialFailure {
            failed_markets,
            resolved_markets,
        } => {
            assert_eq!(failed_markets, &expected);
            assert_eq!(resolved_markets.len(), 3);
        }
        other => panic!("Expected partial failure, got {:?}", other),
    }

    assert!(!surface.calls().contains(&SurfaceCall::Save));
    assert!(surface.calls().contains(&SurfaceCall::CloseSettings));
    assert!(!surface.settings_open());
    assert!(harness.processed_ids().is_empty());
    assert_eq!(surface.snapshot_targets(), vec![SurfaceTarget::Settings]);
    assert_eq!(harness.snapshot_files(), vec!["failed_mapping_1_1.png"]);

    match item.failure {
        Some(FailureEntry::Mapping(entry)) => {
            assert_eq!(entry.id, "1");
            assert_eq!(entry.leaf_segment, leaf_name(1));
            assert_eq!(entry.failed_count, 2);
            assert_eq!(entry.mapped_count, 3);
            assert_eq!(entry.failed_markets, vec![MarketId::Gmarket, MarketId::Coupang]);
            assert_eq!(entry.markets.len(), 5);
        }
        other => panic!("Expected mapping entry, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_silent_response_times_out_and_proceeds() {
    let harness = TestHarness::new();
    let records = CatalogBuilder::new().leaves(1).build();
    let surface = Arc::new(
        ScriptedSurface::new().script(
            &leaf_name(1),
            LeafScript::resolved().response(ResponseBehavior::Silent),
        ),
    );
    let processor = harness.processor(surface.clone());
    let start = Instant::now();

    let item = processor
        .process(1, &records[0], &RecordingProgress::new())
        .await
        .unwrap();

    assert_eq!(item.outcome, MappingOutcome::Success);
    assert_eq!(item.response_status, None);
    assert!(start.elapsed() >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_listener_proceeds_immediately() {
    let harness = TestHarness::new();
    let records = CatalogBuilder::new().leaves(1).build();
    let surface = Arc::new(ScriptedSurface::with_default(
        LeafScript::resolved().response(ResponseBehavior::Drop),
    ));
    let processor = harness.processor(surface.clone());
    let start = Instant::now();

    let item = processor
        .process(1, &records[0], &RecordingProgress::new())
        .await
        .unwrap();

    assert_eq!(item.outcome, MappingOutcome::Success);
    assert!(start.elapsed() < Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_completion_poll_waits_for_late_resolution() {
    let harness = TestHarness::new();
    let records = CatalogBuilder::new().leaves(1).build();
    let surface = Arc::new(ScriptedSurface::with_default(
        LeafScript::resolved().resolve_after(3),
    ));
    let processor = harness.processor(surface.clone());

    let item = processor
        .process(1, &records[0], &RecordingProgress::new())
        .await
        .unwrap();

    assert_eq!(item.outcome, MappingOutcome::Success);
    assert_eq!(item.completion_checks, 4);
    // Four completion checks plus the classification read, five markets each
    assert_eq!(read_count(&surface), 5 * 5);
}

#[tokio::test(start_paused = true)]
async fn test_resolved_mapping_is_not_delayed_by_the_poll() {
    async fn elapsed_with_poll_interval(interval_ms: u64) -> (u32, Duration) {
        let harness =
            TestHarness::with_config(ConfigBuilder::new().completion_poll(interval_ms, 40));
        let records = CatalogBuilder::new().leaves(1).build();
        let processor = harness.processor(Arc::new(ScriptedSurface::new()));
        let start = Instant::now();

        let item = processor
            .process(1, &records[0], &RecordingProgress::new())
            .await
            .unwrap();
        (item.completion_checks, start.elapsed())
    }

    let (short_checks, short) = elapsed_with_poll_interval(500).await;
    let (long_checks, long) = elapsed_with_poll_interval(60_000).await;

    assert_eq!(short_checks, 1);
    assert_eq!(long_checks, 1);
    assert_eq!(short, long);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_completion_poll_still_classifies() {
    let harness = TestHarness::with_config(ConfigBuilder::new().completion_poll(500, 4));
    let records = CatalogBuilder::new().leaves(1).build();
    let surface = Arc::new(ScriptedSurface::with_default(
        LeafScript::resolved().resolve_after(100),
    ));
    let processor = harness.processor(surface.clone());

    let item = processor
        .process(1, &records[0], &RecordingProgress::new())
        .await
        .unwrap();

    assert_eq!(item.outcome.kind(), OutcomeKind::PartialFailure);
    assert_eq!(item.outcome.failed_count(), 5);
    assert_eq!(item.completion_checks, 4);
    assert_eq!(read_count(&surface), 5 * 5);
}

#[tokio::test(start_paused = true)]
async fn test_failed_save_is_a_hard_error_and_closes_settings() {
    let harness = TestHarness::new();
    let records = CatalogBuilder::new().leaves(1).build();
    let surface = Arc::new(ScriptedSurface::with_default(
        LeafScript::resolved().failing_save(),
    ));
    let processor = harness.processor(surface.clone());

    let item = processor
        .process(1, &records[0], &RecordingProgress::new())
        .await
        .unwrap();

    match &item.outcome {
        MappingOutcome::HardError { message } => {
            assert!(message.contains("save button"), "{}", message)
        }
        other => panic!("Expected hard error, got {:?}", other),
    }
    assert!(harness.processed_ids().is_empty());
    assert_eq!(surface.snapshot_targets(), vec![SurfaceTarget::Main]);
    assert_eq!(surface.calls().last(), Some(&SurfaceCall::CloseSettings));
    assert!(!surface.settings_open());
}

#[tokio::test(start_paused = true)]
async fn test_missing_segment_message_is_verbatim() {
    let harness = TestHarness::new();
    let records = CatalogBuilder::new().leaves(1).build();
    let surface = Arc::new(ScriptedSurface::new().failing_segment("Shoes"));
    let processor = harness.processor(surface.clone());

    let item = processor
        .process(4, &records[0], &RecordingProgress::new())
        .await
        .unwrap();

    match &item.outcome {
        MappingOutcome::HardError { message } => assert!(message.contains("Shoes")),
        other => panic!("Expected hard error, got {:?}", other),
    }
    assert_eq!(surface.select_count(), 2);
    assert_eq!(harness.snapshot_files(), vec!["error_4_1.png"]);
}

#[tokio::test(start_paused = true)]
async fn test_custom_delimiter() {
    let harness = TestHarness::with_config(ConfigBuilder::new().path_delimiter("/"));
    let records = CatalogBuilder::new().leaf("8", "Home/Kitchen/Knives").build();
    let surface = Arc::new(ScriptedSurface::new());
    let processor = harness.processor(surface.clone());

    let item = processor
        .process(1, &records[0], &RecordingProgress::new())
        .await
        .unwrap();

    assert_eq!(item.outcome, MappingOutcome::Success);
    assert_eq!(surface.saved_leaves(), vec!["Knives"]);
}

#[tokio::test(start_paused = true)]
async fn test_unwritable_marker_aborts_before_interaction() {
    let harness = TestHarness::new();
    std::fs::create_dir_all(harness.paths().marker).unwrap();
    let records = CatalogBuilder::new().leaves(1).build();
    let surface = Arc::new(ScriptedSurface::new());
    let processor = harness.processor(surface.clone());

    let result = processor
        .process(1, &records[0], &RecordingProgress::new())
        .await;

    assert!(result.is_err());
    assert!(surface.calls().is_empty());
}
