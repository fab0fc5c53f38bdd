// crates/survey-harness/tests/test_app.rs
// ============================================================================
// Module: Test Context Tests
// Description: Setup, generation, export, and teardown of a TestApp.
// Purpose: Validate count invariants and teardown on every exit path.
// ============================================================================

//! Scoped test context tests covering counts, teardown, and error pairing.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use proptest::prelude::*;
use survey_harness::HarnessError;
use survey_harness::HarnessFileAuditSink;
use survey_harness::HarnessNoopAuditSink;
use survey_harness::TestApp;
use survey_harness::create_test_app;
use survey_harness_config::ConfigError;
use survey_harness_config::HarnessConfig;
use survey_harness_config::StoreBackend;
use survey_harness_core::ExportError;
use survey_harness_core::InMemoryParticipantStore;
use survey_harness_core::ParticipantDraft;
use survey_harness_core::ParticipantId;
use survey_harness_core::ParticipantRecord;
use survey_harness_core::ParticipantStore;
use survey_harness_core::ResponseGenerator;
use survey_harness_core::StoreError;
use survey_harness_core::SurveySchema;
use survey_harness_store_sqlite::SqliteParticipantStore;
use survey_harness_store_sqlite::SqliteStoreConfig;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn quiet_config() -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.audit.enabled = false;
    config.generate.seed = Some(42);
    config
}

fn generator() -> ResponseGenerator {
    ResponseGenerator::new(SurveySchema::default_survey(), Some(7)).expect("default schema")
}

fn app_over(store: impl ParticipantStore + 'static) -> TestApp {
    TestApp::with_store(Box::new(store), generator(), Arc::new(HarnessNoopAuditSink))
        .expect("store ready")
}

/// In-memory store whose deletes always fail.
struct UndeletableStore {
    inner: InMemoryParticipantStore,
}

impl ParticipantStore for UndeletableStore {
    fn insert(&mut self, draft: ParticipantDraft) -> Result<ParticipantId, StoreError> {
        self.inner.insert(draft)
    }

    fn query_all(&self) -> Result<Vec<ParticipantRecord>, StoreError> {
        self.inner.query_all()
    }

    fn delete(&mut self, _id: ParticipantId) -> Result<(), StoreError> {
        Err(StoreError::Store("delete refused".to_string()))
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.inner.rollback()
    }
}

/// In-memory store that refuses exactly one delete, the second it sees.
struct FlakyDeleteStore {
    inner: InMemoryParticipantStore,
    deletes: usize,
}

impl ParticipantStore for FlakyDeleteStore {
    fn insert(&mut self, draft: ParticipantDraft) -> Result<ParticipantId, StoreError> {
        self.inner.insert(draft)
    }

    fn query_all(&self) -> Result<Vec<ParticipantRecord>, StoreError> {
        self.inner.query_all()
    }

    fn delete(&mut self, id: ParticipantId) -> Result<(), StoreError> {
        self.deletes += 1;
        if self.deletes == 2 {
            return Err(StoreError::Store("delete interrupted".to_string()));
        }
        self.inner.delete(id)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.inner.rollback()
    }
}

fn body_failure() -> HarnessError {
    HarnessError::Export(ExportError::Invalid("body failed".to_string()))
}

// ============================================================================
// SECTION: Setup
// ============================================================================

#[test]
fn create_test_app_starts_empty_and_cleans_up_its_directory() {
    let app = create_test_app().expect("default app");
    assert_eq!(app.participant_count().expect("count"), 0);
    assert!(app.run_id().as_str().starts_with("run-"));
    let scratch = app.scratch_dir().expect("temporary store directory").to_path_buf();
    assert!(scratch.is_dir());
    drop(app);
    assert!(!scratch.exists());
}

#[test]
fn each_context_gets_a_distinct_run_id() {
    let first = TestApp::from_config(&quiet_config()).expect("first app");
    let second = TestApp::from_config(&quiet_config()).expect("second app");
    assert_ne!(first.run_id(), second.run_id());
}

#[test]
fn invalid_config_is_rejected_before_opening_a_store() {
    let mut config = quiet_config();
    config.store.backend = StoreBackend::Memory;
    config.store.path = Some("participants.sqlite3".into());
    match TestApp::from_config(&config) {
        Err(HarnessError::Config(ConfigError::Invalid(message))) => {
            assert!(message.contains("store.path"));
        }
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("expected config rejection"),
    }
}

// ============================================================================
// SECTION: Generate, Export, Teardown
// ============================================================================

#[test]
fn generate_adds_exactly_n_and_export_sees_them() {
    let mut app = TestApp::from_config(&quiet_config()).expect("app");
    let before = app.participant_count().expect("count");
    let ids = app.generate(25).expect("generate");
    assert_eq!(ids.len(), 25);
    assert_eq!(app.participant_count().expect("count"), before + 25);
    let table = app.export().expect("export");
    assert_eq!(table.row_count(), before + 25);
    let run_ids = table.column("run_id").expect("run_id column");
    assert!(run_ids.iter().all(|value| value.to_string() == app.run_id().as_str()));
}

#[test]
fn generate_zero_is_a_no_op() {
    let mut app = TestApp::from_config(&quiet_config()).expect("app");
    assert!(app.generate(0).expect("generate").is_empty());
    assert_eq!(app.participant_count().expect("count"), 0);
    assert!(app.export().expect("export").is_empty());
}

#[test]
fn teardown_is_idempotent() {
    let mut app = TestApp::from_config(&quiet_config()).expect("app");
    app.generate(10).expect("generate");
    assert_eq!(app.teardown().expect("first teardown"), 10);
    assert_eq!(app.participant_count().expect("count"), 0);
    assert_eq!(app.teardown().expect("second teardown"), 0);
    assert_eq!(app.participant_count().expect("count"), 0);
}

#[test]
fn write_creates_missing_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut app = TestApp::from_config(&quiet_config()).expect("app");
    app.generate(3).expect("generate");
    let table = app.export().expect("export");
    let target = dir.path().join("data").join("nested").join("test.csv");
    let written = app.write(&table, &target).expect("write");
    assert_eq!(written, target);
    let contents = fs::read_to_string(&target).expect("read csv");
    assert_eq!(contents.lines().count(), 4);
}

#[test]
fn write_to_unwritable_path_is_an_export_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("data");
    fs::write(&blocker, b"not a directory").expect("write blocker");
    let app = TestApp::from_config(&quiet_config()).expect("app");
    let table = app.export().expect("export");
    match app.write(&table, &blocker.join("test.csv")) {
        Err(HarnessError::Export(ExportError::Io(_))) => {}
        other => panic!("unexpected result {other:?}"),
    }
}

// ============================================================================
// SECTION: Scoped Teardown
// ============================================================================

#[test]
fn scope_tears_down_after_success() {
    let shared = InMemoryParticipantStore::new();
    let app = app_over(shared.clone());
    let (generated, deleted) =
        app.scope(|app| Ok(app.generate(8)?.len())).expect("scope succeeds");
    assert_eq!(generated, 8);
    assert_eq!(deleted, 8);
    assert_eq!(shared.committed_count().expect("count"), 0);
}

#[test]
fn scope_tears_down_when_body_fails() {
    let shared = InMemoryParticipantStore::new();
    let app = app_over(shared.clone());
    let result: Result<((), usize), HarnessError> = app.scope(|app| {
        app.generate(5)?;
        Err(body_failure())
    });
    match result {
        Err(HarnessError::Export(ExportError::Invalid(message))) => {
            assert_eq!(message, "body failed");
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(shared.committed_count().expect("count"), 0);
}

#[test]
fn failing_body_and_teardown_report_both_errors() {
    let app = app_over(UndeletableStore {
        inner: InMemoryParticipantStore::new(),
    });
    let result: Result<((), usize), HarnessError> = app.scope(|app| {
        app.generate(2)?;
        Err(body_failure())
    });
    match result {
        Err(HarnessError::Scenario {
            source,
            teardown,
        }) => {
            assert!(matches!(*source, HarnessError::Export(ExportError::Invalid(_))));
            assert_eq!(teardown, StoreError::Store("delete refused".to_string()));
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn teardown_only_failure_is_returned() {
    let app = app_over(UndeletableStore {
        inner: InMemoryParticipantStore::new(),
    });
    match app.scope(|app| Ok(app.generate(1)?.len())) {
        Err(HarnessError::Teardown(StoreError::Store(message))) => {
            assert_eq!(message, "delete refused");
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn teardown_of_an_empty_store_succeeds_even_if_deletes_would_fail() {
    let app = app_over(UndeletableStore {
        inner: InMemoryParticipantStore::new(),
    });
    let ((), deleted) = app.scope(|_| Ok(())).expect("nothing to delete");
    assert_eq!(deleted, 0);
}

#[test]
fn run_scenario_returns_body_value() {
    let mut config = quiet_config();
    config.store.backend = StoreBackend::Memory;
    let rows = TestApp::run_scenario(&config, |app| {
        app.generate(4)?;
        Ok(app.export()?.row_count())
    })
    .expect("scenario");
    assert_eq!(rows, 4);
}

// ============================================================================
// SECTION: Drop
// ============================================================================

#[test]
fn drop_tears_down_a_context_that_was_never_torn_down() {
    let shared = InMemoryParticipantStore::new();
    {
        let mut app = app_over(shared.clone());
        app.generate(7).expect("generate");
        assert_eq!(shared.committed_count().expect("count"), 7);
    }
    assert_eq!(shared.committed_count().expect("count"), 0);
}

#[test]
fn drop_cleans_an_explicit_sqlite_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("participants.sqlite3");
    let mut config = quiet_config();
    config.store.path = Some(path.clone());
    {
        let mut app = TestApp::from_config(&config).expect("app");
        assert!(app.scratch_dir().is_none());
        app.generate(12).expect("generate");
    }
    let store = SqliteParticipantStore::new(SqliteStoreConfig::new(&path)).expect("reopen");
    assert_eq!(store.count().expect("count"), 0);
}

#[test]
fn drop_records_teardown_failure_in_the_audit_log() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("audit.jsonl");
    let audit = Arc::new(HarnessFileAuditSink::new(&log).expect("audit file"));
    {
        let mut app = TestApp::with_store(
            Box::new(UndeletableStore {
                inner: InMemoryParticipantStore::new(),
            }),
            generator(),
            audit,
        )
        .expect("app");
        app.generate(3).expect("generate");
    }
    let events = read_events(&log);
    let last = events.last().expect("events recorded");
    assert_eq!(last["event"], "teardown_failed");
    assert!(last["error"].as_str().expect("error text").contains("delete refused"));
}

#[test]
fn failed_scope_teardown_rolls_back_and_is_not_retried_on_drop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("audit.jsonl");
    let audit = Arc::new(HarnessFileAuditSink::new(&log).expect("audit file"));
    let shared = InMemoryParticipantStore::new();
    let app = TestApp::with_store(
        Box::new(FlakyDeleteStore {
            inner: shared.clone(),
            deletes: 0,
        }),
        generator(),
        audit,
    )
    .expect("app");

    let result: Result<((), usize), HarnessError> = app.scope(|app| {
        app.generate(4)?;
        Err(body_failure())
    });
    match result {
        Err(HarnessError::Scenario {
            teardown, ..
        }) => {
            assert_eq!(teardown, StoreError::Store("delete interrupted".to_string()));
        }
        other => panic!("unexpected result {other:?}"),
    }

    assert_eq!(shared.committed_count().expect("committed"), 4);
    assert_eq!(shared.count().expect("session count"), 4);
    let events = read_events(&log);
    let failures = events.iter().filter(|event| event["event"] == "teardown_failed").count();
    assert_eq!(failures, 1);
    assert!(!events.iter().any(|event| event["event"] == "teardown"));
}

fn read_events(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .expect("read audit log")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn count_grows_by_exactly_n_and_teardown_empties(n in 0_usize .. 40) {
        let mut config = quiet_config();
        config.store.backend = StoreBackend::Memory;
        let mut app = TestApp::from_config(&config).expect("app");
        app.generate(3).expect("seed rows");
        let before = app.participant_count().expect("count");
        app.generate(n).expect("generate");
        prop_assert_eq!(app.participant_count().expect("count"), before + n);
        prop_assert_eq!(app.export().expect("export").row_count(), before + n);
        prop_assert_eq!(app.teardown().expect("teardown"), before + n);
        prop_assert_eq!(app.participant_count().expect("count"), 0);
    }
}
