// LogDiag - tests/e2e_diagnosis.rs
//
// End-to-end tests for the diagnosis pipeline.
//
// These tests exercise the real filesystem, the bundled catalogs under
// `catalogs/`, real walkdir node discovery, and real artifact writing.
// No mocks: every test goes from raw node logs on disk to a merged verdict.

use logdiag::app::aggregate::{diagnose, AggregatePlan};
use logdiag::app::{catalog_mgr, output};
use logdiag::core::model::{Diagnosis, FileStatus, RunReport};
use logdiag::platform::config::OutputSettings;
use logdiag::util::constants;
use logdiag::util::error::CatalogError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

// =============================================================================
// Helpers
// =============================================================================

/// Absolute path to the bundled catalogs.
fn bundled_catalogs() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("catalogs")
}

/// Plan over the bundled catalogs with default `<category>.log` globs.
fn bundled_plan() -> AggregatePlan {
    plan_with_patterns(&[])
}

fn plan_with_patterns(patterns: &[(&str, &str)]) -> AggregatePlan {
    let catalogs = catalog_mgr::load_catalogs(&bundled_catalogs()).unwrap();
    let patterns: BTreeMap<String, String> = patterns
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    AggregatePlan::new(catalogs, &patterns).unwrap()
}

/// Write `lines` (each terminated by '\n') to `root/node/file`.
fn write_log(root: &Path, node: &str, file: &str, lines: &[&str]) -> PathBuf {
    let dir = root.join(node);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(file);
    let mut body = String::new();
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    fs::write(&path, body).unwrap();
    path
}

fn run_bundled(root: &Path) -> RunReport {
    diagnose(root, &bundled_plan()).unwrap()
}

// =============================================================================
// Bundled catalogs
// =============================================================================

#[test]
fn e2e_bundled_catalogs_load() {
    let catalogs = catalog_mgr::load_catalogs(&bundled_catalogs()).unwrap();
    let names: Vec<_> = catalogs.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(names, vec!["application", "platform"]);

    let platform = &catalogs[1];
    let oom = platform.rule("oom").expect("oom rule");
    assert_eq!(oom.severity, 5);
    assert!(!oom.retryable);
    assert_eq!(oom.occurrence_limit, None);

    let socket = platform.rule("socket-reset").expect("socket-reset rule");
    assert!(socket.retryable);
    assert_eq!(socket.occurrence_limit, Some(3));

    // Severity 0 rules are accepted: they filter noise without diagnosing.
    let trace = catalogs[0].rule("stack-trace").expect("stack-trace rule");
    assert_eq!(trace.severity, 0);
}

// =============================================================================
// Verdicts
// =============================================================================

/// One memory error among ordinary lines yields that rule's diagnosis and
/// keeps every line in the filtered copy.
#[test]
fn e2e_single_oom_node() {
    let dir = tempfile::tempdir().unwrap();
    let mut lines = vec!["2026-10-14 10:00:00 INFO started"; 9];
    lines.insert(4, "java.lang.OutOfMemoryError: Java heap space");
    let log = write_log(dir.path(), "node0", "platform.log", &lines);

    let report = run_bundled(dir.path());

    assert_eq!(
        report.verdict,
        Diagnosis::new(5, false, "a node ran out of memory")
    );
    assert!(report.problem_found);
    assert!(report.should_escalate());

    let filtered = fs::read_to_string(log.with_file_name("platform-filtered.log")).unwrap();
    assert_eq!(filtered.lines().count(), 10);
    assert!(!filtered.contains(&"-".repeat(constants::SEPARATOR_WIDTH)));
}

/// A later, more severe non-retryable finding overrides an earlier
/// retryable one in full.
#[test]
fn e2e_higher_severity_replaces_retryable() {
    let dir = tempfile::tempdir().unwrap();
    write_log(
        dir.path(),
        "node0",
        "platform.log",
        &[
            "WARN Connection reset by peer",
            "INFO recovering",
            "ERROR ISS detected on round 1042",
        ],
    );

    let report = run_bundled(dir.path());
    assert_eq!(report.verdict.severity, 9);
    assert!(!report.verdict.retryable);
    assert_eq!(
        report.verdict.reason,
        "nodes disagreed on the state hash (inconsistent state signature)"
    );
}

/// Equal severities across nodes: the first node's reason is kept and
/// retryability accumulates.
#[test]
fn e2e_equal_severity_across_nodes() {
    let dir = tempfile::tempdir().unwrap();
    write_log(dir.path(), "node0", "platform.log", &["Connection reset by peer"]);
    write_log(dir.path(), "node1", "platform.log", &["GC pause 12000 ms"]);

    let report = run_bundled(dir.path());
    assert_eq!(
        report.verdict,
        Diagnosis::new(2, true, "a transient network failure between nodes")
    );
    assert!(!report.should_escalate());
}

#[test]
fn e2e_no_nodes_is_default_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let report = run_bundled(dir.path());

    assert_eq!(report.verdict, Diagnosis::default());
    assert!(!report.problem_found);
    assert!(!report.should_escalate());
}

#[test]
fn e2e_clean_logs_are_default_verdict() {
    let dir = tempfile::tempdir().unwrap();
    write_log(dir.path(), "node0", "platform.log", &["INFO all good"]);
    write_log(dir.path(), "node0", "application.log", &["INFO client done"]);

    let report = run_bundled(dir.path());
    assert_eq!(report.verdict, Diagnosis::default());
    assert!(!report.problem_found);
    assert_eq!(report.warnings().count(), 0);
}

/// A node missing one category log still contributes, with a warning.
#[test]
fn e2e_missing_category_log_is_absorbed() {
    let dir = tempfile::tempdir().unwrap();
    write_log(dir.path(), "node0", "application.log", &["Failed to load saved state"]);

    let report = run_bundled(dir.path());
    assert_eq!(report.verdict.severity, 8);

    let files = &report.nodes[0].files;
    let platform = files.iter().find(|f| f.category == "platform").unwrap();
    assert_eq!(platform.status, FileStatus::Missing);
    assert_eq!(report.warnings().count(), 1);
}

// =============================================================================
// Filtering
// =============================================================================

/// Occurrences past the rule limit are summarised after a separator.
#[test]
fn e2e_occurrence_limit_summary() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(
        dir.path(),
        "node0",
        "platform.log",
        &[
            "reset 1: Connection reset by peer",
            "reset 2: Connection reset by peer",
            "INFO between",
            "reset 3: Connection reset by peer",
            "reset 4: Connection reset by peer",
            "reset 5: Connection reset by peer",
        ],
    );

    run_bundled(dir.path());

    let filtered = fs::read_to_string(log.with_file_name("platform-filtered.log")).unwrap();
    let expected = format!(
        "reset 1: Connection reset by peer\n\
         reset 2: Connection reset by peer\n\
         INFO between\n\
         reset 3: Connection reset by peer\n\
         {}\n\
         And 2 more lines similar to\n\
         \treset 4: Connection reset by peer\n",
        "-".repeat(constants::SEPARATOR_WIDTH)
    );
    assert_eq!(filtered, expected);
}

/// Rerunning over the same tree never picks up filtered copies and
/// reproduces them byte for byte.
#[test]
fn e2e_rerun_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let lines: Vec<String> = (0..30)
        .map(|i| format!("round {i}: UNAVAILABLE: io exception"))
        .collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    write_log(dir.path(), "node0", "swirlds.log", &["GC pause 4500 ms"]);
    let app_log = write_log(dir.path(), "node0", "hgcaa.log", &refs);

    let plan = plan_with_patterns(&[("platform", "swirlds*.log"), ("application", "hgcaa.log")]);
    let first = diagnose(dir.path(), &plan).unwrap();
    let filtered_path = app_log.with_file_name("hgcaa-filtered.log");
    let first_filtered = fs::read(&filtered_path).unwrap();

    let second = diagnose(dir.path(), &plan).unwrap();
    let second_filtered = fs::read(&filtered_path).unwrap();

    assert_eq!(first.verdict, second.verdict);
    assert_eq!(first_filtered, second_filtered);

    let platform_files: Vec<_> = second.nodes[0]
        .files
        .iter()
        .filter(|f| f.category == "platform")
        .collect();
    assert_eq!(platform_files.len(), 1, "filtered copy was rescanned");
    assert_eq!(first.verdict, Diagnosis::new(3, true, "the client lost its gRPC connection to a node"));
}

// =============================================================================
// Artifacts and failures
// =============================================================================

#[test]
fn e2e_artifacts_written_and_escalated() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    write_log(&logs, "node0", "platform.log", &["OutOfMemoryError"]);
    write_log(&logs, "node1", "application.log", &["UNAVAILABLE: io exception"]);

    let report = run_bundled(&logs);
    let out = dir.path().join("diagnostics");
    let artifacts = output::write_artifacts(&report, &out, &OutputSettings::default()).unwrap();

    let summary = fs::read_to_string(artifacts.summary.unwrap()).unwrap();
    assert!(summary.contains("a node ran out of memory"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(artifacts.json.unwrap()).unwrap()).unwrap();
    assert_eq!(json["severity"], 5);
    assert_eq!(json["retryable"], false);

    let csv = fs::read_to_string(artifacts.csv.unwrap()).unwrap();
    assert!(csv.starts_with("node,category,file,rule_id,severity,matches,filtered"));
    assert!(csv.contains("node0,platform"));

    assert!(artifacts.escalate.unwrap().exists());
}

#[test]
fn e2e_invalid_catalog_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::copy(
        bundled_catalogs().join("platform.json"),
        dir.path().join("platform.json"),
    )
    .unwrap();
    fs::write(
        dir.path().join("broken.json"),
        r#"[{"id": "bad", "pattern": "([unclosed", "matchMode": "regex", "impliedExitCode": 3}]"#,
    )
    .unwrap();

    assert!(matches!(
        catalog_mgr::load_catalogs(dir.path()),
        Err(CatalogError::InvalidRegex { .. })
    ));
}
