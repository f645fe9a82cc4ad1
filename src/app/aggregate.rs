// LogDiag - app/aggregate.rs
//
// Node / workflow aggregation: discovers node directories under a logs root,
// scans every (node, category, file) triple, and folds the diagnoses per node
// and then across nodes into one verdict.
//
// Ordering: nodes by directory name, then categories by name, then matching
// files by name. Scans may run on a rayon pool, but results are collected
// first and folded sequentially in that canonical order, so the verdict text
// never depends on which scan finished first.

use crate::app::scan::scan_log_file;
use crate::core::merge::merge_all;
use crate::core::model::{Catalog, FileScan, NodeReport, RunReport};
use crate::platform::fs::{file_name_lossy, is_filtered_copy};
use crate::util::constants;
use crate::util::error::AggregateError;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One node (or CI job) directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLogs {
    pub name: String,
    pub path: PathBuf,
}

/// A catalog paired with the glob selecting its logs inside a node directory.
#[derive(Debug, Clone)]
pub struct CategoryPlan {
    pub catalog: Catalog,
    /// Glob source text, e.g. `swirlds*.log`.
    pub log_pattern: String,
    pattern: glob::Pattern,
}

impl CategoryPlan {
    pub fn new(catalog: Catalog, log_pattern: &str) -> Result<Self, AggregateError> {
        let pattern =
            glob::Pattern::new(log_pattern).map_err(|e| AggregateError::InvalidLogPattern {
                category: catalog.category.clone(),
                pattern: log_pattern.to_string(),
                source: e,
            })?;
        Ok(Self {
            catalog,
            log_pattern: log_pattern.to_string(),
            pattern,
        })
    }

    /// Log file glob used when nothing is configured: `<category>.log`.
    pub fn default_pattern(category: &str) -> String {
        format!("{category}.{}", constants::DEFAULT_LOG_EXTENSION)
    }

    /// Files in `node_dir` this category applies to, sorted by name.
    ///
    /// Filtered copies from previous runs are never selected. When nothing
    /// matches, the single path `node_dir/<log_pattern>` is returned so the
    /// scan records it as missing.
    pub fn resolve_files(&self, node_dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(node_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    tracing::warn!(dir = %node_dir.display(), error = %err, "Cannot list node entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| !is_filtered_copy(p) && self.pattern.matches(&file_name_lossy(p)))
            .collect();

        if files.is_empty() {
            files.push(node_dir.join(&self.log_pattern));
        }
        files
    }
}

/// Everything needed to diagnose a run.
#[derive(Debug, Clone)]
pub struct AggregatePlan {
    /// Categories in canonical (name) order.
    pub categories: Vec<CategoryPlan>,
    /// Scan files on a worker pool.
    pub parallel: bool,
    /// Pool size; 0 uses rayon's global pool.
    pub worker_threads: usize,
    /// Fail with `NoNodes` when the logs root holds no node directories.
    pub require_nodes: bool,
}

impl AggregatePlan {
    /// Pair each catalog with its configured log glob (or the default).
    pub fn new(
        catalogs: Vec<Catalog>,
        log_patterns: &BTreeMap<String, String>,
    ) -> Result<Self, AggregateError> {
        let mut categories = catalogs
            .into_iter()
            .map(|catalog| {
                let pattern = log_patterns
                    .get(&catalog.category)
                    .cloned()
                    .unwrap_or_else(|| CategoryPlan::default_pattern(&catalog.category));
                CategoryPlan::new(catalog, &pattern)
            })
            .collect::<Result<Vec<_>, _>>()?;
        categories.sort_by(|a, b| a.catalog.category.cmp(&b.catalog.category));

        for category in log_patterns.keys() {
            if !categories.iter().any(|c| &c.catalog.category == category) {
                tracing::warn!(category = %category, "Configured category has no catalog; ignored");
            }
        }

        Ok(Self {
            categories,
            parallel: true,
            worker_threads: constants::DEFAULT_WORKER_THREADS,
            require_nodes: false,
        })
    }
}

/// Immediate sub-directories of `root`, sorted by name. Hidden directories
/// (leading `.`) are skipped.
pub fn discover_nodes(root: &Path) -> Result<Vec<NodeLogs>, AggregateError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(AggregateError::NotADirectory {
                path: root.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(AggregateError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
    }

    let mut nodes = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(err) if err.depth() == 0 => {
                return Err(AggregateError::Traversal {
                    path: root.to_path_buf(),
                    source: err,
                })
            }
            Err(err) => {
                tracing::warn!(root = %root.display(), error = %err, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if nodes.len() >= constants::MAX_NODES {
            return Err(AggregateError::TooManyNodes {
                max: constants::MAX_NODES,
            });
        }
        nodes.push(NodeLogs {
            name,
            path: entry.into_path(),
        });
    }

    tracing::info!(root = %root.display(), nodes = nodes.len(), "Node discovery complete");
    Ok(nodes)
}

/// Discover nodes under `logs_root` and diagnose them.
pub fn diagnose(logs_root: &Path, plan: &AggregatePlan) -> Result<RunReport, AggregateError> {
    let nodes = discover_nodes(logs_root)?;
    if nodes.is_empty() && plan.require_nodes {
        return Err(AggregateError::NoNodes {
            path: logs_root.to_path_buf(),
        });
    }
    run(plan, &nodes)
}

/// Fail if one existing file was selected by more than one category.
///
/// Each scan writes its own `-filtered` sibling, so two categories over one
/// file would overwrite each other's copy.
fn reject_overlaps(
    plan: &AggregatePlan,
    work: &[(usize, usize, PathBuf)],
) -> Result<(), AggregateError> {
    let mut owners: BTreeMap<&Path, Vec<usize>> = BTreeMap::new();
    for (_, ci, file) in work {
        if file.is_file() {
            owners.entry(file.as_path()).or_default().push(*ci);
        }
    }

    match owners.into_iter().find(|(_, cats)| cats.len() > 1) {
        Some((file, cats)) => Err(AggregateError::OverlappingCategories {
            file: file.to_path_buf(),
            categories: cats
                .into_iter()
                .map(|ci| plan.categories[ci].catalog.category.clone())
                .collect(),
        }),
        None => Ok(()),
    }
}

/// Scan every (node, category, file) triple and fold the results.
///
/// An empty node list yields the default verdict. A file matched by more
/// than one category glob is an `OverlappingCategories` error.
pub fn run(plan: &AggregatePlan, nodes: &[NodeLogs]) -> Result<RunReport, AggregateError> {
    // Canonical work order: (node index, category index, file).
    let work: Vec<(usize, usize, PathBuf)> = nodes
        .iter()
        .enumerate()
        .flat_map(|(ni, node)| {
            plan.categories.iter().enumerate().flat_map(move |(ci, category)| {
                category
                    .resolve_files(&node.path)
                    .into_iter()
                    .map(move |file| (ni, ci, file))
            })
        })
        .collect();

    reject_overlaps(plan, &work)?;

    tracing::debug!(
        nodes = nodes.len(),
        categories = plan.categories.len(),
        files = work.len(),
        parallel = plan.parallel,
        "Scan plan built"
    );

    let scan_one =
        |(_, ci, file): &(usize, usize, PathBuf)| scan_log_file(file, &plan.categories[*ci].catalog);

    // Indexed collect keeps results in work order regardless of completion order.
    let scans: Vec<FileScan> = if !plan.parallel {
        work.iter().map(scan_one).collect()
    } else if plan.worker_threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(plan.worker_threads)
            .build()
            .map_err(|e| AggregateError::ThreadPool { source: e })?;
        pool.install(|| work.par_iter().map(scan_one).collect())
    } else {
        work.par_iter().map(scan_one).collect()
    };

    let mut per_node: Vec<Vec<FileScan>> = vec![Vec::new(); nodes.len()];
    for ((ni, _, _), scan) in work.iter().zip(scans) {
        per_node[*ni].push(scan);
    }

    let node_reports: Vec<NodeReport> = nodes
        .iter()
        .zip(per_node)
        .map(|(node, files)| {
            let diagnosis = merge_all(files.iter().map(|f| &f.diagnosis));
            let problem_found = files.iter().any(|f| f.problem_found);
            tracing::info!(
                node = %node.name,
                severity = diagnosis.severity,
                retryable = diagnosis.retryable,
                "Node diagnosed"
            );
            NodeReport {
                name: node.name.clone(),
                path: node.path.clone(),
                diagnosis,
                problem_found,
                files,
            }
        })
        .collect();

    let verdict = merge_all(node_reports.iter().map(|n| &n.diagnosis));
    let problem_found = node_reports.iter().any(|n| n.problem_found);

    tracing::info!(
        severity = verdict.severity,
        retryable = verdict.retryable,
        reason = %verdict.reason,
        "Run diagnosed"
    );

    Ok(RunReport {
        verdict,
        problem_found,
        nodes: node_reports,
        generated_at: chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::load_catalog_str;
    use crate::core::model::{Diagnosis, FileStatus};
    use std::fs;

    fn catalog(category: &str, json: &str) -> Catalog {
        load_catalog_str(category, json, Path::new("test.json")).unwrap()
    }

    fn plan(catalogs: Vec<Catalog>, patterns: &[(&str, &str)]) -> AggregatePlan {
        let patterns: BTreeMap<String, String> = patterns
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AggregatePlan::new(catalogs, &patterns).unwrap()
    }

    #[test]
    fn test_discover_nodes_sorted_dirs_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["node2", "node0", "node1", ".hidden"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("stray.log"), "x").unwrap();

        let nodes = discover_nodes(dir.path()).unwrap();
        let names: Vec<_> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["node0", "node1", "node2"]);
    }

    #[test]
    fn test_discover_nodes_missing_root() {
        assert!(matches!(
            discover_nodes(Path::new("/nonexistent/logdiag/logs")),
            Err(AggregateError::RootNotFound { .. })
        ));
    }

    #[test]
    fn test_discover_nodes_root_is_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.log");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            discover_nodes(&file),
            Err(AggregateError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_empty_node_set_is_default_verdict() {
        let p = plan(vec![catalog("platform", "[]")], &[]);
        let report = run(&p, &[]).unwrap();
        assert_eq!(report.verdict, Diagnosis::default());
        assert!(!report.problem_found);
        assert!(report.nodes.is_empty());
    }

    #[test]
    fn test_require_nodes_policy() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = plan(vec![catalog("platform", "[]")], &[]);
        assert!(diagnose(dir.path(), &p).is_ok());

        p.require_nodes = true;
        assert!(matches!(
            diagnose(dir.path(), &p),
            Err(AggregateError::NoNodes { .. })
        ));
    }

    #[test]
    fn test_resolve_files_glob_skips_filtered_copies() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["swirlds-2.log", "swirlds.log", "swirlds-filtered.log", "other.log"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let cp = CategoryPlan::new(catalog("platform", "[]"), "swirlds*.log").unwrap();
        let names: Vec<_> = cp
            .resolve_files(dir.path())
            .iter()
            .map(|p| file_name_lossy(p))
            .collect();
        assert_eq!(names, vec!["swirlds-2.log", "swirlds.log"]);
    }

    #[test]
    fn test_resolve_files_nothing_matches_gives_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let cp = CategoryPlan::new(catalog("platform", "[]"), "platform.log").unwrap();
        assert_eq!(cp.resolve_files(dir.path()), vec![dir.path().join("platform.log")]);
    }

    #[test]
    fn test_file_claimed_by_two_categories_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let node_dir = dir.path().join("node0");
        fs::create_dir(&node_dir).unwrap();
        fs::write(node_dir.join("app.log"), "noise\nnoise\nnoise\nOutOfMemoryError\n").unwrap();

        let p = plan(
            vec![
                catalog(
                    "a",
                    r#"[{"id": "noise", "pattern": "noise", "impliedExitCode": 0,
                         "filterAfterOccurrences": 1}]"#,
                ),
                catalog(
                    "b",
                    r#"[{"id": "oom", "pattern": "OutOfMemoryError", "impliedExitCode": 5}]"#,
                ),
            ],
            &[("a", "*.log"), ("b", "*.log")],
        );

        match diagnose(dir.path(), &p) {
            Err(AggregateError::OverlappingCategories { file, categories }) => {
                assert_eq!(file, node_dir.join("app.log"));
                assert_eq!(categories, vec!["a", "b"]);
            }
            other => panic!("expected OverlappingCategories, got {other:?}"),
        }
        assert!(!node_dir.join("app-filtered.log").exists());
    }

    #[test]
    fn test_shared_missing_pattern_is_not_an_overlap() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("node0")).unwrap();
        let p = plan(
            vec![catalog("a", "[]"), catalog("b", "[]")],
            &[("a", "*.log"), ("b", "*.log")],
        );

        let report = diagnose(dir.path(), &p).unwrap();
        assert_eq!(report.warnings().count(), 2);
        assert!(report.nodes[0]
            .files
            .iter()
            .all(|f| f.status == FileStatus::Missing));
    }

    #[test]
    fn test_invalid_category_glob() {
        assert!(matches!(
            CategoryPlan::new(catalog("platform", "[]"), "[oops"),
            Err(AggregateError::InvalidLogPattern { .. })
        ));
    }

    #[test]
    fn test_categories_sorted_and_default_pattern() {
        let p = plan(
            vec![catalog("platform", "[]"), catalog("application", "[]")],
            &[("platform", "swirlds*.log")],
        );
        let cats: Vec<_> = p
            .categories
            .iter()
            .map(|c| (c.catalog.category.as_str(), c.log_pattern.as_str()))
            .collect();
        assert_eq!(
            cats,
            vec![("application", "application.log"), ("platform", "swirlds*.log")]
        );
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let dir = tempfile::tempdir().unwrap();
        let platform = catalog(
            "platform",
            r#"[{"id": "a", "pattern": "warn-a", "impliedExitCode": 3, "readableInference": "A"},
                {"id": "b", "pattern": "warn-b", "impliedExitCode": 3, "shouldRetry": true,
                 "readableInference": "B"}]"#,
        );
        for (node, body) in [("n0", "warn-b\n"), ("n1", "warn-a\n"), ("n2", "ok\n")] {
            let node_dir = dir.path().join(node);
            fs::create_dir(&node_dir).unwrap();
            fs::write(node_dir.join("platform.log"), body).unwrap();
        }

        let mut p = plan(vec![platform], &[]);
        p.parallel = false;
        let sequential = diagnose(dir.path(), &p).unwrap();
        p.parallel = true;
        p.worker_threads = 3;
        let parallel = diagnose(dir.path(), &p).unwrap();

        assert_eq!(sequential.verdict, parallel.verdict);
        // n0 is folded first, so its reason wins the severity tie.
        assert_eq!(sequential.verdict, Diagnosis::new(3, true, "B"));
    }

    #[test]
    fn test_missing_category_log_contributes_default() {
        let dir = tempfile::tempdir().unwrap();
        let node_dir = dir.path().join("node0");
        fs::create_dir(&node_dir).unwrap();
        fs::write(node_dir.join("platform.log"), "OutOfMemoryError\n").unwrap();

        let p = plan(
            vec![
                catalog(
                    "platform",
                    r#"[{"id": "oom", "pattern": "OutOfMemoryError", "impliedExitCode": 5}]"#,
                ),
                catalog("application", "[]"),
            ],
            &[],
        );
        let report = diagnose(dir.path(), &p).unwrap();
        let node = &report.nodes[0];
        assert_eq!(node.files.len(), 2);
        assert_eq!(node.files[0].category, "application");
        assert_eq!(node.files[0].status, FileStatus::Missing);
        assert_eq!(node.files[1].status, FileStatus::Scanned);
        assert_eq!(report.verdict.severity, 5);
        assert_eq!(report.warnings().count(), 1);
    }
}
