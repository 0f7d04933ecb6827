use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub mod case;
pub mod config;
pub mod executor;
pub mod fs;
pub mod planner;
pub mod rules;
pub mod scanner;

pub use case::{classify, convert, CaseStyle};
pub use config::{load_config, load_config_file, write_config, NamingRules};
pub use executor::{execute, execute_until, ExecutionReport, Failure, Renamed};
pub use fs::{FileSystem, LocalFs};
pub use planner::{plan, PlanError, PlanErrorKind, PlanOutcome, RenameOperation, RenamePlan};
pub use rules::{evaluate, Violation, ViolationKind};
pub use scanner::{scan, Entry, EntryKind, IgnoreFilter, ScanIssue, ScanOptions, ScanOutcome};

#[derive(thiserror::Error, Debug)]
pub enum NamingError {
    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },
    #[error("Cannot read scan root {path:?}: {source}")]
    ScanRoot {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path:?} is not inside {root:?}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Violations found in one scan, plus whatever the scan had to skip.
#[derive(Debug, Clone, Default)]
pub struct Diagnosis {
    pub entries_scanned: usize,
    pub violations: Vec<Violation>,
    pub issues: Vec<ScanIssue>,
}

impl Diagnosis {
    pub fn fixable(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_fixable())
    }
}

/// Scans `root` with the given rules and evaluates every entry found.
pub fn scan_and_evaluate(
    root: &Path,
    rules: &NamingRules,
    options: &ScanOptions,
) -> Result<Diagnosis, NamingError> {
    rules.validate()?;

    info!(
        "Checking {:?}: files {}, folders {}",
        root,
        rules.file_case(),
        rules.folder_case()
    );

    let outcome = scan(root, &rules.ignore, options)?;
    let violations = evaluate(&outcome.entries, rules);

    Ok(Diagnosis {
        entries_scanned: outcome.entries.len(),
        violations,
        issues: outcome.issues,
    })
}

/// Evaluates a single entry, e.g. after it was opened or saved in an editor.
///
/// Only the entry's own directory is listed, so conflicts with its siblings are
/// still caught. Returns nothing for ignored paths.
pub fn check_entry(
    root: &Path,
    path: &Path,
    rules: &NamingRules,
) -> Result<Vec<Violation>, NamingError> {
    rules.validate()?;

    let relative = path
        .strip_prefix(root)
        .ok()
        .filter(|rel| rel.file_name().is_some())
        .ok_or_else(|| NamingError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let filter = IgnoreFilter::new(&rules.ignore);
    if filter.is_ignored(relative) {
        debug!("{:?} is ignored", relative);
        return Ok(Vec::new());
    }

    let parent = relative.parent().unwrap_or(Path::new(""));
    let options = ScanOptions {
        max_depth: Some(1),
        ..ScanOptions::default()
    };
    let siblings: Vec<Entry> = scan(&root.join(parent), &[], &options)?
        .entries
        .into_iter()
        .map(|e| Entry::new(parent.join(&e.relative_path), e.kind))
        .filter(|e| !filter.is_ignored(&e.relative_path))
        .collect();

    Ok(evaluate(&siblings, rules)
        .into_iter()
        .filter(|v| v.entry.relative_path == relative)
        .collect())
}
