use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::fs::FileSystem;
use crate::planner::{RenameOperation, RenamePlan};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renamed {
    pub op: RenameOperation,
    /// Where the entry lives once the whole plan ran, including later renames
    /// of its ancestors.
    pub final_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub op: RenameOperation,
    pub reason: String,
    /// Where the entry actually is now: `from`, or the intermediate name when
    /// only the first half of a case-only rename went through.
    pub actual_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub succeeded: Vec<Renamed>,
    pub failed: Vec<Failure>,
    /// Operations never attempted because the caller stopped the run.
    pub cancelled: Vec<RenameOperation>,
}

impl ExecutionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.cancelled.is_empty()
    }
}

/// Applies every operation of the plan in order. Failures are recorded and the
/// run carries on; nothing is rolled back or retried.
pub fn execute<F>(plan: &RenamePlan, fs: &F) -> ExecutionReport
where
    F: FileSystem + ?Sized,
{
    execute_until(plan, fs, |_| true)
}

/// Like [`execute`], but asks `keep_going` before each operation. Once it
/// returns false the remaining operations are reported as cancelled.
pub fn execute_until<F, C>(plan: &RenamePlan, fs: &F, mut keep_going: C) -> ExecutionReport
where
    F: FileSystem + ?Sized,
    C: FnMut(&RenameOperation) -> bool,
{
    let mut report = ExecutionReport::default();
    let operations = plan.operations();
    let mut succeeded_at = Vec::new();
    let mut failed_at = Vec::new();

    for (idx, op) in operations.iter().enumerate() {
        if !keep_going(op) {
            info!("Stopping before {:?}", op.from);
            report.cancelled.extend(operations[idx..].iter().cloned());
            break;
        }

        match apply(op, fs) {
            Ok(()) => {
                info!("Renamed {:?} -> {:?}", op.from, op.to);
                report.succeeded.push(Renamed {
                    op: op.clone(),
                    final_path: op.to.clone(),
                });
                succeeded_at.push(idx);
            }
            Err(failure) => {
                warn!("Rename {:?} failed: {}", op.from, failure.reason);
                report.failed.push(failure);
                failed_at.push(idx);
            }
        }
    }

    resolve_final_paths(&mut report, &succeeded_at, &failed_at);

    info!(
        "Rename complete: {} succeeded, {} failed, {} cancelled",
        report.succeeded.len(),
        report.failed.len(),
        report.cancelled.len()
    );
    report
}

fn apply<F>(op: &RenameOperation, fs: &F) -> Result<(), Failure>
where
    F: FileSystem + ?Sized,
{
    let fail = |reason: String, actual: &Path| Failure {
        op: op.clone(),
        reason,
        actual_path: actual.to_path_buf(),
    };

    match &op.intermediate {
        None => {
            ensure_vacant(&op.to, fs).map_err(|reason| fail(reason, op.from.as_path()))?;
            fs.rename(&op.from, &op.to)
                .map_err(|e| fail(e.to_string(), op.from.as_path()))
        }
        Some(tmp) => {
            ensure_vacant(tmp, fs).map_err(|reason| fail(reason, op.from.as_path()))?;
            fs.rename(&op.from, tmp)
                .map_err(|e| fail(e.to_string(), op.from.as_path()))?;
            // Once the source has moved, `to` is free on any filesystem unless
            // something new took the name.
            ensure_vacant(&op.to, fs).map_err(|reason| {
                fail(
                    format!("{} (entry left at {})", reason, tmp.display()),
                    tmp.as_path(),
                )
            })?;
            fs.rename(tmp, &op.to).map_err(|e| {
                fail(
                    format!("{} (entry left at {})", e, tmp.display()),
                    tmp.as_path(),
                )
            })
        }
    }
}

// `rename` silently replaces files on most platforms.
fn ensure_vacant<F>(path: &Path, fs: &F) -> Result<(), String>
where
    F: FileSystem + ?Sized,
{
    match fs.stat(path) {
        Ok(None) => Ok(()),
        Ok(Some(_)) => Err(format!("{} already exists", path.display())),
        Err(e) => Err(e.to_string()),
    }
}

/// Rewrites reported locations for folder renames that ran later in the plan.
/// `succeeded_at` and `failed_at` hold each report entry's index in the plan.
fn resolve_final_paths(report: &mut ExecutionReport, succeeded_at: &[usize], failed_at: &[usize]) {
    let moves: Vec<(usize, PathBuf, PathBuf)> = succeeded_at
        .iter()
        .zip(&report.succeeded)
        .map(|(&idx, renamed)| (idx, renamed.op.from.clone(), renamed.op.to.clone()))
        .collect();

    for (renamed, &idx) in report.succeeded.iter_mut().zip(succeeded_at) {
        renamed.final_path = relocate(&renamed.op.to, idx, &moves);
    }
    for (failure, &idx) in report.failed.iter_mut().zip(failed_at) {
        failure.actual_path = relocate(&failure.actual_path, idx, &moves);
    }
}

fn relocate(path: &Path, after: usize, moves: &[(usize, PathBuf, PathBuf)]) -> PathBuf {
    let mut path = path.to_path_buf();
    for (_, from, to) in moves.iter().filter(|(idx, _, _)| *idx > after) {
        if let Ok(rest) = path.strip_prefix(from) {
            if !rest.as_os_str().is_empty() {
                path = to.join(rest);
            }
        }
    }
    path
}
