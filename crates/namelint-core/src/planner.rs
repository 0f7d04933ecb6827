use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::rules::{fold, Violation};
use crate::scanner::EntryKind;

/// A single rename, from and to absolute paths in the same directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOperation {
    pub from: PathBuf,
    pub to: PathBuf,
    pub kind: EntryKind,
    /// Case-only renames pass through this name so case-insensitive filesystems
    /// register the change.
    pub intermediate: Option<PathBuf>,
}

impl RenameOperation {
    pub fn is_case_only(&self) -> bool {
        self.intermediate.is_some()
    }
}

/// Renames in execution order: deeper paths first, chains inside one directory
/// ordered so every destination is vacated before it is reused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    operations: Vec<RenameOperation>,
}

impl RenamePlan {
    pub fn operations(&self) -> &[RenameOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RenameOperation> {
        self.operations.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanErrorKind {
    DestinationCollision,
    CycleDetected,
    StaleEntry,
    NotFixable,
}

/// Why a selected violation did not make it into the plan.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("{from:?} -> {to:?} collides with {existing}")]
    DestinationCollision {
        from: PathBuf,
        to: PathBuf,
        existing: String,
    },
    #[error("{from:?} -> {to:?} is blocked by a rename cycle")]
    CycleDetected { from: PathBuf, to: PathBuf },
    #[error("{path:?} changed since it was scanned: {reason}")]
    StaleEntry { path: PathBuf, reason: String },
    #[error("{path:?} has no automatic fix")]
    NotFixable { path: PathBuf },
}

impl PlanError {
    pub fn kind(&self) -> PlanErrorKind {
        match self {
            PlanError::DestinationCollision { .. } => PlanErrorKind::DestinationCollision,
            PlanError::CycleDetected { .. } => PlanErrorKind::CycleDetected,
            PlanError::StaleEntry { .. } => PlanErrorKind::StaleEntry,
            PlanError::NotFixable { .. } => PlanErrorKind::NotFixable,
        }
    }

    /// Stale entries only degrade the plan; everything else needs attention.
    pub fn is_warning(&self) -> bool {
        self.kind() == PlanErrorKind::StaleEntry
    }

    pub fn path(&self) -> &Path {
        match self {
            PlanError::DestinationCollision { from, .. } => from,
            PlanError::CycleDetected { from, .. } => from,
            PlanError::StaleEntry { path, .. } => path,
            PlanError::NotFixable { path } => path,
        }
    }
}

impl fmt::Display for PlanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlanErrorKind::DestinationCollision => "destination collision",
            PlanErrorKind::CycleDetected => "cycle detected",
            PlanErrorKind::StaleEntry => "stale entry",
            PlanErrorKind::NotFixable => "not fixable",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlanOutcome {
    pub plan: RenamePlan,
    pub rejected: Vec<PlanError>,
}

#[derive(Debug, Clone)]
struct Candidate {
    from: PathBuf,
    to: PathBuf,
    kind: EntryKind,
    from_name: String,
    to_name: String,
}

impl Candidate {
    fn is_case_only(&self) -> bool {
        fold(&self.from_name) == fold(&self.to_name)
    }
}

/// Turns approved violations into an ordered, collision-free rename plan.
///
/// Every selected violation ends up either in the plan or in `rejected`.
/// Sources are checked against the live filesystem; a missing or changed
/// source drops only that operation.
pub fn plan<F>(root: &Path, selected: &[Violation], fs: &F) -> PlanOutcome
where
    F: FileSystem + ?Sized,
{
    let mut rejected = Vec::new();
    let mut by_dir: BTreeMap<PathBuf, Vec<Candidate>> = BTreeMap::new();
    let mut sources = HashSet::new();

    for violation in selected {
        let from = root.join(&violation.entry.relative_path);
        let from_name = violation.entry.name();
        let to_name = match violation.suggested_name.as_deref() {
            Some(name) if violation.is_fixable() && is_plain_name(name) && name != from_name => {
                name
            }
            _ => {
                debug!("Not fixable: {:?}", from);
                rejected.push(PlanError::NotFixable { path: from });
                continue;
            }
        };
        if from_name.is_empty() {
            rejected.push(PlanError::NotFixable { path: from });
            continue;
        }
        if !sources.insert(from.clone()) {
            debug!("Duplicate selection of {:?}, planning once", from);
            continue;
        }

        let dir = from.parent().unwrap_or(root).to_path_buf();
        by_dir.entry(dir.clone()).or_default().push(Candidate {
            to: dir.join(to_name),
            from,
            kind: violation.entry.kind,
            from_name: from_name.to_string(),
            to_name: to_name.to_string(),
        });
    }

    let mut groups: Vec<(PathBuf, Vec<RenameOperation>)> = Vec::new();
    for (dir, candidates) in by_dir {
        let ops = plan_directory(&dir, candidates, fs, &mut rejected);
        if !ops.is_empty() {
            groups.push((dir, ops));
        }
    }

    // Deepest directories first so children move before their parents do.
    groups.sort_by(|(a, _), (b, _)| {
        b.components()
            .count()
            .cmp(&a.components().count())
            .then_with(|| a.cmp(b))
    });
    let operations: Vec<RenameOperation> = groups.into_iter().flat_map(|(_, ops)| ops).collect();

    info!(
        "Planned {} renames, rejected {}",
        operations.len(),
        rejected.len()
    );
    PlanOutcome {
        plan: RenamePlan { operations },
        rejected,
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn plan_directory<F>(
    dir: &Path,
    candidates: Vec<Candidate>,
    fs: &F,
    rejected: &mut Vec<PlanError>,
) -> Vec<RenameOperation>
where
    F: FileSystem + ?Sized,
{
    let listing = match fs.list_dir(dir) {
        Ok(listing) => listing,
        Err(e) => {
            warn!("Cannot list {:?}: {}", dir, e);
            for c in candidates {
                rejected.push(PlanError::StaleEntry {
                    path: c.from,
                    reason: format!("cannot list {}: {}", dir.display(), e),
                });
            }
            return Vec::new();
        }
    };

    let mut active = Vec::new();
    for c in candidates {
        match check_fresh(&c, &listing, fs) {
            Ok(()) => active.push(c),
            Err(reason) => {
                warn!("Stale entry {:?}: {}", c.from, reason);
                rejected.push(PlanError::StaleEntry {
                    path: c.from,
                    reason,
                });
            }
        }
    }

    reject_collisions(&mut active, &listing, rejected);
    let ordered = order_chains(active, rejected);

    let mut taken: HashSet<String> = listing
        .iter()
        .map(|n| fold(n))
        .chain(ordered.iter().map(|c| fold(&c.to_name)))
        .collect();

    ordered
        .into_iter()
        .map(|c| {
            let intermediate = c
                .is_case_only()
                .then(|| dir.join(intermediate_name(&c.to_name, &mut taken)));
            debug!("Planned {:?} -> {:?} (via {:?})", c.from, c.to, intermediate);
            RenameOperation {
                from: c.from,
                to: c.to,
                kind: c.kind,
                intermediate,
            }
        })
        .collect()
}

fn check_fresh<F>(c: &Candidate, listing: &[String], fs: &F) -> Result<(), String>
where
    F: FileSystem + ?Sized,
{
    // Exact match: a case-insensitive stat would also find a differently-cased name.
    if !listing.iter().any(|name| *name == c.from_name) {
        return Err("no longer exists".to_string());
    }
    match fs.stat(&c.from) {
        Ok(Some(kind)) if kind == c.kind => Ok(()),
        Ok(Some(kind)) => Err(format!("is now a {}", kind)),
        Ok(None) => Err("no longer exists".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Drops operations whose destination is claimed twice, or is held by a sibling
/// that stays put. Repeats until stable, since a dropped operation no longer
/// vacates its source.
fn reject_collisions(
    active: &mut Vec<Candidate>,
    listing: &[String],
    rejected: &mut Vec<PlanError>,
) {
    loop {
        let mut collisions: Vec<(usize, String)> = Vec::new();

        let mut by_dest: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, c) in active.iter().enumerate() {
            by_dest.entry(fold(&c.to_name)).or_default().push(i);
        }
        for members in by_dest.values().filter(|m| m.len() > 1) {
            for &i in members {
                let others: Vec<&str> = members
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| active[j].from_name.as_str())
                    .collect();
                collisions.push((i, format!("planned rename of {}", others.join(", "))));
            }
        }

        for (i, c) in active.iter().enumerate() {
            if collisions.iter().any(|(j, _)| *j == i) {
                continue;
            }
            let dest = fold(&c.to_name);
            let blocker = listing.iter().find(|name| {
                **name != c.from_name && fold(name) == dest && !vacates(active, name)
            });
            if let Some(name) = blocker {
                collisions.push((i, format!("existing entry {}", name)));
            }
        }

        if collisions.is_empty() {
            return;
        }

        collisions.sort_by(|a, b| b.0.cmp(&a.0));
        for (i, existing) in collisions {
            let c = active.remove(i);
            warn!("Destination collision {:?} -> {:?}: {}", c.from, c.to, existing);
            rejected.push(PlanError::DestinationCollision {
                from: c.from,
                to: c.to,
                existing,
            });
        }
    }
}

fn vacates(active: &[Candidate], name: &str) -> bool {
    active
        .iter()
        .any(|c| c.from_name == name && !c.is_case_only())
}

/// Orders renames in one directory so that an operation whose destination is
/// another operation's source runs after it. Whatever cannot be ordered is a cycle.
fn order_chains(active: Vec<Candidate>, rejected: &mut Vec<PlanError>) -> Vec<Candidate> {
    let n = active.len();
    let mut pending: Vec<usize> = vec![0; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (x, waiting) in active.iter().enumerate() {
        let dest = fold(&waiting.to_name);
        for (y, moving) in active.iter().enumerate() {
            if x != y && fold(&moving.from_name) == dest {
                pending[x] += 1;
                dependents[y].push(x);
            }
        }
    }

    let mut ready: Vec<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while !ready.is_empty() {
        ready.sort_by(|&a, &b| active[b].from.cmp(&active[a].from));
        let Some(next) = ready.pop() else { break };
        order.push(next);
        for &d in &dependents[next] {
            pending[d] -= 1;
            if pending[d] == 0 {
                ready.push(d);
            }
        }
    }

    let mut slots: Vec<Option<Candidate>> = active.into_iter().map(Some).collect();
    let ordered: Vec<Candidate> = order.iter().filter_map(|&i| slots[i].take()).collect();
    for c in slots.into_iter().flatten() {
        warn!("Rename cycle at {:?} -> {:?}", c.from, c.to);
        rejected.push(PlanError::CycleDetected {
            from: c.from,
            to: c.to,
        });
    }
    ordered
}

fn intermediate_name(to_name: &str, taken: &mut HashSet<String>) -> String {
    let base = format!("{}__tmp", to_name);
    let mut candidate = base.clone();
    let mut n = 1;
    while !taken.insert(fold(&candidate)) {
        candidate = format!("{}{}", base, n);
        n += 1;
    }
    candidate
}
