use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::case::{self, CaseStyle, NameParts};
use crate::config::NamingRules;
use crate::scanner::{Entry, EntryKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// The name does not follow the required style.
    CaseRule,
    /// The name collides case-insensitively with a sibling, now or after fixing.
    CaseConflict,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::CaseRule => f.write_str("case-rule"),
            ViolationKind::CaseConflict => f.write_str("case-conflict"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub entry: Entry,
    pub kind: ViolationKind,
    pub required: CaseStyle,
    /// Replacement basename. Always `None` for conflicts.
    pub suggested_name: Option<String>,
}

impl Violation {
    /// Whether the planner may act on this violation.
    pub fn is_fixable(&self) -> bool {
        self.kind == ViolationKind::CaseRule && self.suggested_name.is_some()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = match self.entry.kind {
            EntryKind::File => "File",
            EntryKind::Folder => "Folder",
        };
        match (self.kind, &self.suggested_name) {
            (ViolationKind::CaseRule, Some(name)) => write!(
                f,
                "{} name '{}' does not follow {} (suggested: {})",
                noun,
                self.entry.name(),
                self.required,
                name
            ),
            (ViolationKind::CaseRule, None) => write!(
                f,
                "{} name '{}' does not follow {} and cannot be converted automatically",
                noun,
                self.entry.name(),
                self.required
            ),
            (ViolationKind::CaseConflict, _) => write!(
                f,
                "{} name '{}' collides with a sibling when case is ignored; rename it by hand",
                noun,
                self.entry.name()
            ),
        }
    }
}

/// The style required for an entry and, if it violates it, the corrected basename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub required: CaseStyle,
    pub conforms: bool,
    pub suggestion: Option<String>,
}

/// Checks one entry's basename against the rule for its kind.
pub fn assess(entry: &Entry, rules: &NamingRules) -> Assessment {
    let name = entry.name();
    let (required, parts) = match entry.kind {
        EntryKind::File => (rules.file_case(), NameParts::file(name)),
        EntryKind::Folder => (rules.folder_case(), NameParts::folder(name)),
    };

    let converted = case::convert(parts.subject, required);
    if converted == parts.subject {
        return Assessment {
            required,
            conforms: true,
            suggestion: None,
        };
    }

    // A suggestion that would itself be flagged on the next scan is no fix.
    let suggestion = if converted.is_empty() || !case::conforms(&converted, required) {
        None
    } else {
        Some(parts.with_subject(&converted))
    };
    Assessment {
        required,
        conforms: false,
        suggestion: suggestion.filter(|s| s != name),
    }
}

/// Produces rule and conflict violations for a set of scanned entries.
///
/// Siblings that already share a case-folded name, or would share one after
/// their own fixes, are all reported as conflicts and lose their suggestion.
/// Current and proposed names are compared separately: one entry taking the
/// name another gives up is an ordering problem for the planner, not a conflict.
pub fn evaluate(entries: &[Entry], rules: &NamingRules) -> Vec<Violation> {
    let assessments: Vec<Assessment> = entries.iter().map(|e| assess(e, rules)).collect();

    let mut groups = UnionFind::new(entries.len());
    let mut current_names: HashMap<(&Path, String), usize> = HashMap::new();
    let mut proposed_names: HashMap<(&Path, String), usize> = HashMap::new();
    for (idx, (entry, assessment)) in entries.iter().zip(&assessments).enumerate() {
        let current = entry.name();
        let proposed = assessment.suggestion.as_deref().unwrap_or(current);
        for (seen, name) in [(&mut current_names, current), (&mut proposed_names, proposed)] {
            match seen.get(&(entry.parent(), fold(name))) {
                Some(&other) => groups.union(idx, other),
                None => {
                    seen.insert((entry.parent(), fold(name)), idx);
                }
            }
        }
    }

    let mut violations = Vec::new();
    for (idx, (entry, assessment)) in entries.iter().zip(assessments).enumerate() {
        if groups.size(idx) > 1 {
            debug!("Case conflict: {:?}", entry.relative_path);
            violations.push(Violation {
                entry: entry.clone(),
                kind: ViolationKind::CaseConflict,
                required: assessment.required,
                suggested_name: None,
            });
        } else if !assessment.conforms {
            debug!(
                "Case rule: {:?} -> {:?}",
                entry.relative_path, assessment.suggestion
            );
            violations.push(Violation {
                entry: entry.clone(),
                kind: ViolationKind::CaseRule,
                required: assessment.required,
                suggested_name: assessment.suggestion,
            });
        }
    }

    info!(
        "Evaluated {} entries: {} violations",
        entries.len(),
        violations.len()
    );
    violations
}

/// Case-insensitive comparison key for names in one directory.
pub fn fold(name: &str) -> String {
    name.to_lowercase()
}

struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
    }

    fn size(&mut self, x: usize) -> usize {
        let root = self.find(x);
        self.size[root]
    }
}
