use std::fmt;
use std::hash::{Hash, Hasher};

/// Every problem a watched program file can carry.
///
/// The numeric codes are persisted in the state file and must never be
/// reassigned. New kinds take the next free code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueKind {
    MissingSubprogram0,
    MissingSubprogram1,
    MissingSubprogram2,
    InvalidName,
    DuplicateOccurrence,
    PartLengthMismatch,
    MissingUgValues,
    InternalNameMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl IssueKind {
    pub const ALL: [IssueKind; 8] = [
        IssueKind::MissingSubprogram0,
        IssueKind::MissingSubprogram1,
        IssueKind::MissingSubprogram2,
        IssueKind::InvalidName,
        IssueKind::DuplicateOccurrence,
        IssueKind::PartLengthMismatch,
        IssueKind::MissingUgValues,
        IssueKind::InternalNameMismatch,
    ];

    pub fn code(self) -> u8 {
        match self {
            IssueKind::MissingSubprogram0 => 1,
            IssueKind::MissingSubprogram1 => 2,
            IssueKind::MissingSubprogram2 => 3,
            IssueKind::InvalidName => 4,
            IssueKind::DuplicateOccurrence => 5,
            IssueKind::PartLengthMismatch => 6,
            IssueKind::MissingUgValues => 7,
            IssueKind::InternalNameMismatch => 8,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Short operator-facing description.
    pub fn label(self) -> &'static str {
        match self {
            IssueKind::MissingSubprogram0 => "$0 subprogram missing",
            IssueKind::MissingSubprogram1 => "$1 subprogram missing",
            IssueKind::MissingSubprogram2 => "$2 subprogram missing",
            IssueKind::InvalidName => "invalid name",
            IssueKind::DuplicateOccurrence => "duplicate PRG",
            IssueKind::PartLengthMismatch => "part length does not equal cut-off",
            IssueKind::MissingUgValues => "missing one or more UG values",
            IssueKind::InternalNameMismatch => "file name and internal name don't match",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            IssueKind::DuplicateOccurrence => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One issue attached to a record. `detail` is informational only: two issues
/// of the same kind are equal whatever their detail says.
#[derive(Debug, Clone)]
pub struct Issue {
    pub kind: IssueKind,
    pub detail: Option<String>,
}

impl Issue {
    pub fn new(kind: IssueKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn with_detail(kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }
}

impl PartialEq for Issue {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Issue {}

impl Hash for Issue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
    }
}

impl From<IssueKind> for Issue {
    fn from(kind: IssueKind) -> Self {
        Issue::new(kind)
    }
}

/// Insertion-ordered set of issues, unique by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueSet {
    items: Vec<Issue>,
}

impl IssueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the issue unless one of the same kind is already present.
    /// Returns whether the set grew.
    pub fn insert(&mut self, issue: impl Into<Issue>) -> bool {
        let issue = issue.into();
        if self.contains(issue.kind) {
            return false;
        }
        self.items.push(issue);
        true
    }

    pub fn contains(&self, kind: IssueKind) -> bool {
        self.items.iter().any(|i| i.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.items.iter()
    }

    pub fn kinds(&self) -> impl Iterator<Item = IssueKind> + '_ {
        self.items.iter().map(|i| i.kind)
    }
}

impl FromIterator<Issue> for IssueSet {
    fn from_iter<T: IntoIterator<Item = Issue>>(iter: T) -> Self {
        let mut set = IssueSet::new();
        for issue in iter {
            set.insert(issue);
        }
        set
    }
}

impl FromIterator<IssueKind> for IssueSet {
    fn from_iter<T: IntoIterator<Item = IssueKind>>(iter: T) -> Self {
        iter.into_iter().map(Issue::new).collect()
    }
}

impl<'a> IntoIterator for &'a IssueSet {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
