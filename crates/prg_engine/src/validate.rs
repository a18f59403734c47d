use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use prg_core::{CaseType, Issue, IssueKind, IssueSet, Verdict};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static PRG_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4,}[A-Za-z.]+").unwrap());
static PROGRAM_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bO(\d{4,})\b").unwrap());
static LEADING_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+").unwrap());
static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)").unwrap());

const RESERVED_ASC_NAME: &str = "4001.prg";
const UG_MARKERS: [&str; 5] = ["#101=", "#102=", "#103=", "#104=", "#105="];
const PART_LENGTH_COMMENT: &str = "(PartLength)";
const PART_LENGTH_ASSIGNMENT: &str = "#100=";

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("validator panicked on {path}: {message}")]
    Panicked { path: PathBuf, message: String },
}

/// Where the part length is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PartLengthAnchor {
    /// A `(PartLength)` comment line whose next line assigns `#100=`.
    #[default]
    CommentThenAssignment,
    /// Any line assigning `#100=`.
    Assignment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// Largest accepted difference between part length and cut-off.
    pub tolerance: f64,
    /// Decimal places the difference is rounded to before comparing.
    pub precision: u32,
    pub part_length_anchor: PartLengthAnchor,
    pub cut_off_marker: String,
    /// Lines between the marker and the line holding the cut-off value.
    pub cut_off_line_offset: usize,
    /// Character column the cut-off value starts at.
    pub cut_off_column: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            tolerance: 0.015,
            precision: 4,
            part_length_anchor: PartLengthAnchor::default(),
            cut_off_marker: "T0100 (CUT-OFF)".to_string(),
            cut_off_line_offset: 2,
            cut_off_column: 4,
        }
    }
}

pub trait Validator: Send + Sync {
    fn validate(&self, path: &Path) -> Result<Verdict, ValidateError>;
}

/// Reads a program file from disk and applies [`check_contents`].
#[derive(Debug, Clone, Default)]
pub struct PrgValidator {
    rules: ValidationRules,
}

impl PrgValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }
}

impl Validator for PrgValidator {
    fn validate(&self, path: &Path) -> Result<Verdict, ValidateError> {
        let bytes = fs::read(path).map_err(|source| ValidateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        Ok(check_contents(&file_name, &text, &self.rules))
    }
}

/// Validates program text. Line one selects the case type; the remaining
/// lines are scanned once.
pub fn check_contents(file_name: &str, text: &str, rules: &ValidationRules) -> Verdict {
    let mut lines = text.lines();
    let first_line = lines.next().unwrap_or("");
    let body: Vec<&str> = lines.collect();
    let case_type = case_type_of(first_line);
    let name = file_name.to_lowercase();

    let mut subprograms = [false; 3];
    let mut ug_values = [false; UG_MARKERS.len()];
    let mut part_length = None;
    let mut cut_off = None;

    for (i, line) in body.iter().enumerate() {
        for (marker, found) in ["$0", "$1", "$2"].iter().zip(subprograms.iter_mut()) {
            *found |= line.contains(marker);
        }
        for (marker, found) in UG_MARKERS.iter().zip(ug_values.iter_mut()) {
            *found |= line.contains(marker);
        }

        match rules.part_length_anchor {
            PartLengthAnchor::CommentThenAssignment => {
                if line.contains(PART_LENGTH_COMMENT) {
                    if let Some(value) = body.get(i + 1).and_then(|next| assigned_value(next)) {
                        part_length = Some(value);
                    }
                }
            }
            PartLengthAnchor::Assignment => {
                if let Some(value) = assigned_value(line) {
                    part_length = Some(value);
                }
            }
        }

        if line.contains(rules.cut_off_marker.as_str()) {
            if let Some(value) = body
                .get(i + rules.cut_off_line_offset)
                .and_then(|target| number_from_column(target, rules.cut_off_column))
            {
                cut_off = Some(value);
            }
        }
    }

    let mut issues = IssueSet::new();
    let missing = [
        IssueKind::MissingSubprogram0,
        IssueKind::MissingSubprogram1,
        IssueKind::MissingSubprogram2,
    ];
    for (kind, found) in missing.into_iter().zip(subprograms) {
        if !found {
            issues.insert(kind);
        }
    }

    let part_length = part_length.unwrap_or(0.0);
    let cut_off = cut_off.unwrap_or(0.0);
    let difference = round_to((part_length - cut_off).abs(), rules.precision);
    if difference > rules.tolerance {
        issues.insert(Issue::with_detail(
            IssueKind::PartLengthMismatch,
            format!("part length {part_length} vs cut-off {cut_off} (diff {difference})"),
        ));
    }

    if !PRG_NAME.is_match(&name) {
        issues.insert(IssueKind::InvalidName);
    }
    if name == RESERVED_ASC_NAME && case_type == CaseType::Asc {
        issues.insert(Issue::with_detail(
            IssueKind::InvalidName,
            "4001.prg is not a valid ASC program name",
        ));
    }

    if case_type.requires_ug_values() && ug_values.iter().any(|found| !found) {
        let absent: Vec<&str> = UG_MARKERS
            .iter()
            .zip(ug_values)
            .filter(|(_, found)| !found)
            .map(|(marker, _)| marker.trim_end_matches('='))
            .collect();
        issues.insert(Issue::with_detail(
            IssueKind::MissingUgValues,
            format!("missing {}", absent.join(", ")),
        ));
    }

    if let Some(internal) = internal_program_number(first_line, &body) {
        if let Some(digits) = LEADING_DIGITS.find(&name) {
            if strip_zeros(internal) != strip_zeros(digits.as_str()) {
                issues.insert(Issue::with_detail(
                    IssueKind::InternalNameMismatch,
                    format!("program declares O{internal}"),
                ));
            }
        }
    }

    Verdict { case_type, issues }
}

fn case_type_of(first_line: &str) -> CaseType {
    if first_line.contains("ASC") {
        CaseType::Asc
    } else if ["T-L", "TLCS", "TLOC"]
        .iter()
        .any(|marker| first_line.contains(marker))
    {
        CaseType::Tloc
    } else if first_line.contains("AOT14") {
        CaseType::Aot
    } else {
        CaseType::Ds
    }
}

/// Value of a `#100=` assignment; an empty or unparsable value is absent.
fn assigned_value(line: &str) -> Option<f64> {
    let (_, rest) = line.split_once(PART_LENGTH_ASSIGNMENT)?;
    let value = rest.trim();
    if value.is_empty() {
        return None;
    }
    DECIMAL
        .find(value)
        .filter(|m| m.start() == 0)
        .and_then(|m| m.as_str().parse().ok())
}

fn number_from_column(line: &str, column: usize) -> Option<f64> {
    let tail: String = line.chars().skip(column).collect();
    DECIMAL.find(&tail).and_then(|m| m.as_str().parse().ok())
}

/// Program number from line one, or else from the first non-blank line after it.
fn internal_program_number<'a>(first_line: &'a str, body: &[&'a str]) -> Option<&'a str> {
    let capture = |line: &'a str| PROGRAM_NUMBER.captures(line).and_then(|c| c.get(1));
    capture(first_line)
        .or_else(|| {
            body.iter()
                .copied()
                .find(|line| !line.trim().is_empty())
                .and_then(capture)
        })
        .map(|m| m.as_str())
}

fn strip_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}
