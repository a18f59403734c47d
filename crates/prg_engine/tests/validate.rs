mod common;

use std::fs;

use common::{clean_asc, clean_ds, init_logging, program, UG_BLOCK};
use pretty_assertions::assert_eq;
use prg_core::{CaseType, IssueKind};
use prg_engine::{
    check_contents, PartLengthAnchor, PrgValidator, ValidateError, ValidationRules, Validator,
};
use tempfile::TempDir;

fn kinds(file_name: &str, text: &str) -> Vec<IssueKind> {
    check_contents(file_name, text, &ValidationRules::default())
        .issues
        .kinds()
        .collect()
}

#[test]
fn clean_programs_have_no_issues() {
    init_logging();
    let verdict = check_contents("9001.prg", &clean_ds("9001"), &ValidationRules::default());
    assert_eq!(verdict.case_type, CaseType::Ds);
    assert!(verdict.issues.is_empty());

    let verdict = check_contents("9002.prg", &clean_asc("9002"), &ValidationRules::default());
    assert_eq!(verdict.case_type, CaseType::Asc);
    assert!(verdict.issues.is_empty());
}

#[test]
fn part_length_within_tolerance_passes() {
    init_logging();
    let text = program("O9001 (DS)", "100.0000", "100.0140", &[]);
    assert_eq!(kinds("9001.prg", &text), vec![]);
}

#[test]
fn part_length_beyond_tolerance_is_flagged_once() {
    init_logging();
    let text = program("O9001 (DS)", "100.0000", "100.02", &[]);
    assert_eq!(kinds("9001.prg", &text), vec![IssueKind::PartLengthMismatch]);

    let verdict = check_contents("9001.prg", &text, &ValidationRules::default());
    let detail = verdict.issues.iter().next().and_then(|i| i.detail.clone());
    assert!(detail.unwrap().contains("100.02"));
}

#[test]
fn tolerance_is_configurable() {
    init_logging();
    let text = program("O9001 (DS)", "100.0000", "100.02", &[]);
    let rules = ValidationRules {
        tolerance: 0.05,
        ..ValidationRules::default()
    };
    assert!(check_contents("9001.prg", &text, &rules).issues.is_empty());
}

#[test]
fn missing_values_count_as_zero() {
    init_logging();
    let text = program("O9001 (DS)", "", "100.0", &[]);
    assert_eq!(kinds("9001.prg", &text), vec![IssueKind::PartLengthMismatch]);

    let text = "O9001 (DS)\n$0\n$1\n$2\n";
    assert_eq!(kinds("9001.prg", text), vec![]);
}

#[test]
fn assignment_anchor_reads_any_part_length_line() {
    init_logging();
    let text = "O9001 (DS)\n$0\n$1\n$2\n#100=55.0\nT0100 (CUT-OFF)\nG97\nG0 Z55.0\n";
    let rules = ValidationRules {
        part_length_anchor: PartLengthAnchor::Assignment,
        ..ValidationRules::default()
    };
    assert!(check_contents("9001.prg", text, &rules).issues.is_empty());
    assert_eq!(
        kinds("9001.prg", text),
        vec![IssueKind::PartLengthMismatch]
    );
}

#[test]
fn missing_subprograms_are_reported_in_order() {
    init_logging();
    let text = "O9001 (DS)\nG0 X0\n";
    assert_eq!(
        kinds("9001.prg", text),
        vec![
            IssueKind::MissingSubprogram0,
            IssueKind::MissingSubprogram1,
            IssueKind::MissingSubprogram2,
        ]
    );
}

#[test]
fn subprogram_markers_on_line_one_do_not_count() {
    init_logging();
    let text = "O9001 $0 $1 $2\nG0 X0\n";
    assert!(kinds("9001.prg", text).contains(&IssueKind::MissingSubprogram0));
}

#[test]
fn badly_formed_names_are_invalid() {
    init_logging();
    for name in ["abc.prg", "123.prg", "9001", "x9001.prg"] {
        assert!(
            kinds(name, &clean_ds("9001")).contains(&IssueKind::InvalidName),
            "{name} should be invalid"
        );
    }
    assert!(!kinds("9001A.PRG", &clean_ds("9001")).contains(&IssueKind::InvalidName));
}

#[test]
fn reserved_name_is_invalid_for_asc_programs() {
    init_logging();
    assert_eq!(kinds("4001.prg", &clean_asc("4001")), vec![IssueKind::InvalidName]);
    assert_eq!(kinds("4001.PRG", &clean_asc("4001")), vec![IssueKind::InvalidName]);
    assert_eq!(kinds("4001.prg", &clean_ds("4001")), vec![]);
}

#[test]
fn ug_values_are_required_for_asc_tloc_and_aot() {
    init_logging();
    for (first_line, case_type) in [
        ("O9001 (ASC)", CaseType::Asc),
        ("O9001 (T-L HOLDER)", CaseType::Tloc),
        ("O9001 (TLCS)", CaseType::Tloc),
        ("O9001 (AOT14)", CaseType::Aot),
    ] {
        let text = program(first_line, "10", "10", &UG_BLOCK[..3]);
        let verdict = check_contents("9001.prg", &text, &ValidationRules::default());
        assert_eq!(verdict.case_type, case_type);
        let found: Vec<_> = verdict.issues.kinds().collect();
        assert_eq!(found, vec![IssueKind::MissingUgValues], "{first_line}");
        let detail = verdict.issues.iter().next().and_then(|i| i.detail.clone());
        assert_eq!(detail.as_deref(), Some("missing #104, #105"));
    }

    let text = program("O9001 (DS)", "10", "10", &[]);
    assert_eq!(kinds("9001.prg", &text), vec![]);
}

#[test]
fn internal_program_number_must_match_file_name() {
    init_logging();
    assert_eq!(
        kinds("9001.prg", &clean_ds("9002")),
        vec![IssueKind::InternalNameMismatch]
    );
    assert_eq!(kinds("9001.prg", &clean_ds("09001")), vec![]);

    let text = program("%", "1", "1", &[]);
    assert_eq!(kinds("9001.prg", &text), vec![]);
    let text = format!("%\nO9003\n{}", program("", "1", "1", &[]));
    assert_eq!(kinds("9001.prg", &text), vec![IssueKind::InternalNameMismatch]);
}

#[test]
fn validator_reads_files_lossily() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("9001.prg");
    let mut bytes = clean_ds("9001").into_bytes();
    bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
    fs::write(&path, bytes).unwrap();

    let verdict = PrgValidator::default().validate(&path).unwrap();
    assert!(verdict.issues.is_empty());
}

#[test]
fn unreadable_file_is_an_io_error() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("9001.prg");
    let err = PrgValidator::default().validate(&missing).unwrap_err();
    match err {
        ValidateError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("expected a read error, got {other:?}"),
    }
}
