use prg_core::{AppViewModel, EngineStatus, IssueRowView, Severity};

/// Text screen for the current view: status, counters, then numbered issues.
pub fn render(view: &AppViewModel) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "PRG watch | {} | auto-gather {} | {} files tracked",
        status_label(&view.status),
        if view.auto_gather { "on" } else { "off" },
        view.tracked_files
    ));

    if let Some(pass) = &view.last_pass {
        lines.push(format!(
            "last pass #{}: {} added, {} changed, {} duplicates, {} removed, {} moved, {} skipped ({} ms)",
            pass.pass,
            pass.added,
            pass.replaced,
            pass.duplicates,
            pass.pruned,
            pass.moved,
            pass.skipped,
            pass.duration_ms
        ));
    }
    if let Some(gather) = &view.last_gather {
        lines.push(format!(
            "last gather: {} copied, {} up to date, {} failed",
            gather.copied, gather.up_to_date, gather.failed
        ));
    }
    if let Some(notice) = &view.notice {
        lines.push(format!("> {notice}"));
    }

    if view.rows.is_empty() {
        lines.push("no issues".to_string());
    } else {
        lines.push(format!("{} issues:", view.rows.len()));
        lines.extend(view.rows.iter().map(format_row));
    }

    lines.join("\n")
}

fn status_label(status: &EngineStatus) -> String {
    match status {
        EngineStatus::Starting => "starting".to_string(),
        EngineStatus::Watching => "watching".to_string(),
        EngineStatus::Unavailable(reason) => format!("unavailable ({reason})"),
        EngineStatus::Stopping => "stopping".to_string(),
        EngineStatus::Stopped => "stopped".to_string(),
    }
}

fn format_row(row: &IssueRowView) -> String {
    let mark = match row.severity {
        Severity::Error => "E",
        Severity::Warning => "W",
    };
    let mut text = format!(
        "{:>4}. [{mark}] {}  {}  {}",
        row.index + 1,
        row.file,
        row.location.display(),
        row.label
    );
    if let Some(detail) = &row.detail {
        text.push_str(&format!(" ({detail})"));
    }
    text
}
