use outreach_core::{
    AppViewModel, BatchKind, BatchProgressView, Notice, Operation, Stage, TableSource, TableView,
};

/// Widest a table cell is printed before it is cut.
const MAX_CELL_WIDTH: usize = 32;
const PROGRESS_BAR_WIDTH: usize = 30;

pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();
    out.push_str(&header(view));
    out.push('\n');

    if view.stage == Stage::Compose {
        out.push_str(&format!("Subject: {}\n", view.compose.subject));
        out.push_str("Body:\n");
        for line in view.compose.body_template.lines() {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
    }

    if view.table.rows.is_empty() {
        out.push_str("(no rows)\n");
    } else {
        out.push_str(&render_table(&view.table));
    }

    if let Some(progress) = &view.progress {
        out.push_str(&progress_line(progress));
        out.push('\n');
    }
    if let Some(outcome) = &view.send_outcome {
        out.push_str(&format!("Result: {outcome}\n"));
    }
    out
}

fn header(view: &AppViewModel) -> String {
    let stage = match view.stage {
        Stage::SearchEdit => "1/3 Search and edit",
        Stage::Compose => "2/3 Compose",
        Stage::ReviewSend => "3/3 Review and send",
    };
    let source = match &view.source {
        TableSource::Empty => String::new(),
        TableSource::Search { query } => format!(" | results for \"{query}\""),
        TableSource::Pasted => " | pasted JSON".to_string(),
    };
    let busy = match view.busy {
        None => "",
        Some(Operation::Search) => " | searching...",
        Some(Operation::Persist) => " | saving...",
        Some(Operation::Generate) => " | generating...",
        Some(Operation::Send) => " | sending...",
    };
    format!("== {stage}{source}{busy} ==")
}

pub fn render_table(table: &TableView) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| fit(cell)).collect())
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let row_label_width = cells.len().to_string().len();

    let mut out = String::new();
    out.push_str(&" ".repeat(row_label_width));
    for (column, width) in table.columns.iter().zip(&widths) {
        out.push_str(&format!(" | {column:<width$}"));
    }
    out.push('\n');
    for (index, row) in cells.iter().enumerate() {
        out.push_str(&format!("{:>row_label_width$}", index + 1));
        for (cell, width) in row.iter().zip(&widths) {
            out.push_str(&format!(" | {cell:<width$}"));
        }
        out.push('\n');
    }
    out
}

/// One line, at most [`MAX_CELL_WIDTH`] chars.
fn fit(cell: &str) -> String {
    let flat = cell.replace(['\n', '\r'], " ");
    if flat.chars().count() <= MAX_CELL_WIDTH {
        return flat;
    }
    let mut cut: String = flat.chars().take(MAX_CELL_WIDTH - 3).collect();
    cut.push_str("...");
    cut
}

pub fn progress_line(progress: &BatchProgressView) -> String {
    let verb = match progress.kind {
        BatchKind::Persist => "Saving",
        BatchKind::Send => "Sending",
    };
    let filled = (progress.fraction() * PROGRESS_BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(PROGRESS_BAR_WIDTH);
    let mut line = format!(
        "{verb} [{}{}] {}/{}",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        progress.completed,
        progress.total
    );
    if progress.failures > 0 {
        line.push_str(&format!(" ({} failed)", progress.failures));
    }
    line
}

pub fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Success(text) => format!("[ok] {text}"),
        Notice::Warning(text) => format!("[warning] {text}"),
        Notice::Error(text) => format!("[error] {text}"),
    }
}
