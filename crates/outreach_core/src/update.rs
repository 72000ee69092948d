use crate::draft::{EmailDraft, FieldMapping, SEND_REQUIRED_FIELDS};
use crate::record::{
    column_sample, parse_records_json, preprocess_record, validate_required, Cell, RawRecord, Record,
    ValidationError, PERSIST_REQUIRED_FIELDS,
};
use crate::view_model::{column_order, BatchProgressView, RECORD_COLUMNS};
use crate::{
    AppState, BatchKind, BatchSummary, ComposeForm, Effect, ExportFormat, Msg, Notice, Operation,
    Stage, TableSource,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    // One operation at a time; user input waits until the shell reports back.
    if state.pending().is_some() && is_user_action(&msg) {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::SearchSubmitted(query) => {
            let query = query.trim().to_string();
            if query.is_empty() {
                state.notify(Notice::Warning("Please enter a search query.".to_string()));
                Vec::new()
            } else {
                state.begin(Operation::Search);
                vec![Effect::Search { query }]
            }
        }
        Msg::SearchCompleted { query, result } => {
            if state.pending() == Some(Operation::Search) {
                state.finish();
                match result {
                    Ok(rows) if rows.is_empty() => state.notify(Notice::Warning(
                        "Search succeeded but returned no records.".to_string(),
                    )),
                    Ok(rows) => {
                        let count = rows.len();
                        load_table(&mut state, TableSource::Search { query }, rows);
                        state.notify(Notice::Success(format!(
                            "Search successful! {count} record(s) received."
                        )));
                    }
                    Err(err) => state.notify(Notice::Error(format!("Search failed: {err}"))),
                }
            }
            Vec::new()
        }
        Msg::JsonPasted(text) => {
            match parse_records_json(&text) {
                Ok(rows) => {
                    let count = rows.len();
                    load_table(&mut state, TableSource::Pasted, rows);
                    state.notify(Notice::Success(format!(
                        "Successfully loaded {count} record(s)."
                    )));
                }
                Err(err) => state.notify(Notice::Error(err.to_string())),
            }
            Vec::new()
        }
        Msg::CellEdited { row, field, value } => {
            edit_cell(&mut state, row, field.trim(), &value);
            Vec::new()
        }
        Msg::RowAdded => {
            if state.stage() == Stage::SearchEdit {
                let columns = column_order(state.records().iter(), RECORD_COLUMNS);
                let mut record = Record::new();
                for column in &columns {
                    record.set(column, Cell::null());
                }
                state.records_mut().push(record);
            }
            Vec::new()
        }
        Msg::RowRemoved(row) => {
            if state.stage() == Stage::SearchEdit {
                if row < state.records().len() {
                    state.records_mut().remove(row);
                } else {
                    state.notify(no_such_row(row));
                }
            }
            Vec::new()
        }
        Msg::SaveClicked => save(&mut state),
        Msg::BatchProgress {
            kind,
            index,
            total,
            ok,
        } => {
            if state.pending() == Some(operation_for(kind)) {
                let failures = state.progress().map_or(0, |progress| progress.failures);
                state.set_progress(BatchProgressView {
                    kind,
                    completed: index + 1,
                    total,
                    failures: failures + usize::from(!ok),
                });
            }
            Vec::new()
        }
        Msg::PersistCompleted(summary) => {
            if state.pending() == Some(Operation::Persist) {
                state.finish();
                report_batch(&mut state, &summary, "saved", "records");
                if summary.all_succeeded() && state.stage() == Stage::SearchEdit {
                    state.set_stage(Stage::Compose);
                }
            }
            Vec::new()
        }
        Msg::ComposeEdited {
            subject,
            body_template,
        } => {
            if state.stage() == Stage::Compose {
                state.set_compose(ComposeForm {
                    subject,
                    body_template,
                });
            }
            Vec::new()
        }
        Msg::GenerateClicked => generate(&mut state),
        Msg::DraftsGenerated(result) => {
            if state.pending() == Some(Operation::Generate) {
                state.finish();
                match result {
                    Ok(rows) if rows.is_empty() => state.notify(Notice::Error(
                        "Email generation returned no drafts.".to_string(),
                    )),
                    Ok(rows) => {
                        let mapping = FieldMapping::draft_contract();
                        let drafts: Vec<EmailDraft> = rows
                            .into_iter()
                            .map(|raw| EmailDraft::from_raw(raw, &mapping))
                            .collect();
                        let count = drafts.len();
                        state.set_drafts(drafts);
                        state.set_stage(Stage::ReviewSend);
                        state.notify(Notice::Success(format!(
                            "{count} email preview(s) generated."
                        )));
                    }
                    Err(err) => {
                        state.notify(Notice::Error(format!("Email generation failed: {err}")))
                    }
                }
            }
            Vec::new()
        }
        Msg::SendClicked => send(&mut state),
        Msg::SendCompleted(summary) => {
            if state.pending() == Some(Operation::Send) {
                state.finish();
                report_batch(&mut state, &summary, "sent", "emails");
                state.set_last_send(summary);
            }
            Vec::new()
        }
        Msg::ExportRequested(format) => export(&mut state, format),
        Msg::ExportCompleted(result) => {
            match result {
                Ok(path) => state.notify(Notice::Success(format!("Exported to {path}."))),
                Err(err) => state.notify(Notice::Error(format!("Export failed: {err}"))),
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn is_user_action(msg: &Msg) -> bool {
    matches!(
        msg,
        Msg::SearchSubmitted(_)
            | Msg::JsonPasted(_)
            | Msg::CellEdited { .. }
            | Msg::RowAdded
            | Msg::RowRemoved(_)
            | Msg::SaveClicked
            | Msg::ComposeEdited { .. }
            | Msg::GenerateClicked
            | Msg::SendClicked
    )
}

fn operation_for(kind: BatchKind) -> Operation {
    match kind {
        BatchKind::Persist => Operation::Persist,
        BatchKind::Send => Operation::Send,
    }
}

fn load_table(state: &mut AppState, source: TableSource, rows: Vec<RawRecord>) {
    let records = rows.into_iter().map(preprocess_record).collect();
    state.reset_table(source, records);
}

fn edit_cell(state: &mut AppState, row: usize, field: &str, value: &str) {
    if field.is_empty() {
        state.notify(Notice::Warning("Name the column to edit.".to_string()));
        return;
    }
    match state.stage() {
        Stage::SearchEdit => {
            let sample = column_sample(state.records(), row, field);
            match state.records_mut().get_mut(row) {
                Some(record) => record.edit_like(field, value, sample.as_ref()),
                None => state.notify(no_such_row(row)),
            }
        }
        Stage::Compose => state.notify(Notice::Warning(
            "Records are saved; start a new search to edit them again.".to_string(),
        )),
        Stage::ReviewSend => match state.drafts_mut().get_mut(row) {
            Some(draft) => draft.edit(field, value),
            None => state.notify(no_such_row(row)),
        },
    }
}

fn save(state: &mut AppState) -> Vec<Effect> {
    if state.stage() != Stage::SearchEdit {
        return Vec::new();
    }
    if state.records().is_empty() {
        state.notify(Notice::Warning(
            "No data to save. Please perform a search first.".to_string(),
        ));
        return Vec::new();
    }
    if let Err(errors) = validate_required(state.records(), PERSIST_REQUIRED_FIELDS) {
        reject(state, "save", errors);
        return Vec::new();
    }
    let rows = state.records().iter().map(Record::to_json).collect();
    state.begin(Operation::Persist);
    vec![Effect::PersistRecords { rows }]
}

fn generate(state: &mut AppState) -> Vec<Effect> {
    if state.stage() != Stage::Compose {
        return Vec::new();
    }
    let ComposeForm {
        subject,
        body_template,
    } = state.compose().clone();
    if subject.trim().is_empty() || body_template.trim().is_empty() {
        state.notify(Notice::Error("Subject and Body cannot be empty.".to_string()));
        return Vec::new();
    }
    let records = state.records().iter().map(Record::to_json).collect();
    state.begin(Operation::Generate);
    vec![Effect::GenerateDrafts {
        subject,
        body_template,
        records,
    }]
}

fn send(state: &mut AppState) -> Vec<Effect> {
    if state.stage() != Stage::ReviewSend {
        return Vec::new();
    }
    if state.drafts().is_empty() {
        state.notify(Notice::Warning("No emails to send.".to_string()));
        return Vec::new();
    }
    let fields = state.drafts().iter().map(EmailDraft::fields);
    if let Err(errors) = validate_required(fields, SEND_REQUIRED_FIELDS) {
        reject(state, "send", errors);
        return Vec::new();
    }
    let drafts = state
        .drafts()
        .iter()
        .map(|draft| draft.fields().to_json())
        .collect();
    state.begin(Operation::Send);
    vec![Effect::SendDrafts { drafts }]
}

fn export(state: &mut AppState, format: ExportFormat) -> Vec<Effect> {
    let rows: Vec<RawRecord> = match state.stage() {
        Stage::SearchEdit | Stage::Compose => {
            state.records().iter().map(Record::to_json).collect()
        }
        Stage::ReviewSend => state
            .drafts()
            .iter()
            .map(|draft| draft.fields().to_json())
            .collect(),
    };
    if rows.is_empty() {
        state.notify(Notice::Warning("Nothing to export yet.".to_string()));
        return Vec::new();
    }
    let file_stem = match (state.stage(), state.source()) {
        (Stage::ReviewSend, _) => "final_emails".to_string(),
        (_, TableSource::Search { query }) => format!("{}_edited", query.replace(' ', "_")),
        (_, TableSource::Pasted) => "json_tester_edited".to_string(),
        (_, TableSource::Empty) => "records".to_string(),
    };
    vec![Effect::Export {
        format,
        file_stem,
        rows,
    }]
}

fn reject(state: &mut AppState, action: &str, errors: Vec<ValidationError>) {
    state.notify(Notice::Error(format!(
        "Cannot {action}: {} row(s) are missing required fields.",
        errors.len()
    )));
    for err in errors {
        state.notify(Notice::Error(err.to_string()));
    }
}

fn report_batch(state: &mut AppState, summary: &BatchSummary, verb: &str, noun: &str) {
    if summary.all_succeeded() {
        state.notify(Notice::Success(format!(
            "All {} {noun} were {verb} successfully.",
            summary.total()
        )));
        return;
    }
    state.notify(Notice::Warning(format!(
        "{} of {} {noun} {verb}, {} failed.",
        summary.succeeded(),
        summary.total(),
        summary.failed()
    )));
    let details: Vec<String> = summary
        .failures()
        .map(|result| {
            format!(
                "Row {}: {}",
                result.index + 1,
                result.detail.as_deref().unwrap_or("failed")
            )
        })
        .collect();
    for detail in details {
        state.notify(Notice::Error(detail));
    }
}

fn no_such_row(row: usize) -> Notice {
    Notice::Warning(format!("There is no row {}.", row + 1))
}
