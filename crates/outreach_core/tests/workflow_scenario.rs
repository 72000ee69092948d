use outreach_core::{
    update, AppState, BatchKind, BatchSummary, Effect, Msg, RawRecord, RowResult, Stage,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn raw(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn all_ok(kind: BatchKind, total: usize) -> BatchSummary {
    BatchSummary {
        kind,
        results: (0..total)
            .map(|index| RowResult {
                index,
                ok: true,
                detail: None,
            })
            .collect(),
    }
}

fn report_progress(mut state: AppState, kind: BatchKind, total: usize) -> AppState {
    for index in 0..total {
        let (next, effects) = update(
            state,
            Msg::BatchProgress {
                kind,
                index,
                total,
                ok: true,
            },
        );
        assert!(effects.is_empty());
        state = next;
    }
    state
}

#[test]
fn search_edit_save_compose_review_send() {
    outreach_logging::initialize_for_tests();

    // Search returns three records.
    let (state, effects) = update(AppState::new(), Msg::SearchSubmitted("dentists".to_string()));
    assert_eq!(
        effects,
        vec![Effect::Search {
            query: "dentists".to_string()
        }]
    );
    let records: Vec<RawRecord> = (1..=3)
        .map(|n| {
            raw(json!({
                "id": format!("id-{n}"),
                "s_no": n,
                "name": format!("Dental {n}"),
                "phone": null,
                "timestamp": "2024-01-05T10:00:00",
            }))
        })
        .collect();
    let (state, _) = update(
        state,
        Msg::SearchCompleted {
            query: "dentists".to_string(),
            result: Ok(records),
        },
    );
    assert_eq!(state.stage(), Stage::SearchEdit);
    assert_eq!(state.records().len(), 3);

    // Edit one field on record 2.
    let (state, _) = update(
        state,
        Msg::CellEdited {
            row: 1,
            field: "phone".to_string(),
            value: "+92 300 1234567".to_string(),
        },
    );

    // Persistence succeeds for all three.
    let (state, effects) = update(state, Msg::SaveClicked);
    let rows = match &effects[..] {
        [Effect::PersistRecords { rows }] => rows.clone(),
        other => panic!("unexpected effects {other:?}"),
    };
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["phone"], json!("+92 300 1234567"));
    assert_eq!(rows[0]["phone"], Value::Null);
    assert_eq!(rows[0]["timestamp"], json!("2024-01-05T10:00:00.000Z"));

    let state = report_progress(state, BatchKind::Persist, 3);
    assert_eq!(state.view().progress.map(|p| p.completed), Some(3));
    let (state, _) = update(state, Msg::PersistCompleted(all_ok(BatchKind::Persist, 3)));
    assert_eq!(state.stage(), Stage::Compose);

    // Generation returns three drafts.
    let (state, _) = update(
        state,
        Msg::ComposeEdited {
            subject: "Partnership".to_string(),
            body_template: "Hello {name}".to_string(),
        },
    );
    let (state, effects) = update(state, Msg::GenerateClicked);
    match &effects[..] {
        [Effect::GenerateDrafts {
            subject,
            body_template,
            records,
        }] => {
            assert_eq!(subject, "Partnership");
            assert_eq!(body_template, "Hello {name}");
            assert_eq!(records.len(), 3);
        }
        other => panic!("unexpected effects {other:?}"),
    }
    let drafts: Vec<RawRecord> = (1..=3)
        .map(|n| {
            raw(json!({
                "email_id": n,
                "recipient": format!("owner{n}@example.com"),
                "subject": "Partnership",
                "body": format!("Hello Dental {n}"),
            }))
        })
        .collect();
    let (state, _) = update(state, Msg::DraftsGenerated(Ok(drafts)));
    assert_eq!(state.stage(), Stage::ReviewSend);
    assert_eq!(state.drafts()[2].recipient_email(), "owner3@example.com");
    assert_eq!(
        state.view().table.columns,
        vec!["email_id", "recipient_email", "subject", "body"]
    );

    // Send succeeds for all three.
    let (state, effects) = update(state, Msg::SendClicked);
    assert!(matches!(&effects[..], [Effect::SendDrafts { drafts }] if drafts.len() == 3));
    let state = report_progress(state, BatchKind::Send, 3);
    let (state, _) = update(state, Msg::SendCompleted(all_ok(BatchKind::Send, 3)));

    assert_eq!(state.stage(), Stage::ReviewSend);
    assert_eq!(state.view().send_outcome.as_deref(), Some("3/3 sent"));
}
