use std::fs;

use outreach_engine::{csv_document, export_csv, export_json, ExportError, JsonObject};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

fn rows(values: Value) -> Vec<JsonObject> {
    values
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row.as_object().cloned().unwrap())
        .collect()
}

#[test]
fn csv_header_is_union_in_first_seen_order() {
    let doc = csv_document(&rows(json!([
        {"id": "a", "name": "Crust, Ltd"},
        {"id": "b", "rating": 4.5, "emails": null}
    ])));
    assert_eq!(
        doc,
        "id,name,rating,emails\r\na,\"Crust, Ltd\",,\r\nb,,4.5,\r\n"
    );
}

#[test]
fn csv_export_lands_in_export_dir() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("exports");

    let summary = export_csv(&dir, "bakeries in Lahore_edited", &rows(json!([{"id": "a"}]))).unwrap();

    assert_eq!(summary.row_count, 1);
    assert_eq!(summary.path, dir.join("bakeries_in_Lahore_edited.csv"));
    assert_eq!(fs::read_to_string(&summary.path).unwrap(), "id\r\na\r\n");
}

#[test]
fn json_export_is_pretty_and_replaces_previous_file() {
    let temp = TempDir::new().unwrap();
    let first = export_json(temp.path(), "final_emails", &rows(json!([{"email_id": "e1"}]))).unwrap();
    let second = export_json(temp.path(), "final_emails", &rows(json!([{"email_id": "e2"}]))).unwrap();

    assert_eq!(first.path, second.path);
    let written: Value = serde_json::from_str(&fs::read_to_string(&second.path).unwrap()).unwrap();
    assert_eq!(written, json!([{"email_id": "e2"}]));
}

#[test]
fn creates_missing_export_dir() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("nested").join("out");

    let summary = export_json(&dir, "records", &rows(json!([{"id": "a"}]))).unwrap();

    assert!(dir.is_dir());
    assert_eq!(summary.path, dir.join("records.json"));
}

#[test]
fn file_in_place_of_dir_is_an_error() {
    let temp = TempDir::new().unwrap();
    let not_dir = temp.path().join("not_a_dir");
    fs::write(&not_dir, "x").unwrap();

    let err = export_csv(&not_dir, "final_emails", &rows(json!([{"id": "a"}]))).unwrap_err();

    assert!(matches!(err, ExportError::Folder { ref path, .. } if path == &not_dir));
    assert!(!not_dir.with_file_name("final_emails.csv").exists());
    assert_eq!(fs::read_to_string(&not_dir).unwrap(), "x");
}

#[test]
fn export_leaves_no_temp_files_behind() {
    let temp = TempDir::new().unwrap();
    export_csv(temp.path(), "records", &rows(json!([{"id": "a"}]))).unwrap();
    export_csv(temp.path(), "records", &rows(json!([{"id": "b"}]))).unwrap();

    let names: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["records.csv".to_string()]);
}
