use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

/// A record as it travels over the wire: one JSON object.
pub type RawRecord = Map<String, Value>;

/// Field left blank by the lookup backend when no address was found.
pub const EMAILS_FIELD: &str = "emails";

/// Fields the persistence webhook needs to locate a row.
pub const PERSIST_REQUIRED_FIELDS: &[&str] = &["id", "s_no", "name"];

/// Action tag the persistence webhook dispatches on.
pub const PERSIST_ACTION: &str = "update task";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(Value),
    Timestamp(DateTime<Utc>),
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Cell::Value(Value::String(text.into()))
    }

    pub fn null() -> Self {
        Cell::Value(Value::Null)
    }

    /// Wire form of the cell. Timestamps are written back as RFC 3339 with
    /// millisecond precision and a `Z` suffix.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Value(value) => value.clone(),
            Cell::Timestamp(ts) => Value::String(format_timestamp(ts)),
        }
    }

    /// Text shown in the table.
    pub fn display(&self) -> String {
        match self {
            Cell::Value(Value::Null) => String::new(),
            Cell::Value(Value::String(text)) => text.clone(),
            Cell::Value(other) => other.to_string(),
            Cell::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Value(Value::Null))
    }
}

/// One editable row. Field order is the order the backend sent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    cells: Vec<(String, Cell)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a raw object without any type conversion.
    pub fn from_raw(raw: RawRecord) -> Self {
        Self {
            cells: raw
                .into_iter()
                .map(|(field, value)| (field, Cell::Value(value)))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, cell)| cell)
    }

    /// Replaces the cell for `field`, appending it when the field is new.
    pub fn set(&mut self, field: &str, cell: Cell) {
        match self.cells.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => *slot = cell,
            None => self.cells.push((field.to_string(), cell)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn to_json(&self) -> RawRecord {
        self.cells
            .iter()
            .map(|(name, cell)| (name.clone(), cell.to_json()))
            .collect()
    }

    /// Applies user input to `field`, coerced by the kind of the current cell.
    pub fn edit(&mut self, field: &str, input: &str) {
        let cell = coerce_input(self.get(field), input);
        self.set(field, cell);
    }

    /// Like [`Record::edit`], but a null or absent cell is coerced by
    /// `sample`, a cell from the same column in another row.
    pub fn edit_like(&mut self, field: &str, input: &str, sample: Option<&Cell>) {
        let current = self.get(field).filter(|cell| !cell.is_null()).or(sample);
        let cell = coerce_input(current, input);
        self.set(field, cell);
    }

    /// Required fields that are absent or null, in the order asked.
    pub fn missing_fields(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|field| self.get(field).map_or(true, Cell::is_null))
            .map(|field| field.to_string())
            .collect()
    }
}

/// Prepares a record from the lookup backend for the table editor.
///
/// String values that read as date-times become structured timestamps; a null
/// `emails` value becomes an empty string. Everything else, including strings
/// that fail to parse, passes through untouched.
pub fn preprocess_record(raw: RawRecord) -> Record {
    let cells = raw
        .into_iter()
        .map(|(field, value)| {
            let cell = match value {
                Value::String(text) => match parse_timestamp(&text) {
                    Some(ts) => Cell::Timestamp(ts),
                    None => Cell::Value(Value::String(text)),
                },
                Value::Null if field == EMAILS_FIELD => Cell::text(""),
                other => Cell::Value(other),
            };
            (field, cell)
        })
        .collect();
    Record { cells }
}

/// Parses RFC 3339 or naive ISO-8601 date-times. Naive values are taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// First non-null cell of `field` in any row other than `row`.
pub fn column_sample(records: &[Record], row: usize, field: &str) -> Option<Cell> {
    records
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != row)
        .find_map(|(_, record)| record.get(field).filter(|cell| !cell.is_null()))
        .cloned()
}

/// Converts typed text into a cell of the same kind as `current`.
///
/// Input that does not fit the current kind is kept as text; blank input on a
/// non-text cell clears it to null.
pub fn coerce_input(current: Option<&Cell>, input: &str) -> Cell {
    let trimmed = input.trim();
    match current {
        Some(Cell::Value(Value::String(_))) => Cell::text(input),
        _ if trimmed.is_empty() => Cell::null(),
        Some(Cell::Timestamp(_)) => match parse_timestamp(trimmed) {
            Some(ts) => Cell::Timestamp(ts),
            None => Cell::text(input),
        },
        Some(Cell::Value(Value::Number(_))) => match parse_number(trimmed) {
            Some(number) => Cell::Value(Value::Number(number)),
            None => Cell::text(input),
        },
        Some(Cell::Value(Value::Bool(_))) => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Cell::Value(Value::Bool(true)),
            "false" => Cell::Value(Value::Bool(false)),
            _ => Cell::text(input),
        },
        _ => Cell::text(input),
    }
}

/// Body for one call to the persistence webhook: the action tag followed by
/// every field of the row. A row field named `action` is overridden.
pub fn persist_payload(row: &RawRecord) -> Value {
    let mut payload = RawRecord::new();
    payload.insert("action".to_string(), Value::String(PERSIST_ACTION.to_string()));
    for (field, value) in row {
        if field != "action" {
            payload.insert(field.clone(), value.clone());
        }
    }
    Value::Object(payload)
}

fn parse_number(text: &str) -> Option<Number> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(Number::from(int));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

/// A row that cannot be sent because required fields are missing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("row {row_number} is missing required field(s): {}", .fields.join(", "))]
pub struct ValidationError {
    /// 1-based, as shown in the table.
    pub row_number: usize,
    pub fields: Vec<String>,
}

/// Checks every row before a batch is started.
pub fn validate_required<'a>(
    rows: impl IntoIterator<Item = &'a Record>,
    required: &[&str],
) -> Result<(), Vec<ValidationError>> {
    let errors: Vec<ValidationError> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let fields = row.missing_fields(required);
            (!fields.is_empty()).then(|| ValidationError {
                row_number: index + 1,
                fields,
            })
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonInputError {
    #[error("invalid JSON: {0}")]
    Invalid(String),
    #[error("the JSON is a single object; paste a JSON array (starts with '[')")]
    SingleObject,
    #[error("the JSON array is empty")]
    Empty,
    #[error("expected a JSON array of objects")]
    NotAnArray,
    #[error("element {index} of the array is not an object")]
    NotAnObject { index: usize },
}

/// Parses pasted or loaded JSON into raw records.
pub fn parse_records_json(text: &str) -> Result<Vec<RawRecord>, JsonInputError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| JsonInputError::Invalid(err.to_string()))?;
    match value {
        Value::Array(items) if items.is_empty() => Err(JsonInputError::Empty),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Ok(map),
                _ => Err(JsonInputError::NotAnObject { index }),
            })
            .collect(),
        Value::Object(_) => Err(JsonInputError::SingleObject),
        _ => Err(JsonInputError::NotAnArray),
    }
}
