use serde_json::{json, Value};

use crate::record::{Cell, RawRecord, Record};

pub const EMAIL_ID: &str = "email_id";
pub const RECIPIENT_EMAIL: &str = "recipient_email";
pub const SUBJECT: &str = "subject";
pub const BODY: &str = "body";

/// Fields the send webhook requires on every draft.
pub const SEND_REQUIRED_FIELDS: &[&str] = &[EMAIL_ID, RECIPIENT_EMAIL, SUBJECT, BODY];

/// Declared renames between what the generation webhook returns and what the
/// send webhook expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    renames: Vec<(String, String)>,
}

impl FieldMapping {
    /// Generation answers with `recipient`, send wants `recipient_email`.
    pub fn draft_contract() -> Self {
        Self {
            renames: vec![("recipient".to_string(), RECIPIENT_EMAIL.to_string())],
        }
    }

    /// Renames fields in place, keeping their position. A rename is skipped
    /// when the target field is already present.
    pub fn apply(&self, raw: RawRecord) -> RawRecord {
        let active: Vec<&(String, String)> = self
            .renames
            .iter()
            .filter(|(from, to)| raw.contains_key(from) && !raw.contains_key(to))
            .collect();
        if active.is_empty() {
            return raw;
        }
        raw.into_iter()
            .map(|(field, value)| {
                match active.iter().find(|(from, _)| *from == field) {
                    Some((_, to)) => (to.clone(), value),
                    None => (field, value),
                }
            })
            .collect()
    }
}

/// One generated email, editable before sending.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmailDraft {
    fields: Record,
}

impl EmailDraft {
    pub fn from_raw(raw: RawRecord, mapping: &FieldMapping) -> Self {
        Self {
            fields: Record::from_raw(mapping.apply(raw)),
        }
    }

    pub fn fields(&self) -> &Record {
        &self.fields
    }

    pub fn email_id(&self) -> Option<&Cell> {
        self.fields.get(EMAIL_ID)
    }

    pub fn recipient_email(&self) -> String {
        self.text_of(RECIPIENT_EMAIL)
    }

    pub fn subject(&self) -> String {
        self.text_of(SUBJECT)
    }

    pub fn body(&self) -> String {
        self.text_of(BODY)
    }

    pub fn edit(&mut self, field: &str, input: &str) {
        self.fields.edit(field, input);
    }

    fn text_of(&self, field: &str) -> String {
        self.fields.get(field).map(Cell::display).unwrap_or_default()
    }
}

/// Body for one call to the send webhook: exactly the four contract fields.
pub fn send_payload(draft: &RawRecord) -> Value {
    let field = |name: &str| draft.get(name).cloned().unwrap_or(Value::Null);
    json!({
        EMAIL_ID: field(EMAIL_ID),
        RECIPIENT_EMAIL: field(RECIPIENT_EMAIL),
        SUBJECT: field(SUBJECT),
        BODY: field(BODY),
    })
}
