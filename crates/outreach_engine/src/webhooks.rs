use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::client::WebhookClient;
use crate::{ClientError, JsonObject};

/// Full URLs of the four collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub search: String,
    pub persist: String,
    pub generate: String,
    pub send: String,
}

impl Endpoints {
    pub fn from_base(base_url: &str, search: &str, persist: &str, generate: &str, send: &str) -> Self {
        Self {
            search: join_url(base_url, search),
            persist: join_url(base_url, persist),
            generate: join_url(base_url, generate),
            send: join_url(base_url, send),
        }
    }
}

/// Joins with exactly one `/`. An absolute `path` is used as is.
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub fn search_payload(query: &str) -> Value {
    json!({
        "query": query,
        "requestId": format!("req-{}", Uuid::new_v4()),
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}

pub fn generate_payload(subject: &str, body_template: &str, records: &[JsonObject]) -> Value {
    json!({
        "subject": subject,
        "body_template": body_template,
        "records": records,
    })
}

/// Looks up records matching `query`.
pub async fn search(
    client: &dyn WebhookClient,
    url: &str,
    query: &str,
) -> Result<Vec<JsonObject>, ClientError> {
    let body = client.post_json(url, &search_payload(query)).await?;
    expect_object_array(body)
}

/// Asks the generation webhook for one draft per record.
pub async fn generate_drafts(
    client: &dyn WebhookClient,
    url: &str,
    subject: &str,
    body_template: &str,
    records: &[JsonObject],
) -> Result<Vec<JsonObject>, ClientError> {
    let payload = generate_payload(subject, body_template, records);
    let body = client.post_json(url, &payload).await?;
    expect_object_array(body)
}

pub fn expect_object_array(body: Value) -> Result<Vec<JsonObject>, ClientError> {
    let items = match body {
        Value::Array(items) => items,
        other => {
            return Err(ClientError::MalformedResponse(format!(
                "expected a JSON array of objects, got {}",
                kind_of(&other)
            )))
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(ClientError::MalformedResponse(format!(
                "element {index} is {}, expected an object",
                kind_of(&other)
            ))),
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
