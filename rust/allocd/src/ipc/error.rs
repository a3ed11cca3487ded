use serde_json::{Map, Value};

/// `{ id, ok, <key>: payload }`, the one line written back per request.
fn envelope(id: &str, ok: bool, key: &str, payload: Value) -> Value {
    let mut line = Map::new();
    line.insert("id".into(), Value::from(id));
    line.insert("ok".into(), Value::Bool(ok));
    line.insert(key.into(), payload);
    Value::Object(line)
}

pub fn ok(id: &str, result: Value) -> Value {
    envelope(id, true, "result", result)
}

/// `details` is left out of the body entirely when there are none.
pub fn err(id: &str, code: &str, message: impl Into<String>, details: Option<Value>) -> Value {
    let mut body = Map::new();
    body.insert("code".into(), Value::from(code));
    body.insert("message".into(), Value::String(message.into()));
    if let Some(d) = details {
        body.insert("details".into(), d);
    }
    envelope(id, false, "error", Value::Object(body))
}
