use crate::Transport;
use serde_json::Value;
use sweep_core::{QueryOutcome, SN_NOT_FOUND};

const UNKNOWN_TRANSPORT_ERROR: &str = "Unknown connection error or connection issue.";

/// Turn one transport result into exactly one outcome. Pure; never panics on bad input.
pub fn classify(t: &Transport) -> QueryOutcome {
    match t {
        Transport::Unavailable { detail } => QueryOutcome::ToolingFailure(detail.clone()),
        Transport::Error { signal, detail } => {
            let detail = detail.trim();
            let detail = if detail.is_empty() { UNKNOWN_TRANSPORT_ERROR } else { detail };
            QueryOutcome::TransportFailure { signal: signal.clone(), detail: detail.to_string() }
        }
        Transport::Response { body, .. } => classify_body(body),
    }
}

fn classify_body(body: &str) -> QueryOutcome {
    let body = body.trim();
    if body.is_empty() {
        return QueryOutcome::EmptyResponse;
    }
    if !looks_like_json(body) {
        return QueryOutcome::MalformedResponse(body.to_string());
    }
    match serde_json::from_str::<Value>(body) {
        Ok(v) => QueryOutcome::Success(extract_serial(&v)),
        // bracketed but not JSON: downgrade instead of failing the batch
        Err(e) => {
            log::debug!("bracketed body failed to parse: {}", e);
            QueryOutcome::MalformedResponse(body.to_string())
        }
    }
}

/// Cheap syntactic check: `{...}` or `[...]`.
pub fn looks_like_json(s: &str) -> bool {
    (s.starts_with('{') && s.ends_with('}')) || (s.starts_with('[') && s.ends_with(']'))
}

/// Top-level `sn` of an object. Strings are taken verbatim; other values are spelled the way
/// the device tooling prints them (`None`, `True`, `{'k': 'v'}`).
pub fn extract_serial(v: &Value) -> String {
    match v.get("sn") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => scalar_text(other),
        None => SN_NOT_FOUND.to_string(),
    }
}

fn scalar_text(v: &Value) -> String {
    match v {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quoted(s),
        Value::Array(items) => format!("[{}]", items.iter().map(scalar_text).collect::<Vec<_>>().join(", ")),
        Value::Object(map) => {
            let fields = map.iter().map(|(k, v)| format!("{}: {}", quoted(k), scalar_text(v))).collect::<Vec<_>>();
            format!("{{{}}}", fields.join(", "))
        }
    }
}

/// Single quotes unless the text holds a single quote and no double quote.
fn quoted(s: &str) -> String {
    let q = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(q);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == q => { out.push('\\'); out.push(c); }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}
