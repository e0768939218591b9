use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Map, Value};
use tracing::warn;

use super::model::{NodeId, NodeResponse, TraceRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedRecord {
    pub node_id: NodeId,
    pub reason: &'static str,
}

#[derive(Clone, Debug, Default)]
pub struct ParsedTrace {
    pub trace: TraceRecord,
    pub skipped: Vec<SkippedRecord>,
}

pub fn load_trace_file(path: &Path) -> Result<ParsedTrace> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read trace file {}", path.display()))?;
    parse_trace_payload(&raw).with_context(|| format!("failed to parse trace file {}", path.display()))
}

pub fn parse_trace_payload(raw: &str) -> Result<ParsedTrace> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in trace payload")?;
    parse_trace_value(&parsed)
}

pub fn parse_trace_value(value: &Value) -> Result<ParsedTrace> {
    let object = value
        .as_object()
        .ok_or_else(|| anyhow!("unexpected JSON type for trace payload"))?;

    if let Some(error) = object.get("error") {
        let message = error
            .as_str()
            .map(str::to_owned)
            .unwrap_or_else(|| error.to_string());
        bail!("trace endpoint returned an error: {message}");
    }

    let trace_object = match object.get("trace") {
        Some(inner) => inner
            .as_object()
            .ok_or_else(|| anyhow!("trace envelope does not hold a trace object"))?,
        None => object,
    };

    parse_trace_object(trace_object)
}

fn parse_trace_object(object: &Map<String, Value>) -> Result<ParsedTrace> {
    let origin = optional_node_id(object, "origin");
    let found_at = optional_node_id(object, "found_at");

    let mut parsed = ParsedTrace {
        trace: TraceRecord {
            origin,
            found_at,
            responses: Vec::new(),
        },
        skipped: Vec::new(),
    };

    let Some(responses) = object.get("responses") else {
        return Ok(parsed);
    };
    let responses = responses
        .as_object()
        .ok_or_else(|| anyhow!("trace responses must be an object keyed by node id"))?;

    for (node_id, entry) in responses {
        match parse_response(entry) {
            Ok(response) => parsed.trace.insert_response(node_id.clone(), response),
            Err(reason) => {
                warn!(node_id = %node_id, reason, "skipping malformed trace record");
                parsed.skipped.push(SkippedRecord {
                    node_id: node_id.clone(),
                    reason,
                });
            }
        }
    }

    Ok(parsed)
}

fn optional_node_id(object: &Map<String, Value>, key: &str) -> Option<NodeId> {
    object.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn parse_response(entry: &Value) -> Result<NodeResponse, &'static str> {
    let entry = entry.as_object().ok_or("record is not an object")?;

    let forwarded_to = entry
        .get("responded_with")
        .and_then(Value::as_array)
        .ok_or("responded_with is not a list")?
        .iter()
        .map(|target| target.as_str().map(str::to_owned))
        .collect::<Option<Vec<_>>>()
        .ok_or("responded_with holds a non-string node id")?;

    Ok(NodeResponse {
        timestamp_ms: entry.get("timestamp_ms").and_then(Value::as_u64),
        forwarded_to,
    })
}
