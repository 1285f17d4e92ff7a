//! Recover a JSON object from raw generator output.
//!
//! Recovery is an ordered list of independent stages, each a pure function
//! from cleaned text to a parsed value. Stages run left to right and the first
//! success wins; the failure messages of every stage are kept for the error.

use super::extract::{balanced_object, brace_span, preprocess};
use super::repair::repair;
use super::schema::{validate_analysis, AnalysisResponse};
use crate::error::{preview, ParseError};
use serde_json::Value;

type Stage = fn(&str) -> Result<Value, String>;

/// Recovery stages in evaluation order. Input is the text from the first `{`
/// onwards, after fence and heading cleanup.
const STAGES: &[(&str, Stage)] = &[
    ("balanced", parse_balanced),
    ("balanced_repaired", parse_balanced_repaired),
    ("brace_span", parse_brace_span),
    ("brace_span_repaired", parse_brace_span_repaired),
    ("completed", parse_completed),
];

/// Parse raw generator text into a generic JSON object.
pub fn parse_json_response(raw: &str) -> Result<Value, ParseError> {
    let cleaned = preprocess(raw);
    let Some(start) = cleaned.find('{') else {
        tracing::warn!(len = raw.len(), "generator output contains no opening brace");
        return Err(ParseError::NoObject { preview: preview(raw) });
    };
    let from_brace = &cleaned[start..];

    let mut attempts = Vec::with_capacity(STAGES.len());
    for (name, stage) in STAGES {
        match stage(from_brace) {
            Ok(value) => {
                tracing::debug!(stage = name, failed_stages = attempts.len(), "recovered JSON");
                return Ok(value);
            }
            Err(reason) => attempts.push(format!("{name}: {reason}")),
        }
    }

    tracing::warn!(len = raw.len(), attempts = ?attempts, "could not recover JSON from generator output");
    Err(ParseError::Malformed { attempts, preview: preview(raw) })
}

/// Parse and validate raw generator text as an analysis response.
pub fn parse_and_validate_analysis_response(raw: &str) -> Result<AnalysisResponse, ParseError> {
    let value = parse_json_response(raw)?;
    validate_analysis(&value).map_err(|violations| {
        tracing::warn!(count = violations.len(), "generator output failed schema validation");
        ParseError::Schema { violations, preview: preview(raw) }
    })
}

fn parse_object(candidate: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err("top-level value is not an object".to_string()),
        Err(err) => Err(err.to_string()),
    }
}

fn parse_balanced(text: &str) -> Result<Value, String> {
    let candidate = balanced_object(text).ok_or("braces never balance")?;
    parse_object(candidate)
}

fn parse_balanced_repaired(text: &str) -> Result<Value, String> {
    // Comments can hide or add braces, so rebalance on the repaired text.
    let repaired = repair(text);
    let candidate = balanced_object(&repaired).ok_or("braces never balance after repair")?;
    parse_object(candidate)
}

fn parse_brace_span(text: &str) -> Result<Value, String> {
    let candidate = brace_span(text).ok_or("no closing brace")?;
    parse_object(candidate)
}

fn parse_brace_span_repaired(text: &str) -> Result<Value, String> {
    let candidate = brace_span(text).ok_or("no closing brace")?;
    parse_object(&repair(candidate))
}

fn parse_completed(text: &str) -> Result<Value, String> {
    parse_object(&complete_truncated(&repair(text)))
}

struct Frame {
    closer: u8,
    awaiting_value: bool,
}

fn closers(frames: &[Frame]) -> String {
    frames.iter().rev().map(|frame| frame.closer as char).collect()
}

/// Close whatever a cut-off response left open.
///
/// The text is cut back to the last point where a value was complete (a
/// dangling key, separator, or half-written literal is dropped), an
/// unterminated string value is closed, and every open array and object is
/// closed in reverse order. Anything after the outermost object closes is
/// discarded.
pub fn complete_truncated(text: &str) -> String {
    let mut frames: Vec<Frame> = Vec::new();
    let mut safe_end = 0usize;
    let mut safe_closers = String::new();
    let mut in_string = false;
    let mut string_is_key = false;
    let mut escaped = false;
    let mut scalar_start: Option<usize> = None;

    for (idx, byte) in text.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
                if !string_is_key {
                    safe_end = idx + 1;
                    safe_closers = closers(&frames);
                }
            }
            continue;
        }
        if scalar_start.is_some() {
            if !matches!(byte, b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r') {
                continue;
            }
            scalar_start = None;
            safe_end = idx;
            safe_closers = closers(&frames);
        }
        match byte {
            b'"' => {
                in_string = true;
                string_is_key = frames
                    .last()
                    .is_some_and(|frame| frame.closer == b'}' && !frame.awaiting_value);
            }
            b'{' | b'[' => {
                let closer = if byte == b'{' { b'}' } else { b']' };
                frames.push(Frame { closer, awaiting_value: closer == b']' });
                safe_end = idx + 1;
                safe_closers = closers(&frames);
            }
            b'}' | b']' => {
                frames.pop();
                if frames.is_empty() {
                    return text[..=idx].to_string();
                }
                safe_end = idx + 1;
                safe_closers = closers(&frames);
            }
            b':' => {
                if let Some(frame) = frames.last_mut() {
                    frame.awaiting_value = true;
                }
            }
            b',' => {
                if let Some(frame) = frames.last_mut() {
                    frame.awaiting_value = frame.closer == b']';
                }
            }
            b' ' | b'\t' | b'\n' | b'\r' => {}
            _ if !frames.is_empty() => scalar_start = Some(idx),
            _ => {}
        }
    }

    if frames.is_empty() {
        return text.to_string();
    }
    if in_string && !string_is_key {
        let mut completed = text.to_string();
        if escaped {
            completed.pop();
        }
        completed.push('"');
        completed.push_str(&closers(&frames));
        return completed;
    }
    if let Some(start) = scalar_start {
        if serde_json::from_str::<Value>(&text[start..]).is_ok() {
            return format!("{text}{}", closers(&frames));
        }
    }
    format!("{}{safe_closers}", &text[..safe_end])
}
