//! Structured output repair.
//!
//! In structured-output mode the caller must always receive a payload wrapped
//! in the sentinel tags. The repairer tries a fixed chain of extraction steps,
//! each yielding a candidate or nothing, and the first validated candidate
//! wins:
//!
//! 1. an existing well-formed sentinel pair
//! 2. an object literal carrying the agent schema (`thought` + `action`)
//! 3. the span from the first `{` to the last `}`
//! 4. that span run through `jsonrepair` (feature `json-repair`)
//!
//! When every step comes up empty the span from step 3 is wrapped unvalidated,
//! or the whole text when there is no span. That last result is degraded.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::normalize::StructuredOutputMarkers;

static THOUGHT_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""thought"\s*:"#).expect("thought key pattern is valid")
});

/// Most enclosing objects tried per `"thought"` key.
const MAX_ENCLOSING: usize = 16;

/// The step that produced a repaired payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStep {
    SentinelPair,
    AgentSchema,
    BraceSpan,
    #[cfg(feature = "json-repair")]
    JsonRepair,
    /// Brace span wrapped without passing validation.
    DegradedBraceSpan,
    /// No brace span at all; the input text wrapped verbatim.
    DegradedVerbatim,
}

impl RepairStep {
    pub fn is_degraded(self) -> bool {
        matches!(self, Self::DegradedBraceSpan | Self::DegradedVerbatim)
    }
}

/// Sentinel-wrapped output of [`repair`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repaired {
    pub text: String,
    pub step: RepairStep,
}

type StepFn = fn(&str, &StructuredOutputMarkers) -> Option<String>;

const STEPS: &[(RepairStep, StepFn)] = &[
    (RepairStep::SentinelPair, sentinel_pair),
    (RepairStep::AgentSchema, agent_schema),
    (RepairStep::BraceSpan, brace_span_validated),
    #[cfg(feature = "json-repair")]
    (RepairStep::JsonRepair, brace_span_repaired),
];

/// Produce a sentinel-wrapped payload from `text`. Never fails.
pub fn repair(text: &str, markers: &StructuredOutputMarkers) -> Repaired {
    let validated = STEPS
        .iter()
        .find_map(|(step, run)| run(text, markers).map(|payload| (*step, payload)));

    if let Some((step, payload)) = validated {
        tracing::debug!(step = ?step, "structured output validated");
        return Repaired {
            text: markers.wrap(&payload),
            step,
        };
    }

    let (step, payload) = match brace_span(text) {
        Some(span) => (RepairStep::DegradedBraceSpan, span),
        None => (RepairStep::DegradedVerbatim, text),
    };
    tracing::warn!(
        step = ?step,
        text_len = text.len(),
        "structured output could not be validated, returning degraded payload"
    );
    Repaired {
        text: markers.wrap(payload),
        step,
    }
}

/// A candidate is valid when it parses as a JSON object.
fn is_json_object(candidate: &str) -> bool {
    serde_json::from_str::<Value>(candidate).is_ok_and(|v| v.is_object())
}

fn sentinel_pair(text: &str, markers: &StructuredOutputMarkers) -> Option<String> {
    let open = text.find(&markers.sentinel_open)?;
    let inner_start = open + markers.sentinel_open.len();
    let inner_len = text[inner_start..].find(&markers.sentinel_close)?;
    let inner = text[inner_start..inner_start + inner_len].trim();
    is_json_object(inner).then(|| inner.to_string())
}

fn agent_schema(text: &str, _markers: &StructuredOutputMarkers) -> Option<String> {
    let anchors: Vec<usize> = THOUGHT_KEY.find_iter(text).map(|m| m.start()).collect();
    if anchors.is_empty() {
        return None;
    }

    let scan = BraceScan::new(text, &anchors);
    let mut tried = HashSet::new();
    scan.enclosing
        .iter()
        .flatten()
        .filter(|&&start| tried.insert(start))
        .find_map(|start| {
            let end = *scan.closers.get(start)?;
            let candidate = &text[*start..=end];
            is_agent_object(candidate).then(|| candidate.to_string())
        })
}

fn is_agent_object(candidate: &str) -> bool {
    // A JSON object opens with a key or closes immediately.
    if !candidate[1..].trim_start().starts_with(['"', '}']) {
        return false;
    }
    serde_json::from_str::<Value>(candidate).is_ok_and(|v| {
        v.as_object()
            .is_some_and(|obj| obj.contains_key("thought") && obj.contains_key("action"))
    })
}

/// Brace structure of a text, built in one pass.
///
/// Quotes only open a string inside a brace, so apostrophes and quoted prose
/// around the payload do not derail the scan.
struct BraceScan {
    /// Closing index for every balanced opening brace.
    closers: HashMap<usize, usize>,
    /// Per anchor, in anchor order: the open braces around it, innermost
    /// first, at most [`MAX_ENCLOSING`] of them.
    enclosing: Vec<Vec<usize>>,
}

impl BraceScan {
    fn new(text: &str, anchors: &[usize]) -> Self {
        let mut closers = HashMap::new();
        let mut enclosing = Vec::with_capacity(anchors.len());
        let mut open: Vec<usize> = Vec::new();
        let mut pending = anchors.iter().peekable();
        let mut in_str = false;
        let mut escape = false;

        for (index, &byte) in text.as_bytes().iter().enumerate() {
            while pending.next_if(|&&anchor| anchor <= index).is_some() {
                enclosing.push(open.iter().rev().take(MAX_ENCLOSING).copied().collect());
            }

            if in_str {
                if escape {
                    escape = false;
                } else if byte == b'\\' {
                    escape = true;
                } else if byte == b'"' {
                    in_str = false;
                }
                continue;
            }
            match byte {
                b'"' if !open.is_empty() => in_str = true,
                b'{' => open.push(index),
                b'}' => {
                    if let Some(start) = open.pop() {
                        closers.insert(start, index);
                    }
                }
                _ => {}
            }
        }

        Self { closers, enclosing }
    }
}

/// The span from the first `{` to the last `}`, if it exists.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn brace_span_validated(text: &str, _markers: &StructuredOutputMarkers) -> Option<String> {
    brace_span(text)
        .filter(|span| is_json_object(span))
        .map(str::to_string)
}

#[cfg(feature = "json-repair")]
fn brace_span_repaired(text: &str, _markers: &StructuredOutputMarkers) -> Option<String> {
    use jsonrepair::{Options, repair_json};

    let span = brace_span(text)?;
    match repair_json(span, &Options::default()) {
        Ok(repaired) if is_json_object(&repaired) => Some(repaired),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("JSON repair failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> StructuredOutputMarkers {
        StructuredOutputMarkers::default()
    }

    #[test]
    fn extracts_agent_object_from_prose() {
        let out = repair(r#"Sure! {"thought":"x","action":"y"} done."#, &markers());
        assert_eq!(out.text, r#"<output>{"thought":"x","action":"y"}</output>"#);
        assert_eq!(out.step, RepairStep::AgentSchema);
        assert!(!out.step.is_degraded());
    }

    #[test]
    fn valid_sentinel_pair_is_kept() {
        let text = r#"<output>{"thought":"t","action":{"click":3}}</output>"#;
        let out = repair(text, &markers());
        assert_eq!(out.text, text);
        assert_eq!(out.step, RepairStep::SentinelPair);
    }

    #[test]
    fn sentinel_inner_is_trimmed_and_surrounding_prose_dropped() {
        let text = "Here you go:\n<output>\n  {\"thought\":\"t\",\"action\":\"a\"}\n</output>\nbye";
        let out = repair(text, &markers());
        assert_eq!(out.text, r#"<output>{"thought":"t","action":"a"}</output>"#);
    }

    #[test]
    fn repair_is_idempotent_on_correct_output() {
        let once = repair(r#"<output>{"thought":"a","action":"b"}</output>"#, &markers());
        let twice = repair(&once.text, &markers());
        assert_eq!(once, twice);
    }

    #[test]
    fn agent_object_nested_in_larger_reply() {
        let text = r#"Plan: {"meta":{"v":1}} then {"thought":"use } carefully","action":{"type":"done"}} end"#;
        let out = repair(text, &markers());
        assert_eq!(
            out.text,
            r#"<output>{"thought":"use } carefully","action":{"type":"done"}}</output>"#
        );
        assert_eq!(out.step, RepairStep::AgentSchema);
    }

    #[test]
    fn agent_keys_inside_wrapper_object() {
        let text = r#"{"response":{"thought":"t","action":"a"},"extra":1"#;
        let out = repair(text, &markers());
        assert_eq!(out.text, r#"<output>{"thought":"t","action":"a"}</output>"#);
    }

    #[test]
    fn falls_back_to_generic_brace_span() {
        let out = repair(r#"Result: {"answer": 42} thanks"#, &markers());
        assert_eq!(out.text, r#"<output>{"answer": 42}</output>"#);
        assert_eq!(out.step, RepairStep::BraceSpan);
    }

    #[test]
    fn invalid_sentinel_payload_falls_through() {
        let text = r#"<output>{thought: oops}</output> {"thought":"ok","action":"a"}"#;
        let out = repair(text, &markers());
        assert_eq!(out.text, r#"<output>{"thought":"ok","action":"a"}</output>"#);
        assert_eq!(out.step, RepairStep::AgentSchema);
    }

    #[test]
    #[cfg(not(feature = "json-repair"))]
    fn unparseable_span_is_wrapped_degraded() {
        let out = repair(r#"oops {"thought": "x", "action": } end"#, &markers());
        assert_eq!(out.text, r#"<output>{"thought": "x", "action": }</output>"#);
        assert_eq!(out.step, RepairStep::DegradedBraceSpan);
        assert!(out.step.is_degraded());
    }

    #[test]
    fn text_without_braces_is_wrapped_verbatim() {
        let text = "I cannot help with that.";
        let out = repair(text, &markers());
        assert_eq!(out.text, "<output>I cannot help with that.</output>");
        assert_eq!(out.step, RepairStep::DegradedVerbatim);
    }

    #[test]
    fn empty_text_is_still_wrapped() {
        let out = repair("", &markers());
        assert_eq!(out.text, "<output></output>");
        assert!(out.step.is_degraded());
    }

    #[test]
    fn reversed_braces_are_not_a_span() {
        let out = repair("} nothing here {", &markers());
        assert_eq!(out.step, RepairStep::DegradedVerbatim);
        assert_eq!(out.text, "<output>} nothing here {</output>");
    }

    #[test]
    #[cfg(feature = "json-repair")]
    fn trailing_comma_is_repaired_with_feature() {
        let out = repair(r#"reply: {"thought": "x", "action": "y",} end"#, &markers());
        assert_eq!(out.step, RepairStep::JsonRepair);
        let inner = out
            .text
            .strip_prefix("<output>")
            .and_then(|s| s.strip_suffix("</output>"))
            .unwrap();
        let value: Value = serde_json::from_str(inner).unwrap();
        assert_eq!(value["action"], "y");
    }

    #[test]
    fn brace_scan_ignores_braces_in_strings() {
        let text = r#"say "hi" {"a":"he said \"}\"","b":{}} tail"#;
        let start = text.find('{').unwrap();
        let scan = BraceScan::new(text, &[]);
        let end = scan.closers[&start];
        assert_eq!(&text[start..=end], r#"{"a":"he said \"}\"","b":{}}"#);
    }

    #[test]
    fn unbalanced_braces_with_many_anchors_stay_fast() {
        let text = format!("{}{}", "{".repeat(2000), "\"thought\":1,".repeat(200));
        let started = std::time::Instant::now();
        let out = repair(&text, &markers());
        assert_eq!(out.step, RepairStep::DegradedVerbatim);
        assert!(started.elapsed() < std::time::Duration::from_millis(500));

        let scan = BraceScan::new(&text, &[2000, 2012]);
        assert!(scan.closers.is_empty());
        assert!(scan.enclosing.iter().all(|opens| opens.len() == MAX_ENCLOSING));
    }

    #[test]
    fn agent_object_found_after_deep_unbalanced_prefix() {
        let text = format!(
            "{} reply: {{\"thought\":\"t\",\"action\":\"a\"}}",
            "{".repeat(500)
        );
        let out = repair(&text, &markers());
        assert_eq!(out.step, RepairStep::AgentSchema);
        assert_eq!(out.text, r#"<output>{"thought":"t","action":"a"}</output>"#);
    }
}
