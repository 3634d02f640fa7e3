//! AST extraction and path queries.

use super::PathStep;
use serde_json::Value;
use std::collections::HashSet;

/// Slice out the first brace-balanced JSON object in `raw`.
///
/// Compiler output may open with banner lines (`JSON AST:`, `===== file =====`),
/// so the object starts at the first `{`. Braces inside JSON strings are not
/// counted.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Does `node` satisfy one path step?
pub fn step_matches(step: &PathStep, node: &Value) -> bool {
    if node.get("name").and_then(Value::as_str) != Some(step.name.as_str()) {
        return false;
    }
    match &step.type_prefix {
        None => true,
        Some(prefix) => node
            .get("attributes")
            .and_then(|attrs| attrs.get("type"))
            .and_then(Value::as_str)
            .is_some_and(|ty| ty.starts_with(prefix.as_str())),
    }
}

/// All strict descendants of `roots` that satisfy `step`, in document order,
/// each reported once.
pub fn descendant_matches<'v>(roots: &[&'v Value], step: &PathStep) -> Vec<&'v Value> {
    let mut seen: HashSet<*const Value> = HashSet::new();
    let mut found = Vec::new();

    for &root in roots {
        let mut stack: Vec<&'v Value> = children(root).rev().collect();
        while let Some(node) = stack.pop() {
            if step_matches(step, node) && seen.insert(node as *const Value) {
                found.push(node);
            }
            stack.extend(children(node).rev());
        }
    }
    found
}

/// Apply `steps` in sequence: each step searches below the previous matches.
pub fn query<'v>(ast: &'v Value, steps: &[PathStep]) -> Vec<&'v Value> {
    let mut current = vec![ast];
    for step in steps {
        current = descendant_matches(&current, step);
        if current.is_empty() {
            break;
        }
    }
    current
}

fn children(value: &Value) -> Box<dyn DoubleEndedIterator<Item = &Value> + '_> {
    match value {
        Value::Object(map) => Box::new(map.values()),
        Value::Array(items) => Box::new(items.iter()),
        _ => Box::new(std::iter::empty()),
    }
}
