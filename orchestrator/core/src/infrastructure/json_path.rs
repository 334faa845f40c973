// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! JSON Path Evaluator
//!
//! A deliberately small path language over `serde_json::Value`, covering the
//! expressions command definitions use in `parent-property` and the implicit
//! collection lookups the resolver builds.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse and evaluate path expressions against entity snapshots
//!
//! # Grammar
//!
//! - `$` - the root value (every expression starts here)
//! - `.name` / `['name']` - object member
//! - `[n]` - array element, negative indexes count from the end
//! - `[*]` / `.*` - every element or member value
//! - `..name` - `name` members at any depth, document order
//! - `[?(@.field == 'literal')]` - array elements whose field matches
//!   (`!=` too; literals may be quoted strings, numbers, booleans or null)
//!
//! Evaluation always yields a list of matches.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum JsonPathError {
    #[error("Invalid path expression \"{expression}\" at position {position}: {reason}")]
    Syntax {
        expression: String,
        position: usize,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Member(String),
    Index(i64),
    Wildcard,
    Descendant(String),
    Filter(Predicate),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Comparison {
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, PartialEq)]
struct Predicate {
    field: Vec<String>,
    comparison: Comparison,
    literal: Value,
}

impl Predicate {
    fn matches(&self, candidate: &Value) -> bool {
        let mut current = candidate;
        for key in &self.field {
            match current.get(key) {
                Some(next) => current = next,
                None => return false,
            }
        }
        let equal = loosely_equal(current, &self.literal);
        match self.comparison {
            Comparison::Equal => equal,
            Comparison::NotEqual => !equal,
        }
    }
}

/// Scalars compare by their text form so `@.id == '1'` matches a numeric id.
fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(a), Value::Number(_) | Value::Bool(_))
        | (Value::Number(_) | Value::Bool(_), Value::String(a)) => {
            let other = if left.is_string() { right } else { left };
            *a == other.to_string()
        }
        _ => left == right,
    }
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(expression: &str) -> Result<Self, JsonPathError> {
        Parser::new(expression).parse()
    }

    /// Every value the expression selects, in document order.
    pub fn select<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![root];
        for segment in &self.segments {
            let mut next = Vec::new();
            for node in current {
                apply(segment, node, &mut next);
            }
            current = next;
        }
        current
    }

    /// Text form of every match: strings unquoted, anything else as compact JSON.
    pub fn select_strings(&self, root: &Value) -> Vec<String> {
        self.select(root).into_iter().map(render).collect()
    }
}

pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn apply<'a>(segment: &Segment, node: &'a Value, out: &mut Vec<&'a Value>) {
    match segment {
        Segment::Member(name) => {
            if let Some(value) = node.get(name.as_str()) {
                out.push(value);
            }
        }
        Segment::Index(index) => {
            if let Value::Array(items) = node {
                let len = items.len() as i64;
                let resolved = if *index < 0 { len + index } else { *index };
                if (0..len).contains(&resolved) {
                    out.push(&items[resolved as usize]);
                }
            }
        }
        Segment::Wildcard => match node {
            Value::Array(items) => out.extend(items.iter()),
            Value::Object(map) => out.extend(map.values()),
            _ => {}
        },
        Segment::Descendant(name) => collect_descendants(name, node, out),
        Segment::Filter(predicate) => match node {
            Value::Array(items) => out.extend(items.iter().filter(|i| predicate.matches(i))),
            Value::Object(_) if predicate.matches(node) => out.push(node),
            _ => {}
        },
    }
}

fn collect_descendants<'a>(name: &str, node: &'a Value, out: &mut Vec<&'a Value>) {
    match node {
        Value::Object(map) => {
            if let Some(value) = map.get(name) {
                out.push(value);
            }
            for child in map.values() {
                collect_descendants(name, child, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_descendants(name, child, out);
            }
        }
        _ => {}
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    expression: &'a str,
    chars: Vec<char>,
    position: usize,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> Self {
        Self {
            expression,
            chars: expression.trim().chars().collect(),
            position: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> JsonPathError {
        JsonPathError::Syntax {
            expression: self.expression.to_string(),
            position: self.position,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), JsonPathError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", expected)))
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.position += 1;
        }
    }

    fn parse(mut self) -> Result<JsonPath, JsonPathError> {
        self.expect('$')?;
        let mut segments = Vec::new();

        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.position += 1;
                    if self.eat('.') {
                        let name = self.name()?;
                        segments.push(Segment::Descendant(name));
                    } else if self.eat('*') {
                        segments.push(Segment::Wildcard);
                    } else {
                        let name = self.name()?;
                        segments.push(Segment::Member(name));
                    }
                }
                '[' => {
                    self.position += 1;
                    segments.push(self.bracket()?);
                }
                other => return Err(self.error(format!("unexpected '{}'", other))),
            }
        }

        Ok(JsonPath { segments })
    }

    fn name(&mut self) -> Result<String, JsonPathError> {
        let start = self.position;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '-') {
            self.position += 1;
        }
        if start == self.position {
            return Err(self.error("expected a member name"));
        }
        Ok(self.chars[start..self.position].iter().collect())
    }

    fn quoted(&mut self) -> Result<String, JsonPathError> {
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected a quoted string")),
        };
        self.position += 1;
        let start = self.position;
        while let Some(c) = self.peek() {
            if c == quote {
                let text = self.chars[start..self.position].iter().collect();
                self.position += 1;
                return Ok(text);
            }
            self.position += 1;
        }
        Err(self.error("unterminated string"))
    }

    fn bracket(&mut self) -> Result<Segment, JsonPathError> {
        self.skip_whitespace();
        let segment = match self.peek() {
            Some('\'' | '"') => Segment::Member(self.quoted()?),
            Some('*') => {
                self.position += 1;
                Segment::Wildcard
            }
            Some('?') => {
                self.position += 1;
                Segment::Filter(self.predicate()?)
            }
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let start = self.position;
                self.position += 1;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.position += 1;
                }
                let text: String = self.chars[start..self.position].iter().collect();
                let index = text
                    .parse::<i64>()
                    .map_err(|_| self.error(format!("invalid index '{}'", text)))?;
                Segment::Index(index)
            }
            _ => return Err(self.error("expected a name, index, '*' or filter")),
        };
        self.skip_whitespace();
        self.expect(']')?;
        Ok(segment)
    }

    fn predicate(&mut self) -> Result<Predicate, JsonPathError> {
        self.expect('(')?;
        self.skip_whitespace();
        self.expect('@')?;

        let mut field = Vec::new();
        loop {
            if self.eat('.') {
                field.push(self.name()?);
            } else if self.peek() == Some('[') {
                self.position += 1;
                field.push(self.quoted()?);
                self.expect(']')?;
            } else {
                break;
            }
        }
        if field.is_empty() {
            return Err(self.error("filter must compare a member of '@'"));
        }

        self.skip_whitespace();
        let comparison = if self.eat('=') {
            self.expect('=')?;
            Comparison::Equal
        } else if self.eat('!') {
            self.expect('=')?;
            Comparison::NotEqual
        } else {
            return Err(self.error("expected '==' or '!='"));
        };
        self.skip_whitespace();

        let literal = self.literal()?;
        self.skip_whitespace();
        self.expect(')')?;

        Ok(Predicate {
            field,
            comparison,
            literal,
        })
    }

    fn literal(&mut self) -> Result<Value, JsonPathError> {
        if matches!(self.peek(), Some('\'' | '"')) {
            return Ok(Value::String(self.quoted()?));
        }
        let start = self.position;
        while matches!(self.peek(), Some(c) if !c.is_whitespace() && c != ')') {
            self.position += 1;
        }
        let text: String = self.chars[start..self.position].iter().collect();
        match serde_json::from_str::<Value>(&text) {
            Ok(value @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => Ok(value),
            _ => Err(self.error(format!("invalid literal '{}'", text))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> Value {
        json!({
            "id": "XNAT_E00001",
            "label": "session1",
            "projectId": "proj1",
            "scans": [
                {"id": "1", "type": "T1", "resources": [{"label": "DICOM", "directory": "/data/s1/DICOM"}]},
                {"id": "2", "type": "T2", "resources": [{"label": "NIFTI", "directory": "/data/s2/NIFTI"}]}
            ]
        })
    }

    #[test]
    fn test_member_and_index() {
        let path = JsonPath::parse("$.scans[1].type").unwrap();
        assert_eq!(path.select_strings(&session()), vec!["T2"]);

        let path = JsonPath::parse("$['scans'][-1]['id']").unwrap();
        assert_eq!(path.select_strings(&session()), vec!["2"]);
    }

    #[test]
    fn test_filter_returns_matching_objects() {
        let doc = session();
        let path = JsonPath::parse("$.scans[?(@.id == '2')]").unwrap();
        let matches = path.select(&doc);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["type"], "T2");

        let path = JsonPath::parse("$.scans[?(@.id != '2')].type").unwrap();
        assert_eq!(path.select_strings(&session()), vec!["T1"]);
    }

    #[test]
    fn test_filter_compares_numbers_and_strings_loosely() {
        let value = json!({"files": [{"id": 7, "path": "/a"}, {"id": 8, "path": "/b"}]});
        let path = JsonPath::parse("$.files[?(@.id == '8')].path").unwrap();
        assert_eq!(path.select_strings(&value), vec!["/b"]);

        let path = JsonPath::parse("$.files[?(@.id == 7)].path").unwrap();
        assert_eq!(path.select_strings(&value), vec!["/a"]);
    }

    #[test]
    fn test_recursive_descent() {
        let path = JsonPath::parse("$..directory").unwrap();
        assert_eq!(
            path.select_strings(&session()),
            vec!["/data/s1/DICOM", "/data/s2/NIFTI"]
        );

        let path = JsonPath::parse("$..projectId").unwrap();
        assert_eq!(path.select_strings(&session()), vec!["proj1"]);
    }

    #[test]
    fn test_wildcard_and_structured_render() {
        let path = JsonPath::parse("$.scans[*].resources[0]").unwrap();
        let rendered = path.select_strings(&session());
        assert_eq!(rendered.len(), 2);
        let first: Value = serde_json::from_str(&rendered[0]).unwrap();
        assert_eq!(first, json!({"label": "DICOM", "directory": "/data/s1/DICOM"}));
        assert!(!rendered[0].contains('\n'));
    }

    #[test]
    fn test_missing_member_yields_nothing() {
        let path = JsonPath::parse("$.subjects[0]").unwrap();
        assert!(path.select(&session()).is_empty());
    }

    #[test]
    fn test_syntax_errors() {
        assert!(JsonPath::parse("scans").is_err());
        assert!(JsonPath::parse("$.").is_err());
        assert!(JsonPath::parse("$.scans[?(@.id = '1')]").is_err());
        assert!(JsonPath::parse("$.scans['id").is_err());
        assert!(JsonPath::parse("$.scans[?(@.id == bogus)]").is_err());
    }
}
