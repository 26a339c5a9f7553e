//! # Templates
//!
//! Parsed prompt text. A [`Template`] keeps its original source next to the
//! parts produced by [`crate::parser`], so parsing happens once and rendering
//! is a walk over the parts.
//!
//! Syntax:
//! - `{{field}}`, `{{ field }}` and `{{.field}}` substitute a value from the data.
//! - `{{user.name}}` walks nested objects, `{{tools.0}}` indexes arrays.
//! - `{{{{ ... }}}}` emits its contents verbatim.

use std::fmt;

use nom::Err as NomErr;
use serde_json::Value;
use thiserror::Error;

use crate::parser::parse_template;

/// Characters of remaining input quoted in a [`ParseTemplateError`].
const ERROR_CONTEXT_CHARS: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid template syntax at byte {offset} near `{near}`")]
pub struct ParseTemplateError {
    pub offset: usize,
    pub near: String,
}

impl ParseTemplateError {
    fn at(source: &str, remaining: &str) -> Self {
        Self {
            offset: source.len() - remaining.len(),
            near: remaining.chars().take(ERROR_CONTEXT_CHARS).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderTemplateError {
    #[error("missing field: {path}")]
    MissingField { path: String },
    #[error("cannot look up `{segment}` of {path}: value is not an object or array")]
    NotAContainer { path: String, segment: String },
}

/// Dotted reference to a value inside the render data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Looks the path up in `data`, failing on the first absent segment.
    pub fn resolve<'a>(&self, data: &'a Value) -> Result<&'a Value, RenderTemplateError> {
        let mut current = data;
        for segment in &self.segments {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => {
                    return Err(RenderTemplateError::NotAContainer {
                        path: self.to_string(),
                        segment: segment.clone(),
                    });
                }
            };
            current = next.ok_or_else(|| RenderTemplateError::MissingField {
                path: self.to_string(),
            })?;
        }
        Ok(current)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Field(FieldPath),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    parts: Vec<TemplatePart>,
}

impl Template {
    pub fn parse(source: impl Into<String>) -> Result<Template, ParseTemplateError> {
        let source = source.into();
        let parts = match parse_template(&source) {
            Ok((_, parts)) => parts,
            Err(NomErr::Error(e)) | Err(NomErr::Failure(e)) => {
                return Err(ParseTemplateError::at(&source, e.input));
            }
            Err(NomErr::Incomplete(_)) => {
                return Err(ParseTemplateError::at(&source, ""));
            }
        };
        Ok(Template { source, parts })
    }

    /// Wraps `source` without parsing it; rendering returns it unchanged.
    pub fn plain(source: impl Into<String>) -> Template {
        let source = source.into();
        let parts = if source.is_empty() {
            vec![]
        } else {
            vec![TemplatePart::Literal(source.clone())]
        };
        Template { source, parts }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    pub fn fields(&self) -> Vec<&FieldPath> {
        self.parts.iter().filter_map(|part| {
            if let TemplatePart::Field(path) = part {
                Some(path)
            } else {
                None
            }
        }).collect()
    }

    pub fn render(&self, data: &Value) -> Result<String, RenderTemplateError> {
        let mut result = String::with_capacity(self.source.len());

        for part in &self.parts {
            match part {
                TemplatePart::Literal(text) => result.push_str(text),
                TemplatePart::Field(path) => push_value(&mut result, path.resolve(data)?),
            }
        }

        Ok(result)
    }
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(text) => out.push_str(text),
        Value::Null => {}
        // numbers, booleans and compound values use their compact JSON form
        other => out.push_str(&other.to_string()),
    }
}
