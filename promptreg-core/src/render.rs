//! # Rendering
//!
//! Executes both templates of a [`CompiledPrompt`] against caller data and returns
//! a fresh [`RenderedPrompt`]. The compiled prompt and its registry are never touched,
//! so any number of renders may run side by side.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::prompt::{CompiledPrompt, TemplateField};
use crate::template::RenderTemplateError;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to serialize render data: {0}")]
    Data(#[from] serde_json::Error),
    #[error("failed to render {field} of prompt {id} version {version}: {source}")]
    Template {
        id: String,
        version: String,
        field: TemplateField,
        source: RenderTemplateError,
    },
}

/// A prompt with both texts rendered. Shares its metadata with the source prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPrompt {
    pub id: String,
    pub version: String,
    pub description: String,
    pub system_prompt: String,
    pub user_prompt: String,
    #[serde(rename = "default")]
    pub is_default: bool,
}

/// Renders `prompt` with any serializable `data`, typically a map or a struct.
///
/// # Errors
///
/// * `RenderError::Data` - `data` cannot be represented as JSON.
/// * `RenderError::Template` - A referenced field is missing from `data`.
pub fn render<T: Serialize + ?Sized>(prompt: &CompiledPrompt, data: &T) -> Result<RenderedPrompt, RenderError> {
    let data = serde_json::to_value(data)?;
    render_value(prompt, &data)
}

pub fn render_value(prompt: &CompiledPrompt, data: &Value) -> Result<RenderedPrompt, RenderError> {
    let system_prompt = render_field(prompt, TemplateField::System, data)?;
    let user_prompt = render_field(prompt, TemplateField::User, data)?;

    Ok(RenderedPrompt {
        id: prompt.id().to_string(),
        version: prompt.version().to_string(),
        description: prompt.description().to_string(),
        system_prompt,
        user_prompt,
        is_default: prompt.is_default(),
    })
}

fn render_field(prompt: &CompiledPrompt, field: TemplateField, data: &Value) -> Result<String, RenderError> {
    prompt
        .template(field)
        .render(data)
        .map_err(|source| RenderError::Template {
            id: prompt.id().to_string(),
            version: prompt.version().to_string(),
            field,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptRecord;
    use std::collections::HashMap;

    fn quantum_agent() -> CompiledPrompt {
        let record = PromptRecord::new(
            "quantum_agent",
            "0.0.1",
            "You are a helpful agent who can answer user questions about the {{.topic}}.",
            "What is {{.topic}}?",
        )
        .with_description("Agent for Quantum Computation.")
        .with_default(true);
        CompiledPrompt::compile(record).unwrap()
    }

    #[test]
    fn test_render_with_map() {
        let prompt = quantum_agent();
        let data = HashMap::from([("topic", "Shor's algorithm")]);

        let rendered = render(&prompt, &data).expect("Failed to render prompt");

        assert_eq!(
            "You are a helpful agent who can answer user questions about the Shor's algorithm.",
            rendered.system_prompt
        );
        assert_eq!("What is Shor's algorithm?", rendered.user_prompt);
        assert_eq!("quantum_agent", rendered.id);
        assert_eq!("0.0.1", rendered.version);
        assert_eq!("Agent for Quantum Computation.", rendered.description);
        assert!(rendered.is_default);
    }

    #[test]
    fn test_render_with_struct() {
        #[derive(Serialize)]
        struct Context {
            topic: String,
        }

        let prompt = quantum_agent();
        let rendered = prompt.render(&Context { topic: "Grover's algorithm".to_string() }).unwrap();
        assert_eq!("What is Grover's algorithm?", rendered.user_prompt);
    }

    #[test]
    fn test_render_is_repeatable() {
        let prompt = quantum_agent();
        let data = serde_json::json!({"topic": "teleportation"});

        let first = render_value(&prompt, &data).unwrap();
        let second = render_value(&prompt, &data).unwrap();
        assert_eq!(first, second);
        assert_eq!("What is {{.topic}}?", prompt.user_prompt());
    }

    #[test]
    fn test_render_names_failing_template() {
        let record = PromptRecord::new("agent", "2", "Static system text.", "Explain {{subject}}.").with_default(true);
        let prompt = CompiledPrompt::compile(record).unwrap();

        match render_value(&prompt, &serde_json::json!({"topic": "qubits"})) {
            Err(RenderError::Template { id, version, field, source }) => {
                assert_eq!("agent", id);
                assert_eq!("2", version);
                assert_eq!(TemplateField::User, field);
                assert_eq!(RenderTemplateError::MissingField { path: "subject".to_string() }, source);
            }
            other => panic!("Expected Template error, got {:?}", other),
        }
    }

    #[test]
    fn test_render_system_failure_first() {
        let prompt = quantum_agent();
        let err = render_value(&prompt, &serde_json::json!({})).unwrap_err();
        assert!(err.to_string().starts_with("failed to render system prompt of prompt quantum_agent version 0.0.1"));
    }

    #[test]
    fn test_render_unserializable_data() {
        let prompt = quantum_agent();
        let data: HashMap<(u8, u8), &str> = HashMap::from([((1, 2), "tuple keys")]);

        assert!(matches!(render(&prompt, &data), Err(RenderError::Data(_))));
    }
}
