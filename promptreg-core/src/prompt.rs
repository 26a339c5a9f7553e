//! # Prompts
//!
//! A [`PromptRecord`] is the plain input a registry is built from: an id, a version,
//! a description, a default flag and the two template texts. A [`CompiledPrompt`]
//! is that record with both texts parsed into [`Template`]s, ready to render.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::RegistryError;
use crate::render::{render, RenderError, RenderedPrompt};
use crate::template::{FieldPath, Template};

/// A single prompt revision as supplied by a loader or by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub user_prompt: String,
    #[serde(default, rename = "default")]
    pub is_default: bool,
}

impl PromptRecord {
    pub fn new(
        id: impl Into<String>,
        version: impl Into<String>,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> PromptRecord {
        PromptRecord {
            id: id.into(),
            version: version.into(),
            description: String::new(),
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            is_default: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> PromptRecord {
        self.description = description.into();
        self
    }

    pub fn with_default(mut self, is_default: bool) -> PromptRecord {
        self.is_default = is_default;
        self
    }
}

/// Which of the two texts of a prompt an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateField {
    System,
    User,
}

impl fmt::Display for TemplateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateField::System => write!(f, "system prompt"),
            TemplateField::User => write!(f, "user prompt"),
        }
    }
}

/// A [`PromptRecord`] with both of its texts parsed.
#[derive(Debug, Clone)]
pub struct CompiledPrompt {
    record: PromptRecord,
    system: Template,
    user: Template,
}

impl CompiledPrompt {
    pub fn compile(record: PromptRecord) -> Result<CompiledPrompt, RegistryError> {
        let system = Template::parse(record.system_prompt.as_str())
            .map_err(|source| RegistryError::template(&record, TemplateField::System, source))?;
        let user = Template::parse(record.user_prompt.as_str())
            .map_err(|source| RegistryError::template(&record, TemplateField::User, source))?;

        Ok(CompiledPrompt { record, system, user })
    }

    /// Keeps both texts as literals. Used by the plain-text registry mode.
    pub fn plain(record: PromptRecord) -> CompiledPrompt {
        let system = Template::plain(record.system_prompt.as_str());
        let user = Template::plain(record.user_prompt.as_str());
        CompiledPrompt { record, system, user }
    }

    pub fn record(&self) -> &PromptRecord {
        &self.record
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn version(&self) -> &str {
        &self.record.version
    }

    pub fn description(&self) -> &str {
        &self.record.description
    }

    pub fn is_default(&self) -> bool {
        self.record.is_default
    }

    pub fn system_prompt(&self) -> &str {
        self.system.source()
    }

    pub fn user_prompt(&self) -> &str {
        self.user.source()
    }

    pub fn template(&self, field: TemplateField) -> &Template {
        match field {
            TemplateField::System => &self.system,
            TemplateField::User => &self.user,
        }
    }

    /// Distinct field paths used by either template, in order of first appearance.
    pub fn fields(&self) -> Vec<&FieldPath> {
        let mut fields: Vec<&FieldPath> = Vec::new();
        for path in self.system.fields().into_iter().chain(self.user.fields()) {
            if !fields.contains(&path) {
                fields.push(path);
            }
        }
        fields
    }

    pub fn render<T: Serialize + ?Sized>(&self, data: &T) -> Result<RenderedPrompt, RenderError> {
        render(self, data)
    }
}
