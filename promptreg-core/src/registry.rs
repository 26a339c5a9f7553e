//! # Prompt Registry
//!
//! An immutable, indexed collection of [`CompiledPrompt`]s.
//!
//! A [`Registry`] is built once from a list of [`PromptRecord`]s and validated as a
//! whole: every record needs a non-empty id and version, `(id, version)` pairs are
//! unique, and every id has exactly one record marked default. Both texts of every
//! record are parsed up front, so a registry that exists only holds renderable
//! templates. Construction either succeeds completely or returns the first
//! [`RegistryError`] it meets.
//!
//! # Examples
//!
//! ```rust
//! use promptreg_core::prompt::PromptRecord;
//! use promptreg_core::registry::Registry;
//!
//! let registry = Registry::new(vec![
//!     PromptRecord::new("quantum_agent", "0.0.1", "About {{topic}}.", "What is {{topic}}?"),
//!     PromptRecord::new("quantum_agent", "0.0.2", "All about {{topic}}.", "Explain {{topic}}.")
//!         .with_default(true),
//! ])
//! .expect("valid prompts");
//!
//! assert_eq!("0.0.2", registry.get("quantum_agent").unwrap().version());
//! assert!(!registry.get_version("quantum_agent", "0.0.1").unwrap().is_default());
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use crate::prompt::{CompiledPrompt, PromptRecord, TemplateField};
use crate::template::ParseTemplateError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("prompt id and version must not be empty (record {index})")]
    EmptyIdentifier { index: usize },
    #[error("failed to parse {field} of prompt {id} version {version}: {source}")]
    Template {
        id: String,
        version: String,
        field: TemplateField,
        source: ParseTemplateError,
    },
    #[error("prompt with ID {id} and version {version} already exists")]
    DuplicateVersion { id: String, version: String },
    #[error("default prompt with ID {id} already exists")]
    DuplicateDefault { id: String },
    #[error("default prompt with ID {id} not found")]
    MissingDefault { id: String },
}

impl RegistryError {
    pub(crate) fn template(record: &PromptRecord, field: TemplateField, source: ParseTemplateError) -> Self {
        RegistryError::Template {
            id: record.id.clone(),
            version: record.version.clone(),
            field,
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("default prompt with ID {id} not found")]
    DefaultNotFound { id: String },
    #[error("prompt with ID {id} not found")]
    IdNotFound { id: String },
    #[error("prompt with ID {id} and version {version} not found")]
    VersionNotFound { id: String, version: String },
}

/// Builder for [`Registry`].
#[derive(Debug, Default, Clone)]
pub struct RegistryBuilder {
    plain_text: bool,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores prompt texts as-is instead of parsing them as templates.
    ///
    /// Plain-text prompts skip syntax validation and render to their source unchanged.
    pub fn plain_text(mut self, enabled: bool) -> Self {
        self.plain_text = enabled;
        self
    }

    /// Validates and indexes `records`, in order.
    ///
    /// # Errors
    ///
    /// * `RegistryError::EmptyIdentifier` - A record has an empty id or version.
    /// * `RegistryError::Template` - A system or user text is not a valid template.
    /// * `RegistryError::DuplicateVersion` - Two records share an id and version.
    /// * `RegistryError::DuplicateDefault` - An id has more than one default record.
    /// * `RegistryError::MissingDefault` - An id has no default record.
    pub fn build<I>(self, records: I) -> Result<Registry, RegistryError>
    where
        I: IntoIterator<Item = PromptRecord>,
    {
        let mut default_index: HashMap<String, String> = HashMap::new();
        let mut version_index: HashMap<String, HashMap<String, CompiledPrompt>> = HashMap::new();
        // ids in order of first appearance, so a missing default is reported deterministically
        let mut ids: Vec<String> = Vec::new();
        let mut count = 0;

        for (index, record) in records.into_iter().enumerate() {
            if record.id.is_empty() || record.version.is_empty() {
                return Err(RegistryError::EmptyIdentifier { index });
            }

            let prompt = if self.plain_text {
                CompiledPrompt::plain(record)
            } else {
                CompiledPrompt::compile(record)?
            };

            let versions = match version_index.entry(prompt.id().to_string()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    ids.push(prompt.id().to_string());
                    entry.insert(HashMap::new())
                }
            };

            if versions.contains_key(prompt.version()) {
                return Err(RegistryError::DuplicateVersion {
                    id: prompt.id().to_string(),
                    version: prompt.version().to_string(),
                });
            }

            if prompt.is_default() {
                match default_index.entry(prompt.id().to_string()) {
                    Entry::Occupied(_) => {
                        return Err(RegistryError::DuplicateDefault {
                            id: prompt.id().to_string(),
                        });
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(prompt.version().to_string());
                    }
                }
            }

            debug!(
                id = prompt.id(),
                version = prompt.version(),
                is_default = prompt.is_default(),
                "indexed prompt"
            );
            versions.insert(prompt.version().to_string(), prompt);
            count += 1;
        }

        if let Some(id) = ids.into_iter().find(|id| !default_index.contains_key(id)) {
            return Err(RegistryError::MissingDefault { id });
        }

        info!(ids = version_index.len(), prompts = count, "prompt registry built");

        Ok(Registry {
            default_index,
            version_index,
            count,
        })
    }
}

/// Validated prompts indexed by id and version. Read-only once built.
#[derive(Debug, Clone)]
pub struct Registry {
    /// id -> version of its default prompt
    default_index: HashMap<String, String>,
    version_index: HashMap<String, HashMap<String, CompiledPrompt>>,
    count: usize,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Builds a registry with template parsing enabled.
    pub fn new<I>(records: I) -> Result<Registry, RegistryError>
    where
        I: IntoIterator<Item = PromptRecord>,
    {
        RegistryBuilder::new().build(records)
    }

    /// Gets the default prompt of `id`.
    pub fn get(&self, id: &str) -> Result<&CompiledPrompt, LookupError> {
        self.default_index
            .get(id)
            .and_then(|version| self.version_index.get(id)?.get(version))
            .ok_or_else(|| LookupError::DefaultNotFound { id: id.to_string() })
    }

    /// Gets the prompt with exactly this `id` and `version`.
    pub fn get_version(&self, id: &str, version: &str) -> Result<&CompiledPrompt, LookupError> {
        let versions = self
            .version_index
            .get(id)
            .ok_or_else(|| LookupError::IdNotFound { id: id.to_string() })?;

        versions.get(version).ok_or_else(|| LookupError::VersionNotFound {
            id: id.to_string(),
            version: version.to_string(),
        })
    }

    /// Gets a pinned version when one is given, otherwise the default.
    pub fn resolve(&self, id: &str, version: Option<&str>) -> Result<&CompiledPrompt, LookupError> {
        match version {
            Some(version) => self.get_version(id, version),
            None => self.get(id),
        }
    }

    /// All ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.version_index.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// All versions of `id`, sorted.
    pub fn versions(&self, id: &str) -> Result<Vec<&str>, LookupError> {
        let versions = self
            .version_index
            .get(id)
            .ok_or_else(|| LookupError::IdNotFound { id: id.to_string() })?;

        let mut versions: Vec<&str> = versions.keys().map(String::as_str).collect();
        versions.sort_unstable();
        Ok(versions)
    }

    /// Number of prompts across all ids and versions.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
