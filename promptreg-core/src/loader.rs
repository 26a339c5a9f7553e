//! # Loader
//!
//! Reads [`PromptRecord`]s from prompt files on the local filesystem.
//!
//! Three formats are understood, picked by file extension:
//!
//! - `.toml` - a `[[prompts]]` array of records.
//! - `.json` - an array of records, or an object with a `prompts` array.
//! - `.md` - one record per file: YAML frontmatter holds `id`, `version`,
//!   `description`, `default` and `systemPrompt`, the Markdown body is the user prompt.
//!
//! # Examples
//!
//! ```rust
//! use promptreg_core::loader::load_dir;
//! use promptreg_core::registry::Registry;
//! use tempfile::TempDir;
//!
//! let temp_dir = TempDir::new().unwrap();
//! std::fs::write(
//!     temp_dir.path().join("search.toml"),
//!     r#"
//! [[prompts]]
//! id = "search"
//! version = "0.0.1"
//! systemPrompt = "You are a specialist in search."
//! userPrompt = "Search for {{query}}."
//! default = true
//! "#,
//! )
//! .unwrap();
//!
//! let registry = Registry::new(load_dir(temp_dir.path()).unwrap()).unwrap();
//! assert_eq!("0.0.1", registry.get("search").unwrap().version());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::prompt::PromptRecord;
use crate::registry::{Registry, RegistryError};

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["toml", "json", "md"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error reading {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid TOML in {path:?}: {source}")]
    Toml { path: PathBuf, source: toml::de::Error },
    #[error("invalid JSON in {path:?}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("invalid frontmatter in {path:?}: {message}")]
    Frontmatter { path: PathBuf, message: String },
    #[error("unsupported prompt file format, must be one of toml, json, md: {0:?}")]
    UnsupportedFormat(PathBuf),
    #[error("invalid base path: {0:?}")]
    InvalidBasePath(PathBuf),
    #[error("failed to walk {path:?}: {source}")]
    Walk { path: PathBuf, source: walkdir::Error },
}

#[derive(Debug, Error)]
pub enum RegistryLoadError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Deserialize)]
struct PromptFile {
    prompts: Vec<PromptRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonPromptFile {
    List(Vec<PromptRecord>),
    Table(PromptFile),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkdownFrontmatter {
    #[serde(default)]
    id: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    system_prompt: String,
    #[serde(default, rename = "default")]
    is_default: bool,
}

/// Loads the records of a single prompt file.
///
/// # Returns
///
/// * `Ok(Vec<PromptRecord>)` - The records in file order.
/// * `LoadError::UnsupportedFormat` - If the extension is not `toml`, `json` or `md`.
/// * `LoadError` - If the file cannot be read or parsed.
pub fn load_file(path: &Path) -> Result<Vec<PromptRecord>, LoadError> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension) {
        return Err(LoadError::UnsupportedFormat(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = match extension {
        "toml" => parse_toml(path, &content)?,
        "json" => parse_json(path, &content)?,
        _ => vec![parse_markdown(path, &content)?],
    };

    debug!(path = %path.display(), records = records.len(), "loaded prompt file");
    Ok(records)
}

/// Loads every supported prompt file below `base_path`, ordered by path.
///
/// Symbolic links are followed. Files with other extensions are skipped.
///
/// # Returns
///
/// * `Ok(Vec<PromptRecord>)` - The records of all files.
/// * `LoadError::InvalidBasePath` - If `base_path` does not exist or is not a directory.
/// * `LoadError::Walk` - If a directory cannot be read or links form a loop.
/// * `LoadError` - If any prompt file cannot be read or parsed.
pub fn load_dir(base_path: &Path) -> Result<Vec<PromptRecord>, LoadError> {
    if !base_path.is_dir() {
        return Err(LoadError::InvalidBasePath(base_path.to_path_buf()));
    }

    let mut records = Vec::new();
    let mut files = 0;

    for entry in prompt_files(base_path)? {
        records.extend(load_file(entry.path())?);
        files += 1;
    }

    info!(path = %base_path.display(), files, records = records.len(), "loaded prompts");
    Ok(records)
}

impl Registry {
    /// Loads every prompt file below `base_path` and builds a registry from them.
    pub fn from_dir(base_path: &Path) -> Result<Registry, RegistryLoadError> {
        let records = load_dir(base_path)?;
        Ok(Registry::new(records)?)
    }
}

fn prompt_files(base_path: &Path) -> Result<Vec<walkdir::DirEntry>, LoadError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(base_path).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: source.path().unwrap_or(base_path).to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let supported = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext));
        if supported {
            files.push(entry);
        } else {
            warn!(path = %entry.path().display(), "skipping unsupported file");
        }
    }

    Ok(files)
}

fn parse_toml(path: &Path, content: &str) -> Result<Vec<PromptRecord>, LoadError> {
    let file: PromptFile = toml::from_str(content).map_err(|source| LoadError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.prompts)
}

fn parse_json(path: &Path, content: &str) -> Result<Vec<PromptRecord>, LoadError> {
    let file: JsonPromptFile = serde_json::from_str(content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match file {
        JsonPromptFile::List(records) => records,
        JsonPromptFile::Table(file) => file.prompts,
    })
}

fn parse_markdown(path: &Path, content: &str) -> Result<PromptRecord, LoadError> {
    let (metadata, body): (MarkdownFrontmatter, String) = serde_frontmatter::deserialize(content)
        .map_err(|e| LoadError::Frontmatter {
            path: path.to_path_buf(),
            message: format!("{:?}", e),
        })?;

    Ok(PromptRecord {
        id: metadata.id,
        version: metadata.version,
        description: metadata.description,
        system_prompt: metadata.system_prompt,
        user_prompt: body.trim_start().to_string(),
        is_default: metadata.is_default,
    })
}
