//! # promptreg Core
//!
//! This crate provides the core functionality of promptreg, a versioned prompt registry.
//!
//! Prompts are pairs of system and user text templates identified by an id and a
//! version. Several versions of the same prompt can coexist; exactly one of them is
//! the default that callers get when they do not pin a version.
//!
//! # Modules
//!
//! - [`loader`] - Reads prompt records from TOML, JSON and Markdown files
//! - [`parser`] - Template parsing functionality
//! - [`prompt`] - Prompt records and their compiled form
//! - [`registry`] - Validation and lookup of compiled prompts
//! - [`render`] - Rendering compiled prompts with caller data
//! - [`template`] - Parsed templates and field resolution
//!
//! # Examples
//!
//! ```rust
//! use promptreg_core::prompt::PromptRecord;
//! use promptreg_core::registry::Registry;
//! use std::collections::HashMap;
//!
//! let registry = Registry::new(vec![
//!     PromptRecord::new(
//!         "quantum_agent",
//!         "0.0.1",
//!         "You are a helpful agent who can answer user questions about the {{.topic}}.",
//!         "What is {{.topic}}?",
//!     )
//!     .with_default(true),
//! ])
//! .expect("Failed to build registry");
//!
//! let prompt = registry.get("quantum_agent").expect("Prompt not found");
//! let rendered = prompt
//!     .render(&HashMap::from([("topic", "Shor's algorithm")]))
//!     .expect("Failed to render prompt");
//!
//! assert_eq!("What is Shor's algorithm?", rendered.user_prompt);
//! ```

pub mod loader;
pub mod parser;
pub mod prompt;
pub mod registry;
pub mod render;
pub mod template;
