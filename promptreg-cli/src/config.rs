use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env::home_dir;
use std::path::PathBuf;

pub const PROMPTREG_CLI: &str = "promptreg";

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptregCliConfig {
    pub prompts_dir: String,
}

impl Default for PromptregCliConfig {
    fn default() -> Self {
        let prompts_dir = home_dir()
            .map(|p| p.join("promptreg").join("prompts"))
            .unwrap_or_else(|| PathBuf::from("promptreg/prompts"));

        Self {
            prompts_dir: prompts_dir.display().to_string(),
        }
    }
}

/// Directory to load prompts from: the command line override, else the stored config.
pub fn prompts_dir(cli_override: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = cli_override {
        return Ok(dir);
    }

    let config: PromptregCliConfig = confy::load(PROMPTREG_CLI, None)
        .context("Problem loading config")?;
    Ok(PathBuf::from(config.prompts_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_skips_config() {
        let dir = prompts_dir(Some(PathBuf::from("/tmp/prompts"))).unwrap();
        assert_eq!(PathBuf::from("/tmp/prompts"), dir);
    }

    #[test]
    fn test_default_config_points_at_prompts_dir() {
        let config = PromptregCliConfig::default();
        assert!(config.prompts_dir.ends_with("prompts"));
    }
}
