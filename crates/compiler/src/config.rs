//! Compiler configuration.
//!
//! [`CompilerConfig`] is the programmatic surface: a builder the CLI and
//! embedding tools fill in. An optional `Omni.toml` project file can
//! supply defaults, parsed with serde and merged underneath whatever the
//! caller set explicitly.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Optimization level for the C post-pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    #[default]
    O0,
    O1,
    O2,
    O3,
    Os,
}

impl OptLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            OptLevel::O0 => "O0",
            OptLevel::O1 => "O1",
            OptLevel::O2 => "O2",
            OptLevel::O3 => "O3",
            OptLevel::Os => "Os",
        }
    }
}

impl FromStr for OptLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" | "O0" => Ok(OptLevel::O0),
            "1" | "O1" => Ok(OptLevel::O1),
            "2" | "O2" => Ok(OptLevel::O2),
            "3" | "O3" => Ok(OptLevel::O3),
            "s" | "Os" => Ok(OptLevel::Os),
            other => Err(format!(
                "unknown optimization level '{}'; expected one of 0, 1, 2, 3, s",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompilerConfig {
    pub opt_level: OptLevel,
    /// Extra module search roots, tried before the standard ones.
    pub search_paths: Vec<PathBuf>,
    /// Keep the generated .c file next to the output.
    pub keep_c: bool,
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_opt_level(mut self, level: OptLevel) -> Self {
        self.opt_level = level;
        self
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    pub fn with_keep_c(mut self, keep: bool) -> Self {
        self.keep_c = keep;
        self
    }

    /// Fill unset fields from an `Omni.toml` found in `dir`, if any.
    pub fn load_project_defaults(mut self, dir: &Path) -> Result<Self, String> {
        let path = dir.join("Omni.toml");
        let Ok(text) = std::fs::read_to_string(&path) else {
            return Ok(self);
        };
        let project = ProjectConfig::from_toml(&text)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        if self.opt_level == OptLevel::O0 {
            if let Some(level) = project.opt_level {
                self.opt_level = level.parse()?;
            }
        }
        for root in project.search_paths.unwrap_or_default() {
            self.search_paths.push(dir.join(root));
        }
        if let Some(keep) = project.keep_c {
            self.keep_c = self.keep_c || keep;
        }
        Ok(self)
    }
}

/// Raw `Omni.toml` contents.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    #[serde(rename = "opt-level")]
    pub opt_level: Option<String>,
    #[serde(rename = "search-paths")]
    pub search_paths: Option<Vec<String>>,
    #[serde(rename = "keep-c")]
    pub keep_c: Option<bool>,
}

impl ProjectConfig {
    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| format!("failed to parse project config: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opt_level_parsing() {
        assert_eq!("0".parse::<OptLevel>().unwrap(), OptLevel::O0);
        assert_eq!("O2".parse::<OptLevel>().unwrap(), OptLevel::O2);
        assert_eq!("s".parse::<OptLevel>().unwrap(), OptLevel::Os);
        assert!("fast".parse::<OptLevel>().is_err());
    }

    #[test]
    fn test_builder() {
        let config = CompilerConfig::new()
            .with_opt_level(OptLevel::O2)
            .with_search_path("/opt/omni/std")
            .with_keep_c(true);
        assert_eq!(config.opt_level, OptLevel::O2);
        assert_eq!(config.search_paths, vec![PathBuf::from("/opt/omni/std")]);
        assert!(config.keep_c);
    }

    #[test]
    fn test_project_config_from_toml() {
        let project = ProjectConfig::from_toml(
            "opt-level = \"2\"\nsearch-paths = [\"vendor\"]\nkeep-c = true\n",
        )
        .unwrap();
        assert_eq!(project.opt_level.as_deref(), Some("2"));
        assert_eq!(project.search_paths.unwrap(), vec!["vendor"]);
        assert_eq!(project.keep_c, Some(true));
    }

    #[test]
    fn test_bad_project_config_is_an_error() {
        assert!(ProjectConfig::from_toml("opt-level = [").is_err());
    }
}
