use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File name searched for when locating a project configuration.
pub const CONFIG_FILE_NAME: &str = "Csx.toml";

/// The parsed Csx.toml configuration.
#[derive(Debug, Clone, Default)]
pub struct CsxConfig {
    pub checker: CheckerSection,
    pub output: OutputSection,
    /// The directory containing the Csx.toml file, if one was loaded.
    pub root_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckerSection {
    /// Name the last method of a class must carry.
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
}

impl Default for CheckerSection {
    fn default() -> Self {
        Self {
            entry_point: default_entry_point(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSection {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            color: default_color(),
        }
    }
}

/// How the CLI renders diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

fn default_entry_point() -> String {
    "main".to_string()
}

fn default_color() -> bool {
    true
}

/// Raw TOML structure for deserialization.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    checker: CheckerSection,
    #[serde(default)]
    output: OutputSection,
}

/// Errors that can occur when loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no Csx.toml found (searched from {0})")]
    NotFound(String),
    #[error("failed to read Csx.toml: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid Csx.toml: {0}")]
    ParseError(String),
    #[error("invalid Csx.toml: [checker] entry_point must not be empty")]
    EmptyEntryPoint,
}

/// Walk up from `start_dir` looking for `Csx.toml`.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load and validate a Csx.toml file.
pub fn load_config(path: &Path) -> Result<CsxConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let root_dir = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    parse_config(&content, Some(root_dir))
}

/// Parse and validate a Csx.toml document.
pub fn parse_config(content: &str, root_dir: Option<PathBuf>) -> Result<CsxConfig, ConfigError> {
    let raw: RawConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    if raw.checker.entry_point.trim().is_empty() {
        return Err(ConfigError::EmptyEntryPoint);
    }

    Ok(CsxConfig {
        checker: raw.checker,
        output: raw.output,
        root_dir,
    })
}

/// Find and load the configuration starting from an input file's directory.
pub fn find_and_load_config(input_file: &Path) -> Result<CsxConfig, ConfigError> {
    let start_dir = input_file.parent().unwrap_or_else(|| Path::new("."));
    let config_path = find_config(start_dir)
        .ok_or_else(|| ConfigError::NotFound(start_dir.display().to_string()))?;
    load_config(&config_path)
}
