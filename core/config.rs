use crate::error::{AppError, Result};
use crate::prompt::{CONTENT_PLACEHOLDER, DEFAULT_PROMPT_TEMPLATE};
use log;
use parse_duration::parse;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_DIR: &str = ".xtools/xreview";
pub const DEFAULT_CONFIG_FILENAME: &str = "xreview.toml";

pub const DEFAULT_EXTENSIONS: [&str; 4] = [".js", ".ts", ".json", ".py"];
pub const DEFAULT_CHUNK_SIZE: usize = 5000;
pub const DEFAULT_RUNNER: &str = "ollama";
pub const DEFAULT_RUNNER_ARGS: [&str; 1] = ["run"];
pub const DEFAULT_MODEL: &str = "mistral";
pub const DEFAULT_REPORT: &str = "project_analysis.txt";
pub const DEFAULT_JOBS: usize = 1;

/// Effective settings for one review run.
///
/// Built from [`Config::default`], optionally overlaid by a TOML file and then
/// by command-line flags. Passed by reference into [`crate::run_review`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub collect: CollectConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CollectConfig {
    /// Case-sensitive file name suffixes, dot included.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Globs matched against paths relative to the project root.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "default_false")]
    pub use_gitignore: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    #[serde(default = "default_chunk_size")]
    pub size: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(default = "default_runner")]
    pub runner: String,
    /// Arguments placed between the runner and the model name.
    #[serde(default = "default_runner_args")]
    pub args: Vec<String>,
    #[serde(default = "default_model")]
    pub name: String,
    /// Per-invocation deadline such as "90s" or "5m". Unset means wait forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PromptConfig {
    #[serde(default = "default_prompt_template")]
    pub template: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default = "default_report_path")]
    pub path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Files analyzed concurrently. 1 keeps the run strictly sequential.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

fn default_false() -> bool {
    false
}
fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}
fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_runner() -> String {
    DEFAULT_RUNNER.to_string()
}
fn default_runner_args() -> Vec<String> {
    DEFAULT_RUNNER_ARGS.iter().map(|s| s.to_string()).collect()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_prompt_template() -> String {
    DEFAULT_PROMPT_TEMPLATE.to_string()
}
fn default_report_path() -> PathBuf {
    PathBuf::from(DEFAULT_REPORT)
}
fn default_jobs() -> usize {
    DEFAULT_JOBS
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude: Vec::new(),
            use_gitignore: default_false(),
        }
    }
}
impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
        }
    }
}
impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            runner: default_runner(),
            args: default_runner_args(),
            name: default_model(),
            timeout: None,
        }
    }
}
impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: default_prompt_template(),
        }
    }
}
impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: default_report_path(),
        }
    }
}
impl Default for RunConfig {
    fn default() -> Self {
        Self { jobs: default_jobs() }
    }
}

impl Config {
    /// Expands `~`, checks the folder exists and canonicalizes it.
    pub fn determine_project_root(cli_project_root: &Path) -> Result<PathBuf> {
        let path_str = cli_project_root.to_string_lossy();
        let path_to_resolve = PathBuf::from(shellexpand::tilde(&path_str).as_ref());

        if !path_to_resolve.is_dir() {
            return Err(AppError::ProjectNotFound(path_to_resolve));
        }

        path_to_resolve.canonicalize().map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to canonicalize project root '{}': {}",
                    path_to_resolve.display(),
                    e
                ),
            ))
        })
    }

    pub fn resolve_config_path(
        project_root: &Path,
        cli_config_file: Option<&Path>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p) => {
                let expanded = shellexpand::tilde(&p.to_string_lossy()).into_owned();
                let mut path = PathBuf::from(expanded);
                if !path.exists() && path.extension().is_none() {
                    path.set_extension("toml");
                }
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = project_root
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILENAME);
                if default_path.exists() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        toml::from_str::<Config>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn get_timeout(&self) -> Result<Option<Duration>> {
        match self.model.timeout.as_deref() {
            None => Ok(None),
            Some(raw) => parse(raw).map(Some).map_err(|e| {
                AppError::DurationParse(format!(
                    "Invalid model timeout '{}': {}. Use format like '90s', '5m'.",
                    raw, e
                ))
            }),
        }
    }

    /// Rejects settings that would make the run loop forever or produce nothing.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.size == 0 {
            return Err(AppError::Chunking(
                "Chunk size must be a positive number of characters".to_string(),
            ));
        }
        if self.run.jobs == 0 {
            return Err(AppError::InvalidArgument(
                "Number of jobs must be at least 1".to_string(),
            ));
        }
        if self.collect.extensions.is_empty() {
            return Err(AppError::Config(
                "At least one file extension must be configured".to_string(),
            ));
        }
        if self.model.runner.trim().is_empty() {
            return Err(AppError::Config("Model runner must not be empty".to_string()));
        }
        if !self.prompt.template.contains(CONTENT_PLACEHOLDER) {
            return Err(AppError::Config(format!(
                "Prompt template must contain the {} placeholder",
                CONTENT_PLACEHOLDER
            )));
        }
        if self.get_timeout()?.is_some_and(|d| d.is_zero()) {
            return Err(AppError::InvalidArgument(
                "Model timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.collect.extensions, vec![".js", ".ts", ".json", ".py"]);
        assert_eq!(config.chunking.size, 5000);
        assert_eq!(config.model.runner, "ollama");
        assert_eq!(config.model.args, vec!["run"]);
        assert_eq!(config.model.name, "mistral");
        assert_eq!(config.report.path, PathBuf::from("project_analysis.txt"));
        assert_eq!(config.run.jobs, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [model]
            name = "llama3"
            timeout = "90s"

            [chunking]
            size = 1200
            "#,
        )
        .unwrap();
        assert_eq!(config.model.name, "llama3");
        assert_eq!(config.model.runner, "ollama");
        assert_eq!(config.chunking.size, 1200);
        assert_eq!(config.get_timeout().unwrap(), Some(Duration::from_secs(90)));
        assert_eq!(config.collect, CollectConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed = toml::from_str::<Config>("[model]\nflavour = \"spicy\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn validate_rejects_zero_chunk_size() {
        let mut config = Config::default();
        config.chunking.size = 0;
        assert!(matches!(config.validate(), Err(AppError::Chunking(_))));
    }

    #[test]
    fn validate_rejects_template_without_content() {
        let mut config = Config::default();
        config.prompt.template = "Review {file_path}".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn validate_rejects_bad_timeout() {
        let mut config = Config::default();
        config.model.timeout = Some("soon".to_string());
        assert!(matches!(config.validate(), Err(AppError::DurationParse(_))));
    }

    #[test]
    fn toml_output_loads_back() {
        let mut config = Config::default();
        config.collect.exclude = vec!["node_modules/".to_string()];
        let text = config.to_toml_string().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn missing_project_root_is_reported() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            Config::determine_project_root(&missing),
            Err(AppError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn default_config_file_is_picked_up() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(Config::resolve_config_path(tmp.path(), None, false).unwrap(), None);

        let dir = tmp.path().join(DEFAULT_CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(DEFAULT_CONFIG_FILENAME), "[run]\njobs = 3\n").unwrap();

        let resolved = Config::resolve_config_path(tmp.path(), None, false)
            .unwrap()
            .unwrap();
        assert_eq!(Config::load_from_path(&resolved).unwrap().run.jobs, 3);
        assert_eq!(Config::resolve_config_path(tmp.path(), None, true).unwrap(), None);
    }
}
