//! Configuration management for topicshelf.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config file (`.topicshelf/config.yaml` or an explicit path)
//! - Environment variables
//! - Command-line flags
//!
//! Relative storage paths are resolved against the workspace root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".topicshelf";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .topicshelf/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Where vectors and topic folders live
    pub storage: StorageConfig,

    /// Embedding providers per collection
    pub models: ModelsConfig,

    /// Topic inference parameters
    pub inference: InferenceConfig,

    /// Paper chunking parameters
    pub chunking: ChunkingConfig,
}

/// Storage locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    /// LanceDB database directory
    pub persist_dir: PathBuf,

    /// Root of the per-topic paper copies
    pub paper_dir: PathBuf,

    /// Root of the per-topic image copies
    pub image_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persist_dir: PathBuf::from(STATE_DIR).join("vectors"),
            paper_dir: PathBuf::from("library").join("papers"),
            image_dir: PathBuf::from("library").join("images"),
        }
    }
}

/// Embedding provider selection for each collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelsConfig {
    /// Text embedder for paper chunks and paper queries
    pub paper: ProviderConfig,

    /// Multimodal embedder for images
    pub image: ProviderConfig,

    /// Text embedder for image queries (must share the image embedding space)
    pub image_text: ProviderConfig,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        let ark = ProviderConfig::Ark {
            base_url: default_ark_url(),
            model: "doubao-embedding-vision-250615".to_string(),
            api_key_env: default_ark_key_env(),
        };
        Self {
            paper: ProviderConfig::OpenAi {
                base_url: default_openai_url(),
                model: "text-embedding-3-small".to_string(),
                api_key_env: default_openai_key_env(),
            },
            image: ark.clone(),
            image_text: ark,
        }
    }
}

/// Provider-specific configuration, selected by the `service` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "service", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ProviderConfig {
    /// OpenAI-compatible `/embeddings` endpoint (text only)
    OpenAi {
        #[serde(default = "default_openai_url")]
        base_url: String,
        model: String,
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,
    },
    /// Volcengine Ark multimodal embeddings (text and image)
    Ark {
        #[serde(default = "default_ark_url")]
        base_url: String,
        model: String,
        #[serde(default = "default_ark_key_env")]
        api_key_env: String,
    },
    /// Local Ollama runtime (text only)
    Ollama {
        #[serde(default = "default_ollama_url")]
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
    /// Deterministic offline embeddings
    Mock {
        #[serde(default = "default_mock_dimensions")]
        dimensions: usize,
    },
}

impl ProviderConfig {
    /// Service name as written in the config file.
    pub fn service(&self) -> &'static str {
        match self {
            Self::OpenAi { .. } => "openai",
            Self::Ark { .. } => "ark",
            Self::Ollama { .. } => "ollama",
            Self::Mock { .. } => "mock",
        }
    }

    /// Environment variable holding the API key, if the service needs one.
    pub fn api_key_env(&self) -> Option<&str> {
        match self {
            Self::OpenAi { api_key_env, .. } | Self::Ark { api_key_env, .. } => {
                Some(api_key_env.as_str())
            }
            Self::Ollama { .. } | Self::Mock { .. } => None,
        }
    }
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_ark_url() -> String {
    "https://ark.cn-beijing.volces.com/api/v3".to_string()
}

fn default_ark_key_env() -> String {
    "ARK_API_KEY".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_mock_dimensions() -> usize {
    384
}

/// k-NN topic vote parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct InferenceConfig {
    /// Neighbors consulted per vote
    pub search_top_k: usize,

    /// Topics kept from the tally
    pub num_return: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            search_top_k: 3,
            num_return: 1,
        }
    }
}

/// Paper chunking parameters (in characters).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 0,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    storage: Option<StorageConfig>,
    models: Option<ModelsConfig>,
    inference: Option<InferenceConfig>,
    chunking: Option<ChunkingConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            storage: StorageConfig::default(),
            models: ModelsConfig::default(),
            inference: InferenceConfig::default(),
            chunking: ChunkingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// `workspace` and `config_file` take precedence over
    /// `TOPICSHELF_WORKSPACE` and `TOPICSHELF_CONFIG`.
    ///
    /// Environment variables:
    /// - `TOPICSHELF_WORKSPACE`: Override workspace path
    /// - `TOPICSHELF_CONFIG`: Path to config file
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("TOPICSHELF_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("TOPICSHELF_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.is_dir() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.state_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment overrides the file
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(contents)?
        };

        let mut result = self.clone();

        if let Some(storage) = config_file.storage {
            result.storage = storage;
        }
        if let Some(models) = config_file.models {
            result.models = models;
        }
        if let Some(inference) = config_file.inference {
            result.inference = inference;
        }
        if let Some(chunking) = config_file.chunking {
            result.chunking = chunking;
        }
        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    pub fn with_overrides(mut self, log_level: Option<String>, verbose: bool, no_color: bool) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .topicshelf directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the .topicshelf directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Resolve a configured path against the workspace.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Absolute LanceDB directory.
    pub fn persist_dir(&self) -> PathBuf {
        self.resolve(&self.storage.persist_dir)
    }

    /// Absolute root of the paper topic folders.
    pub fn paper_dir(&self) -> PathBuf {
        self.resolve(&self.storage.paper_dir)
    }

    /// Absolute root of the image topic folders.
    pub fn image_dir(&self) -> PathBuf {
        self.resolve(&self.storage.image_dir)
    }

    /// Resolve the API key for a provider from its configured environment variable.
    ///
    /// Returns `Ok(None)` for providers that need no key.
    pub fn resolve_api_key(&self, provider: &ProviderConfig) -> AppResult<Option<String>> {
        match provider.api_key_env() {
            None => Ok(None),
            Some(env_var) => match std::env::var(env_var) {
                Ok(key) if !key.trim().is_empty() => Ok(Some(key)),
                _ => Err(AppError::Config(format!(
                    "API key for '{}' not found in environment variable: {}",
                    provider.service(),
                    env_var
                ))),
            },
        }
    }

    /// Validate numeric parameters.
    pub fn validate(&self) -> AppResult<()> {
        if self.inference.search_top_k == 0 {
            return Err(AppError::Config(
                "inference.searchTopK must be at least 1".to_string(),
            ));
        }

        if self.inference.num_return == 0 {
            return Err(AppError::Config(
                "inference.numReturn must be at least 1".to_string(),
            ));
        }

        if self.chunking.chunk_size == 0 {
            return Err(AppError::Config(
                "chunking.chunkSize must be at least 1".to_string(),
            ));
        }

        if self.chunking.overlap >= self.chunking.chunk_size {
            return Err(AppError::Config(format!(
                "chunking.overlap ({}) must be smaller than chunking.chunkSize ({})",
                self.chunking.overlap, self.chunking.chunk_size
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.inference.search_top_k, 3);
        assert_eq!(config.inference.num_return, 1);
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.overlap, 0);
        assert_eq!(config.models.paper.service(), "openai");
        assert_eq!(config.models.image.service(), "ark");
        assert!(!config.verbose);
    }

    #[test]
    fn test_state_dir() {
        let config = AppConfig::default();
        assert!(config.state_dir().ends_with(".topicshelf"));
    }

    #[test]
    fn test_ensure_state_dir() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..AppConfig::default()
        };

        config.ensure_state_dir().unwrap();
        config.ensure_state_dir().unwrap();
        assert!(temp.path().join(STATE_DIR).is_dir());
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(None, true, true);
        assert!(config.verbose);
        assert!(config.no_color);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_partial_yaml() {
        let yaml = r#"
storage:
  paperDir: shelf/papers
models:
  paper:
    service: ollama
    model: nomic-embed-text
  image:
    service: mock
    dimensions: 8
inference:
  searchTopK: 5
logging:
  level: info
  color: false
"#;
        let config = AppConfig::default().merge_yaml_str(yaml).unwrap();

        assert_eq!(config.storage.paper_dir, PathBuf::from("shelf/papers"));
        assert_eq!(config.storage.image_dir, PathBuf::from("library/images"));
        assert_eq!(
            config.models.paper,
            ProviderConfig::Ollama {
                endpoint: "http://localhost:11434".to_string(),
                model: "nomic-embed-text".to_string(),
                timeout: None,
            }
        );
        assert_eq!(config.models.image, ProviderConfig::Mock { dimensions: 8 });
        assert_eq!(config.models.image_text.service(), "ark");
        assert_eq!(config.inference.search_top_k, 5);
        assert_eq!(config.inference.num_return, 1);
        assert_eq!(config.log_level, Some("info".to_string()));
        assert!(config.no_color);
    }

    #[test]
    fn test_merge_rejects_unknown_service() {
        let yaml = "models:\n  paper:\n    service: cohere\n    model: x\n";
        assert!(AppConfig::default().merge_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_load_from_workspace_file() {
        let temp = TempDir::new().unwrap();
        let state = temp.path().join(STATE_DIR);
        std::fs::create_dir_all(&state).unwrap();
        std::fs::write(
            state.join("config.yaml"),
            "chunking:\n  chunkSize: 1024\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.chunking.chunk_size, 1024);
        assert_eq!(config.paper_dir(), temp.path().join("library").join("papers"));
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("nope.yaml")),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_resolve_keeps_absolute_paths() {
        let config = AppConfig::default();
        let abs = std::env::temp_dir().join("vectors");
        assert_eq!(config.resolve(&abs), abs);
    }

    #[test]
    fn test_mock_needs_no_api_key() {
        let config = AppConfig::default();
        let key = config
            .resolve_api_key(&ProviderConfig::Mock { dimensions: 4 })
            .unwrap();
        assert!(key.is_none());
    }

    #[test]
    fn test_validate_overlap() {
        let mut config = AppConfig::default();
        config.chunking.overlap = 500;
        assert!(config.validate().is_err());

        config.chunking.overlap = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_top_k() {
        let mut config = AppConfig::default();
        config.inference.search_top_k = 0;
        assert!(config.validate().is_err());
    }
}
