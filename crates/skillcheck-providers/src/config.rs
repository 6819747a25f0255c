//! skillcheck configuration and collaborator factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use skillcheck_core::driver::{Collaborators, DriverConfig};
use skillcheck_core::engine::DEFAULT_BATCH_SIZE;
use skillcheck_core::model::{Difficulty, DEFAULT_ROLE};
use skillcheck_core::scoring::{ThresholdRecommender, TierThresholds};

use crate::huggingface::HuggingFaceProvider;
use crate::offline::{OfflineExplainer, StaticQuestionSource};

/// Where questions, explanations and recommendations come from.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Bundled bank, or a bank file on disk.
    Offline {
        #[serde(default)]
        bank_path: Option<PathBuf>,
    },
    HuggingFace {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Offline { bank_path } => f
                .debug_struct("Offline")
                .field("bank_path", bank_path)
                .finish(),
            ProviderConfig::HuggingFace {
                api_key: _,
                base_url,
                model,
            } => f
                .debug_struct("HuggingFace")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Offline { bank_path: None }
    }
}

/// How the closing recommendation is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStrategy {
    /// Local score thresholds.
    #[default]
    Thresholds,
    /// Ask the configured provider.
    Provider,
}

/// Top-level skillcheck configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillcheckConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Questions per page.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Questions to request (0 = whatever the source offers).
    #[serde(default)]
    pub question_count: usize,
    #[serde(default = "default_role")]
    pub default_role: String,
    #[serde(default)]
    pub default_difficulty: Difficulty,
    #[serde(default)]
    pub recommendation: RecommendationStrategy,
    #[serde(default)]
    pub thresholds: TierThresholds,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./skillcheck-results")
}

impl Default for SkillcheckConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            batch_size: default_batch_size(),
            question_count: 0,
            default_role: default_role(),
            default_difficulty: Difficulty::default(),
            recommendation: RecommendationStrategy::default(),
            thresholds: TierThresholds::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl SkillcheckConfig {
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            batch_size: self.batch_size,
            question_count: self.question_count,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Offline { bank_path } => ProviderConfig::Offline {
            bank_path: bank_path
                .as_ref()
                .map(|p| PathBuf::from(resolve_env_vars(&p.to_string_lossy()))),
        },
        ProviderConfig::HuggingFace {
            api_key,
            base_url,
            model,
        } => ProviderConfig::HuggingFace {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            model: model.as_ref().map(|m| resolve_env_vars(m)),
        },
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `skillcheck.toml` in the current directory
/// 2. `~/.config/skillcheck/config.toml`
///
/// Environment variable overrides: `SKILLCHECK_HF_API_KEY`, then `HF_API_KEY`.
pub fn load_config_from(path: Option<&Path>) -> Result<SkillcheckConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("skillcheck.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => SkillcheckConfig::default(),
    };

    let key_override = std::env::var("SKILLCHECK_HF_API_KEY")
        .or_else(|_| std::env::var("HF_API_KEY"))
        .ok();
    if let (Some(key), ProviderConfig::HuggingFace { api_key, .. }) =
        (key_override, &mut config.provider)
    {
        *api_key = key;
    }

    config.provider = resolve_provider_config(&config.provider);
    Ok(config)
}

/// Parse and sanity-check a config document.
pub fn parse_config_str(content: &str) -> Result<SkillcheckConfig> {
    let config: SkillcheckConfig = toml::from_str(content)?;
    anyhow::ensure!(config.batch_size >= 1, "batch_size must be at least 1");
    anyhow::ensure!(
        config.thresholds.solid <= config.thresholds.strong,
        "thresholds.solid must not exceed thresholds.strong"
    );
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("skillcheck"))
}

/// Build the collaborators a session needs from configuration.
pub fn create_collaborators(config: &SkillcheckConfig) -> Result<Collaborators> {
    let thresholds = ThresholdRecommender::new(config.thresholds);

    match &config.provider {
        ProviderConfig::Offline { bank_path } => {
            let source = match bank_path {
                Some(path) => StaticQuestionSource::from_path(path)?,
                None => StaticQuestionSource::bundled()?,
            };
            if config.recommendation == RecommendationStrategy::Provider {
                tracing::warn!("offline provider has no recommendation backend, using thresholds");
            }
            Ok(Collaborators {
                questions: Arc::new(source),
                explanations: Arc::new(OfflineExplainer),
                recommendations: Arc::new(thresholds),
            })
        }
        ProviderConfig::HuggingFace {
            api_key,
            base_url,
            model,
        } => {
            if api_key.is_empty() {
                tracing::warn!("huggingface api_key is empty, requests will be rejected");
            }
            let remote = Arc::new(HuggingFaceProvider::new(
                api_key,
                base_url.clone(),
                model.clone(),
            )?);
            tracing::info!(
                model = remote.model(),
                recommendation = ?config.recommendation,
                "using huggingface provider"
            );
            Ok(Collaborators {
                questions: remote.clone(),
                explanations: remote.clone(),
                recommendations: match config.recommendation {
                    RecommendationStrategy::Provider => remote,
                    RecommendationStrategy::Thresholds => Arc::new(thresholds),
                },
            })
        }
    }
}
