use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tessera::partition::{DEFAULT_LLOYD_ITERATIONS, DEFAULT_TAB_RATIO};
use tessera::solver::{DEFAULT_ACCEPTANCE_THRESHOLD, DEFAULT_BFS_THRESHOLD, DEFAULT_TOP_K};
use tessera::{SiteSeeding, DEFAULT_SIGNATURE_DEPTH};

use crate::error::AppError;

/// Environment variable naming the config file when `--config` is absent
pub const CONFIG_ENV_VAR: &str = "PIECEWORKS_CONFIG";

/// Config file looked up in the working directory as a last resort
pub const DEFAULT_CONFIG_FILE: &str = "pieceworks.yaml";

/// Application configuration loaded from pieceworks.yaml
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Partitioner settings
    pub shatter: ShatterConfig,

    /// Solver and output settings
    pub rebuild: RebuildConfig,
}

/// How Voronoi sites are seeded
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeedingConfig {
    #[default]
    Uniform,
    JitteredGrid,
}

impl From<SeedingConfig> for SiteSeeding {
    fn from(seeding: SeedingConfig) -> Self {
        match seeding {
            SeedingConfig::Uniform => SiteSeeding::Uniform,
            SeedingConfig::JitteredGrid => SiteSeeding::JitteredGrid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShatterConfig {
    /// Lloyd relaxation passes for Voronoi sites
    pub lloyd_iterations: usize,

    pub seeding: SeedingConfig,

    /// Jigsaw tab radius as a fraction of the shorter body side
    pub tab_ratio: f32,
}

impl Default for ShatterConfig {
    fn default() -> Self {
        Self {
            lloyd_iterations: DEFAULT_LLOYD_ITERATIONS,
            seeding: SeedingConfig::default(),
            tab_ratio: DEFAULT_TAB_RATIO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RebuildConfig {
    /// Candidates tried per cell by the backtracking solver
    pub top_k: usize,

    /// Retry once with this many candidates when `top_k` is exhausted
    pub widen_top_k: Option<usize>,

    /// Strip depth in pixels for color signatures
    pub signature_depth: u32,

    /// Piece count from which the breadth-first solver takes over
    pub bfs_threshold: usize,

    /// Highest rim score the breadth-first solver accepts
    pub acceptance_threshold: f32,

    /// File name of the reconstruction
    pub output_name: String,

    /// Re-compress the reconstruction with oxipng
    pub optimize_png: bool,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            widen_top_k: None,
            signature_depth: DEFAULT_SIGNATURE_DEPTH,
            bfs_threshold: DEFAULT_BFS_THRESHOLD,
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
            output_name: "reconstructed.png".to_string(),
            optimize_png: false,
        }
    }
}

impl AppConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self, AppError> {
        serde_yaml::from_str(content).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Resolve the config path: explicit path, then `PIECEWORKS_CONFIG`,
    /// then `pieceworks.yaml` in the working directory.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from a file.
    ///
    /// A missing file falls back to defaults; a file that exists but does
    /// not parse is an error.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config = Self::from_yaml_str(&content)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            top_k = config.rebuild.top_k,
            bfs_threshold = config.rebuild.bfs_threshold,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Reject values the solvers and partitioners cannot work with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.rebuild.top_k == 0 {
            return Err(AppError::Config("rebuild.top_k must be at least 1".into()));
        }
        if let Some(widen) = self.rebuild.widen_top_k {
            if widen <= self.rebuild.top_k {
                return Err(AppError::Config(format!(
                    "rebuild.widen_top_k ({widen}) must exceed rebuild.top_k ({})",
                    self.rebuild.top_k
                )));
            }
        }
        if self.rebuild.signature_depth == 0 {
            return Err(AppError::Config(
                "rebuild.signature_depth must be at least 1".into(),
            ));
        }
        if self.rebuild.output_name.is_empty()
            || self.rebuild.output_name.contains(['/', '\\'])
        {
            return Err(AppError::Config(format!(
                "rebuild.output_name must be a plain file name, got {:?}",
                self.rebuild.output_name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.shatter.lloyd_iterations, 10);
        assert_eq!(config.shatter.seeding, SeedingConfig::Uniform);
        assert_eq!(config.shatter.tab_ratio, 0.3);
        assert_eq!(config.rebuild.top_k, 5);
        assert_eq!(config.rebuild.widen_top_k, None);
        assert_eq!(config.rebuild.signature_depth, 3);
        assert_eq!(config.rebuild.bfs_threshold, 64);
        assert_eq!(config.rebuild.output_name, "reconstructed.png");
        assert!(!config.rebuild.optimize_png);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
shatter:
  lloyd_iterations: 4
  seeding: jittered-grid
rebuild:
  top_k: 3
  widen_top_k: 8
  output_name: out.png
  optimize_png: true
"#;

        let config = AppConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.shatter.lloyd_iterations, 4);
        assert_eq!(config.shatter.seeding, SeedingConfig::JitteredGrid);
        // Unset fields keep their defaults
        assert_eq!(config.shatter.tab_ratio, 0.3);
        assert_eq!(config.rebuild.top_k, 3);
        assert_eq!(config.rebuild.widen_top_k, Some(8));
        assert_eq!(config.rebuild.bfs_threshold, 64);
        assert_eq!(config.rebuild.output_name, "out.png");
        assert!(config.rebuild.optimize_png);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = AppConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_unknown_field_is_config_error() {
        let result = AppConfig::from_yaml_str("rebuld:\n  top_k: 3\n");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_unknown_seeding_is_config_error() {
        let result = AppConfig::from_yaml_str("shatter:\n  seeding: hexagonal\n");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_narrow_widen() {
        let mut config = AppConfig::default();
        config.rebuild.widen_top_k = Some(5);
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.rebuild.widen_top_k = Some(9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = AppConfig::default();
        config.rebuild.top_k = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_output_path() {
        let mut config = AppConfig::default();
        config.rebuild.output_name = "../escape.png".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pieceworks.yaml");
        std::fs::write(&path, "rebuild: [not, a, map]\n").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pieceworks.yaml");
        std::fs::write(&path, "rebuild:\n  bfs_threshold: 10\n").unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.rebuild.bfs_threshold, 10);
    }

    #[test]
    fn test_resolve_explicit_path_wins() {
        let path = AppConfig::resolve_path(Some(Path::new("custom.yaml")));
        assert_eq!(path, PathBuf::from("custom.yaml"));
    }

    #[test]
    fn test_seeding_converts() {
        assert_eq!(
            SiteSeeding::from(SeedingConfig::JitteredGrid),
            SiteSeeding::JitteredGrid
        );
        assert_eq!(SiteSeeding::from(SeedingConfig::Uniform), SiteSeeding::Uniform);
    }
}
