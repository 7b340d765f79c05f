//! Configuration management

use crate::descriptors::PadelSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Descriptor Engine Defaults
// ============================================================================

/// Default Java launcher, resolved through `PATH`.
pub const DEFAULT_JAVA: &str = "java";

/// Default PaDEL-Descriptor jar location.
pub const DEFAULT_PADEL_JAR: &str = "./PaDEL-Descriptor/PaDEL-Descriptor.jar";

/// Default descriptor type configuration.
pub const DEFAULT_DESCRIPTOR_TYPES: &str = "./PaDEL-Descriptor/PubchemFingerprinter.xml";

/// Default JVM heap size.
pub const DEFAULT_JAVA_HEAP: &str = "2G";

/// Default descriptor engine timeout in seconds (10 minutes).
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 600;

// ============================================================================
// Model Defaults
// ============================================================================

/// Default model artifact location.
pub const DEFAULT_MODEL_PATH: &str = "./bioactivity_prediction_model.json";

/// Default feature schema location.
pub const DEFAULT_SCHEMA_PATH: &str = "./descriptor_list.csv";

/// Environment variables read by [`PipelineConfig::load`]
pub const ENV_VARS: [&str; 8] = [
    "POTENCY_JAVA",
    "POTENCY_PADEL_JAR",
    "POTENCY_DESCRIPTOR_TYPES",
    "POTENCY_JAVA_HEAP",
    "POTENCY_ENGINE_TIMEOUT_SECS",
    "POTENCY_MODEL_PATH",
    "POTENCY_SCHEMA_PATH",
    "POTENCY_WORK_DIR",
];

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub java: PathBuf,
    pub padel_jar: PathBuf,
    pub descriptor_types: PathBuf,
    pub java_heap: String,
    pub engine_timeout_secs: u64,
    pub model_path: PathBuf,
    pub schema_path: PathBuf,
    /// Parent of per-request workspaces; system temp dir when unset
    pub work_dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// Load configuration from `.env`, the environment, and defaults
    ///
    /// The result is not validated; callers layer their own overrides on top
    /// and call [`PipelineConfig::validate`] on the final value.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str, default: &str| PathBuf::from(var(key).unwrap_or_else(|| default.to_string()));

        Self {
            java: path("POTENCY_JAVA", DEFAULT_JAVA),
            padel_jar: path("POTENCY_PADEL_JAR", DEFAULT_PADEL_JAR),
            descriptor_types: path("POTENCY_DESCRIPTOR_TYPES", DEFAULT_DESCRIPTOR_TYPES),
            java_heap: var("POTENCY_JAVA_HEAP").unwrap_or_else(|| DEFAULT_JAVA_HEAP.to_string()),
            engine_timeout_secs: var("POTENCY_ENGINE_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_ENGINE_TIMEOUT_SECS),
            model_path: path("POTENCY_MODEL_PATH", DEFAULT_MODEL_PATH),
            schema_path: path("POTENCY_SCHEMA_PATH", DEFAULT_SCHEMA_PATH),
            work_dir: var("POTENCY_WORK_DIR")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.engine_timeout_secs == 0 {
            anyhow::bail!("Engine timeout must be greater than 0");
        }

        for (name, path) in [
            ("Java launcher", &self.java),
            ("PaDEL jar", &self.padel_jar),
            ("Descriptor types", &self.descriptor_types),
            ("Model path", &self.model_path),
            ("Schema path", &self.schema_path),
        ] {
            if path.as_os_str().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
        }

        if !is_heap_size(&self.java_heap) {
            anyhow::bail!(
                "Java heap '{}' must be a number with an optional k, m, or g suffix",
                self.java_heap
            );
        }

        Ok(())
    }

    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine_timeout_secs)
    }

    /// Launch settings for the PaDEL-Descriptor engine
    pub fn padel_settings(&self) -> PadelSettings {
        PadelSettings {
            java: self.java.clone(),
            jar: self.padel_jar.clone(),
            descriptor_types: self.descriptor_types.clone(),
            heap: self.java_heap.clone(),
            timeout: self.engine_timeout(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            java: PathBuf::from(DEFAULT_JAVA),
            padel_jar: PathBuf::from(DEFAULT_PADEL_JAR),
            descriptor_types: PathBuf::from(DEFAULT_DESCRIPTOR_TYPES),
            java_heap: DEFAULT_JAVA_HEAP.to_string(),
            engine_timeout_secs: DEFAULT_ENGINE_TIMEOUT_SECS,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            schema_path: PathBuf::from(DEFAULT_SCHEMA_PATH),
            work_dir: None,
        }
    }
}

/// JVM memory size such as `512m` or `2G`
fn is_heap_size(value: &str) -> bool {
    let digits = value.strip_suffix(['k', 'K', 'm', 'M', 'g', 'G']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> PipelineConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineConfig::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[]);
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.engine_timeout(), Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("POTENCY_JAVA", "/usr/lib/jvm/bin/java"),
            ("POTENCY_JAVA_HEAP", "512m"),
            ("POTENCY_ENGINE_TIMEOUT_SECS", "30"),
            ("POTENCY_MODEL_PATH", "/srv/model.json"),
            ("POTENCY_WORK_DIR", "/var/tmp/potency"),
        ]);

        assert_eq!(config.java, PathBuf::from("/usr/lib/jvm/bin/java"));
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
        assert_eq!(config.work_dir, Some(PathBuf::from("/var/tmp/potency")));

        let settings = config.padel_settings();
        assert_eq!(settings.heap, "512m");
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_unparseable_timeout_falls_back() {
        let config = from_map(&[("POTENCY_ENGINE_TIMEOUT_SECS", "soon")]);
        assert_eq!(config.engine_timeout_secs, DEFAULT_ENGINE_TIMEOUT_SECS);
    }

    #[test]
    fn test_validation() {
        let config = from_map(&[("POTENCY_ENGINE_TIMEOUT_SECS", "0")]);
        assert!(config.validate().is_err());

        let config = from_map(&[("POTENCY_JAVA_HEAP", "lots")]);
        assert!(config.validate().unwrap_err().to_string().contains("lots"));

        let mut config = PipelineConfig::default();
        config.model_path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_layer_can_be_overridden() {
        let mut config = from_map(&[("POTENCY_ENGINE_TIMEOUT_SECS", "0")]);
        assert_eq!(config.engine_timeout_secs, 0);

        config.engine_timeout_secs = 30;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_heap_sizes() {
        for ok in ["2G", "512m", "1024", "4g", "64K"] {
            assert!(is_heap_size(ok), "{ok}");
        }
        for bad in ["", "G", "2GB", "-1g", "1.5g"] {
            assert!(!is_heap_size(bad), "{bad}");
        }
    }
}
