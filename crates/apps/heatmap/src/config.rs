use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use foundation::math::ProjectionKind;
use foundation::Chamber;
use scene::{OverlayMetric, Theme};
use serde::{Deserialize, Serialize};
use streaming::DatasetCatalog;
use viewport::{ContainerSize, FallbackTable, ViewportState, DEFAULT_PADDING};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ConfigError::Parse {
                path: Some(path),
                source,
            } => write!(f, "invalid config {}: {source}", path.display()),
            ConfigError::Parse { path: None, source } => write!(f, "invalid config: {source}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Heat-map session settings, read from a JSON file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeatmapConfig {
    /// Dataset URLs and the district capability descriptor.
    pub catalog: DatasetCatalog,
    /// Serve dataset URLs from this directory instead of over HTTP.
    pub data_root: Option<PathBuf>,
    /// JSON array of score records.
    pub scores: Option<PathBuf>,
    pub container: ContainerSize,
    pub padding: f64,
    /// `albers` or `mercator`.
    #[serde(with = "by_name")]
    pub projection: ProjectionKind,
    /// Extra or replacement fallback views, keyed by region name.
    pub fallback: BTreeMap<String, ViewportState>,
    pub theme: Theme,
    pub overlay: OverlayMetric,
    /// `house` or `senate` (`lower`/`upper` are accepted).
    #[serde(with = "by_name")]
    pub chamber: Chamber,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            catalog: DatasetCatalog::default(),
            data_root: None,
            scores: None,
            container: ContainerSize::default(),
            padding: DEFAULT_PADDING,
            projection: ProjectionKind::default(),
            fallback: BTreeMap::new(),
            theme: Theme::default(),
            overlay: OverlayMetric::default(),
            chamber: Chamber::default(),
        }
    }
}

impl HeatmapConfig {
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes)
            .map_err(|source| ConfigError::Parse { path: None, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a config file. Relative `dataRoot` and `scores`
    /// paths resolve against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
                path: Some(path.to_path_buf()),
                source,
            })?;
        if let Some(dir) = path.parent() {
            config.data_root = config.data_root.map(|p| dir.join(p));
            config.scores = config.scores.map(|p| dir.join(p));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ContainerSize { width, height } = self.container;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "container size must be positive, got {width}x{height}"
            )));
        }
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "padding must be non-negative, got {}",
                self.padding
            )));
        }
        let unknown = self.catalog.unknown_district_keys();
        if !unknown.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "district sources for unknown states: {}",
                unknown.join(", ")
            )));
        }
        Ok(())
    }

    /// Built-in fallback views with this config's overrides applied.
    pub fn fallback_table(&self) -> FallbackTable {
        let mut table = FallbackTable::default();
        table.extend(self.fallback.clone());
        table
    }
}

/// Serde for enums written by name in the config file.
mod by_name {
    use foundation::math::ProjectionKind;
    use foundation::Chamber;
    use serde::{Deserialize, Deserializer, Serializer};

    pub trait Named: Sized + Copy {
        const WHAT: &'static str;
        fn parse(s: &str) -> Option<Self>;
        fn as_str(self) -> &'static str;
    }

    impl Named for Chamber {
        const WHAT: &'static str = "chamber";
        fn parse(s: &str) -> Option<Self> {
            Chamber::parse(s)
        }
        fn as_str(self) -> &'static str {
            Chamber::as_str(self)
        }
    }

    impl Named for ProjectionKind {
        const WHAT: &'static str = "projection";
        fn parse(s: &str) -> Option<Self> {
            ProjectionKind::parse(s)
        }
        fn as_str(self) -> &'static str {
            ProjectionKind::as_str(self)
        }
    }

    pub fn serialize<T: Named, S: Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_str())
    }

    pub fn deserialize<'de, T: Named, D: Deserializer<'de>>(d: D) -> Result<T, D::Error> {
        let raw = String::deserialize(d)?;
        T::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown {}: {raw}", T::WHAT)))
    }
}
