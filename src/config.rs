use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Error loading a parser configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Knobs shared by both parser passes.
///
/// ```toml
/// max_errors = 25
/// strict_mode = true
/// allow_undefined_variables = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Error budget for one parse. `0` means unlimited.
    pub max_errors: usize,
    /// Report unknown decorator names instead of keeping them as text.
    pub strict_mode: bool,
    /// Skip the `@var` reference check after building.
    pub allow_undefined_variables: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_errors: 10,
            strict_mode: false,
            allow_undefined_variables: true,
        }
    }
}

impl ParserConfig {
    /// Configuration that never stops collecting errors.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_errors: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    #[must_use]
    pub const fn max_errors(mut self, max: usize) -> Self {
        self.max_errors = max;
        self
    }

    #[must_use]
    pub const fn allow_undefined_variables(mut self, allow: bool) -> Self {
        self.allow_undefined_variables = allow;
        self
    }

    /// Budget as an option; `None` when unlimited.
    #[must_use]
    pub const fn error_limit(&self) -> Option<usize> {
        if self.max_errors == 0 {
            None
        } else {
            Some(self.max_errors)
        }
    }

    /// Parse a configuration from TOML text. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] on malformed input or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded parser config");
        Ok(config)
    }
}
