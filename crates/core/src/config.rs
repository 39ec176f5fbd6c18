//! Parse options: column defaults, the branch sentinel, the block
//! randomization marker and the id of the implicit block.
//!
//! Options can be built in code or read from a TOML file:
//!
//! ```toml
//! next_sentinel = "NEXT"
//! randomize_marker = "_"
//!
//! [defaults]
//! exclusive = true
//! ordered = false
//! ```

use crate::columns;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Value a flag column takes when the column is absent or never filled in
/// for a question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnDefaults {
    pub exclusive: bool,
    pub ordered: bool,
    pub randomize: bool,
    pub freetext: bool,
}

impl Default for ColumnDefaults {
    fn default() -> Self {
        ColumnDefaults {
            exclusive: true,
            ordered: false,
            randomize: true,
            freetext: false,
        }
    }
}

impl ColumnDefaults {
    /// Default for a flag column; `None` for columns that are not flags.
    pub fn for_column(&self, column: &str) -> Option<bool> {
        match column {
            columns::EXCLUSIVE => Some(self.exclusive),
            columns::ORDERED => Some(self.ordered),
            columns::RANDOMIZE => Some(self.randomize),
            columns::FREETEXT => Some(self.freetext),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParseOptions {
    pub defaults: ColumnDefaults,
    /// Branch target meaning "advance to the next block in sequence".
    /// Compared case-insensitively.
    pub next_sentinel: String,
    /// Prefix on a block id segment marking it as randomizable.
    pub randomize_marker: char,
    /// Id given to the single block synthesized when no block is declared.
    pub implicit_block_id: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            defaults: ColumnDefaults::default(),
            next_sentinel: "NEXT".to_owned(),
            randomize_marker: '_',
            implicit_block_id: "1".to_owned(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse options: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid options: {0}")]
    Invalid(String),
}

impl ParseOptions {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let options: ParseOptions = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ParseOptions::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.next_sentinel.trim().is_empty() {
            return Err(ConfigError::Invalid("next_sentinel must not be empty".to_owned()));
        }
        if self.randomize_marker == '.' || self.randomize_marker.is_ascii_digit() {
            return Err(ConfigError::Invalid(format!(
                "randomize_marker '{}' collides with block id syntax",
                self.randomize_marker
            )));
        }
        crate::block_id::BlockId::parse(&self.implicit_block_id, self.randomize_marker)
            .map_err(|msg| ConfigError::Invalid(format!("implicit_block_id: {}", msg)))?;
        Ok(())
    }
}
