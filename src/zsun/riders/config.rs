use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::zsun::riders::error::{Result, RiderError};

pub const DEFAULT_SHEET_NAME: &str = "Squad";
pub const DEFAULT_DUMP_SHEET_NAME: &str = "Dump";
pub const DEFAULT_HEADER_ROW: u32 = 1;
pub const DEFAULT_ROW_LIMIT: u32 = 1000;

/// Settings for one sync run.
///
/// Loaded from a TOML file when one is given; command line flags override
/// individual values afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Sheet whose rows are updated in place.
    pub sheet_name: String,
    /// Sheet rewritten by a full dump.
    pub dump_sheet_name: String,
    /// 1-based row holding the column headers; data starts below it.
    pub header_row: u32,
    /// Last sheet row (1-based, inclusive) the differ looks at.
    pub row_limit: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            dump_sheet_name: DEFAULT_DUMP_SHEET_NAME.to_string(),
            header_row: DEFAULT_HEADER_ROW,
            row_limit: DEFAULT_ROW_LIMIT,
        }
    }
}

impl SyncConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: SyncConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RiderError::MissingInput(path.to_path_buf()));
        }
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// First data row, directly below the header.
    pub fn first_data_row(&self) -> u32 {
        self.header_row.saturating_add(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sheet_name.trim().is_empty() || self.dump_sheet_name.trim().is_empty() {
            return Err(RiderError::Config("sheet names must not be empty".into()));
        }
        if self.header_row == 0 {
            return Err(RiderError::Config("header_row is 1-based".into()));
        }
        if self.row_limit < self.header_row {
            return Err(RiderError::Config(format!(
                "row_limit {} lies above header_row {}",
                self.row_limit, self.header_row
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = SyncConfig::from_toml_str("sheet_name = \"Riders\"\nheader_row = 10\n")
            .expect("valid config");
        assert_eq!(config.sheet_name, "Riders");
        assert_eq!(config.header_row, 10);
        assert_eq!(config.first_data_row(), 11);
        assert_eq!(config.row_limit, DEFAULT_ROW_LIMIT);
        assert_eq!(config.dump_sheet_name, DEFAULT_DUMP_SHEET_NAME);
    }

    #[test]
    fn rejects_inconsistent_values() {
        assert!(matches!(
            SyncConfig::from_toml_str("header_row = 0"),
            Err(RiderError::Config(_))
        ));
        assert!(matches!(
            SyncConfig::from_toml_str("header_row = 20\nrow_limit = 5"),
            Err(RiderError::Config(_))
        ));
        assert!(matches!(
            SyncConfig::from_toml_str("sheet = \"typo\""),
            Err(RiderError::ConfigFile(_))
        ));
    }
}
