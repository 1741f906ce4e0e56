use serde::{Deserialize, Serialize};

/// Tuning for grouping and name display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Base collapse-unit size: the bucket size grouping starts from and
    /// grows by.
    pub collapse_unit_size: usize,

    /// Maximum direct children a node may show before grouping kicks in;
    /// also the cap on the grown bucket size.
    pub collapse_unit_threshold: usize,

    /// Accumulation bound for full path names, in characters. Heap graphs
    /// can contain arbitrarily deep reference chains (linked lists), which
    /// would otherwise produce unbounded labels.
    pub max_full_name_len: usize,

    /// Marker inserted once at the front of a truncated full path name.
    pub truncation_marker: String,

    /// Separator between path segments of a full path name.
    pub path_separator: char,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            collapse_unit_size: 500,
            collapse_unit_threshold: 1000,
            max_full_name_len: 100,
            truncation_marker: "[...]".to_string(),
            path_separator: '.',
        }
    }
}

impl BrowserConfig {
    /// Small buckets for unit tests and tiny snapshots.
    pub fn compact() -> Self {
        Self {
            collapse_unit_size: 10,
            collapse_unit_threshold: 20,
            ..Default::default()
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.collapse_unit_size == 0 {
            return Err("collapse_unit_size must be > 0".to_string());
        }
        if self.collapse_unit_threshold < self.collapse_unit_size {
            return Err(format!(
                "collapse_unit_threshold ({}) cannot be smaller than collapse_unit_size ({})",
                self.collapse_unit_threshold, self.collapse_unit_size
            ));
        }
        if self.max_full_name_len == 0 {
            return Err("max_full_name_len must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_valid() {
        assert!(BrowserConfig::default().validate().is_ok());
        assert!(BrowserConfig::compact().validate().is_ok());
    }

    #[test]
    fn config_validation() {
        let mut config = BrowserConfig::default();

        config.collapse_unit_size = 0;
        assert!(config.validate().is_err());

        config.collapse_unit_size = 500;
        config.collapse_unit_threshold = 100;
        assert!(config.validate().is_err());

        config.collapse_unit_threshold = 1000;
        config.max_full_name_len = 0;
        assert!(config.validate().is_err());
    }
}
