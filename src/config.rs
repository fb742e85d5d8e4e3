use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which column feeds the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorField {
    #[default]
    Title,
    KpiName,
}

impl DescriptorField {
    pub fn column(self) -> &'static str {
        match self {
            DescriptorField::Title => "title",
            DescriptorField::KpiName => "kpiName",
        }
    }
}

/// Basic reports group and count only; extended reports also classify
/// each alert by ETA breach and business relevance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Basic,
    #[default]
    Extended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// First business hour, inclusive.
    pub business_start_hour: u32,
    /// End of the business window, exclusive.
    pub business_end_hour: u32,
    /// Substrings of the environment tag that force Non-Business.
    pub excluded_environments: Vec<String>,
    /// Substrings of the latest update category that force Non-Business.
    pub suppressed_update_categories: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            business_start_hour: 7,
            business_end_hour: 23,
            excluded_environments: vec!["DR".to_string(), "REPLICA".to_string()],
            suppressed_update_categories: vec!["SUPPRESSED BY CR".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub descriptor: DescriptorField,
    pub variant: Variant,
    pub classifier: ClassifierConfig,
    /// Issues kept in each application's top list.
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            descriptor: DescriptorField::default(),
            variant: Variant::default(),
            classifier: ClassifierConfig::default(),
            top_n: 10,
        }
    }
}

impl ReportConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ReportError> {
        let cfg: ReportConfig = serde_json::from_str(s).map_err(|e| ReportError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        let c = &self.classifier;
        if c.business_end_hour > 24 {
            return Err(ReportError::Config(format!(
                "business_end_hour must be at most 24, got {}",
                c.business_end_hour
            )));
        }
        if c.business_start_hour >= c.business_end_hour {
            return Err(ReportError::Config(format!(
                "business window [{}, {}) is empty",
                c.business_start_hour, c.business_end_hour
            )));
        }
        Ok(())
    }
}
