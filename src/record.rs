use crate::config::{ReportConfig, Variant};
use chrono::NaiveDateTime;

pub const COL_SOURCE: &str = "ipAddress";
pub const COL_CATEGORY: &str = "category";
pub const COL_APPLICATION: &str = "applicationName";
pub const COL_ACK_STATUS: &str = "ackMetStatus";
pub const COL_CREATED_ON: &str = "createdOn";
pub const COL_ENVIRONMENT: &str = "environment";
pub const COL_UPDATE_CATEGORY: &str = "latestUpdCategory";

/// One alert row, with every cell already coerced to text.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    /// Line in the input file, for error messages.
    pub line: usize,
    pub source: String,
    pub descriptor: String,
    pub category: String,
    pub application: String,
    /// Present only for extended reports.
    pub incident: Option<IncidentFields>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncidentFields {
    pub ack_status: String,
    /// `None` when the cell was blank.
    pub created_on: Option<NaiveDateTime>,
    pub environment: String,
    pub update_category: String,
}

/// Columns the input must carry for the given configuration, in report order.
pub fn required_columns(cfg: &ReportConfig) -> Vec<&'static str> {
    let mut cols = vec![COL_SOURCE, cfg.descriptor.column(), COL_CATEGORY, COL_APPLICATION];
    if cfg.variant == Variant::Extended {
        cols.extend([COL_ACK_STATUS, COL_CREATED_ON, COL_ENVIRONMENT, COL_UPDATE_CATEGORY]);
    }
    cols
}
