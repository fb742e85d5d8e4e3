use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("row {row}: cannot parse createdOn value {value:?} as a date-time")]
    InvalidTimestamp { row: usize, value: String },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {0}: expected a JSON object")]
    NotJsonObject(usize),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
