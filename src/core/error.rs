use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VarStatsError {
    #[error("invalid substitution code: {0:?} (expected one of the 12 X>Y codes over A/C/G/T)")]
    InvalidSubstitutionCode(String),
    #[error("cannot build an indel length profile from empty input")]
    EmptyInput,
    #[error("malformed {section} table: {message}")]
    MalformedTable { section: String, message: String },
}

impl VarStatsError {
    pub fn malformed(section: &str, message: impl Into<String>) -> Self {
        VarStatsError::MalformedTable {
            section: section.to_string(),
            message: message.into(),
        }
    }
}
