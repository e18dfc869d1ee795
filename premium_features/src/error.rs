use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {raw}")]
    InvalidFieldType { field: &'static str, raw: String },

    #[error("Value out of range for {field}: {raw}")]
    OutOfRange { field: &'static str, raw: String },
}

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid training record {record}: {source}")]
    Record {
        record: usize,
        #[source]
        source: ProfileError,
    },
}
