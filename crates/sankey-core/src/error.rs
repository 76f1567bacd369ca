pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("data view JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error (record {record}): {message}")]
    Csv { record: usize, message: String },
}
