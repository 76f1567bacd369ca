pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("missing node id {id}")]
    MissingNode { id: String },

    #[error("circular link")]
    CircularLink,
}
