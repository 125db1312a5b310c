/// The only failure the dispatch core knows about. Raised synchronously and
/// never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DispatchError {
    pub fn invalid(detail: impl Into<String>) -> DispatchError {
        DispatchError::InvalidArgument(detail.into())
    }
}
