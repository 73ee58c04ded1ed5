use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("warehouse source contains no warehouses")]
    NoWarehouses,

    #[error("invalid destination extent: {0}")]
    InvalidExtent(String),

    #[error("warehouse parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    /// `true` for errors that must abort simulation start-up.
    pub fn is_fatal_setup(&self) -> bool {
        matches!(
            self,
            DispatchError::NoWarehouses
                | DispatchError::InvalidExtent(_)
                | DispatchError::Parse(_)
                | DispatchError::Io(_)
        )
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
