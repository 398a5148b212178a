use catalog::error::CatalogError;

pub(crate) type DatacatResult<T> = Result<T, DatacatError>;

macro_rules! bail {
    ($($arg:tt)*) => {{
        return Err(DatacatError::Other(format!($($arg)*)));
    }};
}

pub(crate) use bail;

#[derive(Debug, thiserror::Error)]
pub(crate) enum DatacatError {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl DatacatError {
    #[inline]
    pub(crate) fn other<T: ToString>(s: T) -> Self {
        Self::Other(s.to_string())
    }

    /// Whether the error was caused by a closed stdout (e.g. the
    /// output was piped into `head`).
    pub(crate) fn is_broken_pipe(&self) -> bool {
        use std::io::ErrorKind::BrokenPipe;

        match self {
            Self::IO(e) => e.kind() == BrokenPipe,
            Self::Catalog(CatalogError::IO(e)) => {
                e.kind() == BrokenPipe
            }
            Self::Catalog(CatalogError::Csv(e)) => match e.kind() {
                csv::ErrorKind::Io(e) => e.kind() == BrokenPipe,
                _ => false,
            },
            Self::Catalog(CatalogError::Json(e)) | Self::Json(e) => {
                e.io_error_kind() == Some(BrokenPipe)
            }
            _ => false,
        }
    }
}
