pub type CatalogResult<T> = Result<T, CatalogError>;

macro_rules! bail {
    ($($arg:tt)*) => {{
        return Err($crate::error::CatalogError::Other(format!(
            $($arg)*
        )));
    }};
}

pub(crate) use bail;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("object store: {0}")]
    Store(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl CatalogError {
    #[inline]
    pub fn other<T: ToString>(s: T) -> Self {
        Self::Other(s.to_string())
    }

    #[inline]
    pub fn config<T: ToString>(s: T) -> Self {
        Self::Config(s.to_string())
    }

    #[inline]
    pub fn store<T: ToString>(s: T) -> Self {
        Self::Store(s.to_string())
    }
}
