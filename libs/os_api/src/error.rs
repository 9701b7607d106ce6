use thiserror::Error;

#[derive(Debug, Error)]
pub enum OsError {
    #[cfg(target_os = "windows")]
    #[error("{context}: {source}")]
    Win {
        context: String,
        #[source]
        source: windows::core::Error,
    },

    #[error("{0}")]
    Msg(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("operation is not supported on this platform")]
    Unsupported,
}

impl OsError {
    #[cfg(target_os = "windows")]
    pub(crate) fn win(context: impl Into<String>) -> impl FnOnce(windows::core::Error) -> Self {
        let context = context.into();
        move |source| Self::Win { context, source }
    }
}
