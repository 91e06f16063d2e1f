//! Error handling policy of the fire-and-forget entry points.
use tracing::error;

/// Errors on the fire-and-forget path are logged to the diagnostic stream
/// and otherwise dropped. The caller never sees them.
pub trait LogAndSwallow<T>: Sized + sealed::Sealed {
    /// Log the error (if any) with the given context and discard it.
    fn log_and_swallow(self, context: &str) -> Option<T>;
}

impl<T, E> LogAndSwallow<T> for Result<T, E>
where
    E: std::fmt::Debug + std::error::Error + Send + Sync + 'static,
{
    fn log_and_swallow(self, context: &str) -> Option<T> {
        match self {
            Ok(x) => Some(x),
            Err(e) => {
                let report = eyre::Report::new(e);
                error!("{context}: {report:?}");
                None
            }
        }
    }
}

mod sealed {
    pub trait Sealed {}

    impl<T, E> Sealed for Result<T, E> {}
}
