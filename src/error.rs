/// Boxed error for renderers that do not need a concrete error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures of the built-in thread timer.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    #[error("Failed to spawn timer thread")]
    Spawn(#[source] std::io::Error),

    #[error("Repeating task panicked")]
    TaskPanicked,
}
