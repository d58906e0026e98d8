//! Process-wide log output for hosts that do not install their own
//! subscriber.

use tracing_subscriber::filter::{Directive, EnvFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

/// Failure to install the log subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log directive '{directive}'")]
    InvalidDirective {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install a stderr subscriber filtered by `RUST_LOG`, plus `directive` if
/// given (for example `"keyframe_player=debug"`).
pub fn init(directive: Option<&str>) -> Result<(), LoggingError> {
    let mut env_filter = EnvFilter::from_default_env();

    if let Some(directive) = directive {
        let parsed: Directive =
            directive
                .parse()
                .map_err(|source| LoggingError::InvalidDirective {
                    directive: directive.to_owned(),
                    source,
                })?;
        env_filter = env_filter.add_directive(parsed);
    }

    let subscriber = tracing_subscriber::registry::Registry::default().with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(env_filter),
    );

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
