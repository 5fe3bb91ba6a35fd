//! Error types for the transition engine.

use std::sync::Arc;
use thiserror::Error;

/// Error type service authors return from construction and initialization.
///
/// Any error type works; the resolver wraps it together with the name of the
/// failing service before it reaches the caller of [`App::go`](crate::App::go).
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// Shared handle to a service-authored error.
///
/// Initialization results are memoized per instance and observed by every
/// dependent, so the original error is kept behind an `Arc`.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Transition and resolution errors
///
/// Represents the failure conditions that can occur while resolving a
/// generation of services, initializing it, or driving a transition.
///
/// # Examples
///
/// ```rust
/// use screenflow::DiError;
///
/// let circular = DiError::Circular(vec!["Session", "Profile", "Session"]);
/// assert_eq!(circular.to_string(), "Circular dependency: Session -> Profile -> Session");
///
/// let depth = DiError::DepthExceeded(1024);
/// assert_eq!(depth.to_string(), "Max depth 1024 exceeded");
///
/// let redirect = DiError::Redirected { screen: "login".to_string() };
/// assert!(redirect.is_redirect());
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Service not present in the generation
    #[error("Service not found: {0}")]
    NotFound(&'static str),
    /// Construction params did not have the type the service expects
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected during construction (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Maximum resolution depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// A service's constructor returned an error
    #[error("Failed to construct {service}: {source}")]
    Construction {
        service: &'static str,
        #[source]
        source: SharedError,
    },
    /// A service's `init` returned an error
    #[error("Initialization of {service} failed: {source}")]
    Init {
        service: &'static str,
        #[source]
        source: SharedError,
    },
    /// An initializer panicked or its task was torn down before reporting
    #[error("Initialization task aborted: {0}")]
    InitAborted(String),
    /// `go` was called while another transition was activating
    #[error("Redirecting to screen {screen}")]
    Redirected { screen: String },
    /// Redirect chain exceeded the configured limit
    #[error("Too many redirects ({0})")]
    RedirectLimit(usize),
    /// Navigation to a history entry that does not exist
    #[error("No history entry at index {0}")]
    NoHistory(usize),
    /// `back` at the first entry or `forward` at the last
    #[error("No history entry in that direction")]
    HistoryEnd,
    /// The application was dropped while a handle still referenced it
    #[error("Application is no longer alive")]
    AppDropped,
    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DiError {
    /// Returns true for the signal handed to a nested `go` call.
    pub fn is_redirect(&self) -> bool {
        matches!(self, DiError::Redirected { .. })
    }

    /// Wraps a constructor error, passing resolution errors through untouched.
    pub(crate) fn construction(service: &'static str, err: ServiceError) -> Self {
        match err.downcast::<DiError>() {
            Ok(inner) => *inner,
            Err(source) => DiError::Construction {
                service,
                source: Arc::from(source),
            },
        }
    }

    pub(crate) fn init(service: &'static str, err: ServiceError) -> Self {
        match err.downcast::<DiError>() {
            Ok(inner) => *inner,
            Err(source) => DiError::Init {
                service,
                source: Arc::from(source),
            },
        }
    }
}

/// Result type for engine operations
pub type DiResult<T> = Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("socket closed")]
    struct SocketClosed;

    #[test]
    fn construction_wraps_foreign_errors() {
        let err = DiError::construction("Feed", Box::new(SocketClosed));
        assert_eq!(err.to_string(), "Failed to construct Feed: socket closed");
    }

    #[test]
    fn construction_passes_resolution_errors_through() {
        let err = DiError::construction("Feed", Box::new(DiError::Circular(vec!["A", "B", "A"])));
        assert!(matches!(err, DiError::Circular(path) if path == vec!["A", "B", "A"]));
    }

    #[test]
    fn init_keeps_redirect_signal() {
        let err = DiError::init("Guard", Box::new(DiError::Redirected { screen: "login".into() }));
        assert!(err.is_redirect());
    }
}
