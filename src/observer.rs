//! Diagnostic observers for transition traceability.
//!
//! Observers receive a callback at every lifecycle decision the engine
//! makes: which services a generation created, which it carried over from the
//! previous one, which it tore down, and how each transition ended.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::generation::Generation;
use crate::key::ServiceKey;

/// Observer trait for transition and service lifecycle events.
///
/// Hooks are called synchronously from the transition that triggers them.
/// Keep implementations lightweight; queue expensive work elsewhere.
///
/// # Examples
///
/// ```
/// use screenflow::{App, DiError, Generation, ServiceKey, TransitionObserver};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct Audit;
///
/// impl TransitionObserver for Audit {
///     fn transition_started(&self, screen: &str, generation: u64) {
///         println!("-> {} (generation {})", screen, generation);
///     }
///
///     fn committed(&self, generation: &Generation, duration: Duration) {
///         println!("committed {} services in {:?}", generation.len(), duration);
///     }
///
///     fn failed(&self, screen: &str, error: &DiError) {
///         eprintln!("{} failed: {}", screen, error);
///     }
///
///     fn service_created(&self, key: &ServiceKey, _generation: u64) {
///         println!("  new {}", key);
///     }
/// }
///
/// let mut builder = App::builder();
/// builder.add_observer(Arc::new(Audit));
/// let app = builder.build();
/// ```
pub trait TransitionObserver: Send + Sync {
    /// Called when a transition attempt begins resolving `screen`.
    fn transition_started(&self, screen: &str, generation: u64);

    /// Called when a transition committed.
    fn committed(&self, generation: &Generation, duration: Duration);

    /// Called when a transition failed and the previous generation was kept.
    fn failed(&self, screen: &str, error: &DiError);

    /// Called when a transition was abandoned in favor of a redirect.
    fn superseded(&self, screen: &str, next: &str) {
        let _ = (screen, next);
    }

    /// Called when a fresh instance was constructed.
    fn service_created(&self, key: &ServiceKey, generation: u64) {
        let _ = (key, generation);
    }

    /// Called when a previous instance was carried into the new generation.
    fn service_reused(&self, key: &ServiceKey, generation: u64) {
        let _ = (key, generation);
    }

    /// Called after an instance was torn down during commit.
    fn service_destroyed(&self, key: &ServiceKey) {
        let _ = key;
    }
}

/// Container for registered observers.
///
/// Designed to have minimal overhead when no observers are registered.
#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn TransitionObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn TransitionObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn transition_started(&self, screen: &str, generation: u64) {
        for observer in &self.observers {
            observer.transition_started(screen, generation);
        }
    }

    #[inline]
    pub(crate) fn committed(&self, generation: &Generation, duration: Duration) {
        for observer in &self.observers {
            observer.committed(generation, duration);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, screen: &str, error: &DiError) {
        for observer in &self.observers {
            observer.failed(screen, error);
        }
    }

    #[inline]
    pub(crate) fn superseded(&self, screen: &str, next: &str) {
        for observer in &self.observers {
            observer.superseded(screen, next);
        }
    }

    #[inline]
    pub(crate) fn service_created(&self, key: &ServiceKey, generation: u64) {
        for observer in &self.observers {
            observer.service_created(key, generation);
        }
    }

    #[inline]
    pub(crate) fn service_reused(&self, key: &ServiceKey, generation: u64) {
        for observer in &self.observers {
            observer.service_reused(key, generation);
        }
    }

    #[inline]
    pub(crate) fn service_destroyed(&self, key: &ServiceKey) {
        for observer in &self.observers {
            observer.service_destroyed(key);
        }
    }
}

/// Built-in observer that emits `tracing` events.
///
/// Transition outcomes are logged at `info`/`warn`, per-service decisions at
/// `debug`. Install any `tracing` subscriber to see them.
///
/// # Examples
///
/// ```
/// use screenflow::{App, LoggingObserver};
/// use std::sync::Arc;
///
/// let mut builder = App::builder();
/// builder.add_observer(Arc::new(LoggingObserver::with_prefix("shell")));
/// let app = builder.build();
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// Creates a new logging observer with default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "screenflow".to_string(),
        }
    }

    /// Creates a new logging observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionObserver for LoggingObserver {
    fn transition_started(&self, screen: &str, generation: u64) {
        tracing::info!(prefix = %self.prefix, screen, generation, "transition started");
    }

    fn committed(&self, generation: &Generation, duration: Duration) {
        tracing::info!(
            prefix = %self.prefix,
            screen = generation.screen().name(),
            generation = generation.number(),
            services = generation.len(),
            ?duration,
            "transition committed"
        );
    }

    fn failed(&self, screen: &str, error: &DiError) {
        tracing::warn!(prefix = %self.prefix, screen, %error, "transition failed");
    }

    fn superseded(&self, screen: &str, next: &str) {
        tracing::info!(prefix = %self.prefix, screen, next, "transition superseded");
    }

    fn service_created(&self, key: &ServiceKey, generation: u64) {
        tracing::debug!(prefix = %self.prefix, service = %key, generation, "service created");
    }

    fn service_reused(&self, key: &ServiceKey, generation: u64) {
        tracing::debug!(prefix = %self.prefix, service = %key, generation, "service reused");
    }

    fn service_destroyed(&self, key: &ServiceKey) {
        tracing::debug!(prefix = %self.prefix, service = %key, "service destroyed");
    }
}
