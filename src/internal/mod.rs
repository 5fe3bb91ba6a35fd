//! Internal implementation details.

use std::future::Future;
use std::pin::Pin;

pub(crate) mod circular;
pub(crate) mod dispose_bag;

pub(crate) use circular::{ResolutionStack, MAX_DEPTH};
pub(crate) use dispose_bag::DisposeBag;

/// Owned, sendable future.
pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
