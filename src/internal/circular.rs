//! Circular dependency detection for a single resolver.

use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;

/// Default bound on nested resolutions.
pub(crate) const MAX_DEPTH: usize = 1024;

/// Stack of service types currently being resolved, outermost first.
///
/// Owned by one resolver, so unlike a thread-local stack it never mixes
/// resolutions from interleaved transitions.
#[derive(Debug)]
pub(crate) struct ResolutionStack {
    stack: Vec<ServiceKey>,
    max_depth: usize,
}

impl ResolutionStack {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            max_depth,
        }
    }

    /// Enters `key`, failing if it is already being resolved further up.
    pub(crate) fn push(&mut self, key: ServiceKey) -> DiResult<()> {
        // Circular detection BEFORE pushing the new key
        if self.contains(key) {
            let mut path: Vec<&'static str> = self.stack.iter().map(|k| k.short_name()).collect();
            path.push(key.short_name());
            return Err(DiError::Circular(path));
        }

        if self.stack.len() >= self.max_depth {
            return Err(DiError::DepthExceeded(self.stack.len()));
        }

        self.stack.push(key);
        Ok(())
    }

    pub(crate) fn pop(&mut self, key: ServiceKey) {
        let last = self.stack.pop();
        debug_assert_eq!(last, Some(key));
    }

    pub(crate) fn contains(&self, key: ServiceKey) -> bool {
        self.stack.iter().any(|k| *k == key)
    }
}
