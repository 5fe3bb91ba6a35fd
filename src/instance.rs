//! Per-instance lifecycle state.

use std::any::type_name;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use crate::descriptors::{AnyParams, Constructed, ServiceType};
use crate::error::{DiError, DiResult};
use crate::internal::{BoxFuture, DisposeBag};
use crate::key::ServiceKey;
use crate::traits::{DynService, Service};

/// One constructed service instance and everything the engine tracks for it.
///
/// Identity is the allocation: two cells are the same service only when
/// `Arc::ptr_eq` holds. The dependency list is fixed at construction.
pub(crate) struct ServiceCell {
    service_type: ServiceType,
    any: Arc<dyn std::any::Any + Send + Sync>,
    lifecycle: Arc<dyn DynService>,
    params: AnyParams,
    dependencies: Vec<Arc<ServiceCell>>,
    init: OnceCell<DiResult<()>>,
    teardown: Mutex<DisposeBag>,
    destroyed: AtomicBool,
}

impl ServiceCell {
    pub(crate) fn new(
        service_type: ServiceType,
        constructed: Constructed,
        params: AnyParams,
        dependencies: Vec<Arc<ServiceCell>>,
        teardown: DisposeBag,
    ) -> Self {
        Self {
            service_type,
            any: constructed.any,
            lifecycle: constructed.lifecycle,
            params,
            dependencies,
            init: OnceCell::new(),
            teardown: Mutex::new(teardown),
            destroyed: AtomicBool::new(false),
        }
    }

    pub(crate) fn key(&self) -> ServiceKey {
        self.service_type.key()
    }

    pub(crate) fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub(crate) fn dependencies(&self) -> &[Arc<ServiceCell>] {
        &self.dependencies
    }

    pub(crate) fn downcast<S: Service>(&self) -> DiResult<Arc<S>> {
        self.any
            .clone()
            .downcast::<S>()
            .map_err(|_| DiError::TypeMismatch(type_name::<S>()))
    }

    pub(crate) fn needs_reinit(&self) -> bool {
        self.lifecycle.erased_needs_reinit()
    }

    pub(crate) fn is_initialized(&self) -> bool {
        matches!(self.init.get(), Some(Ok(())))
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Memoized initialization.
    ///
    /// The first caller runs the service's `init` after awaiting every
    /// dependency's own initialization; later callers, including every other
    /// dependent in the same generation, observe the stored result.
    pub(crate) fn initialize(self: &Arc<Self>) -> BoxFuture<DiResult<()>> {
        let cell = Arc::clone(self);
        Box::pin(async move { cell.init.get_or_init(|| cell.run_init()).await.clone() })
    }

    async fn run_init(&self) -> DiResult<()> {
        for dependency in &self.dependencies {
            dependency.initialize().await?;
        }
        self.lifecycle
            .erased_init(self.params.as_ref())
            .await
            .map_err(|err| DiError::init(self.service_type.name(), err))
    }

    /// Runs teardown callbacks (LIFO), then the service's `destroy` hook.
    ///
    /// Returns false if the instance was already destroyed.
    pub(crate) fn destroy(&self) -> bool {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return false;
        }
        let mut bag = std::mem::take(&mut *self.teardown.lock().unwrap_or_else(PoisonError::into_inner));
        bag.run_all_reverse();
        self.lifecycle.erased_destroy();
        true
    }
}

impl fmt::Debug for ServiceCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCell")
            .field("service", &self.service_type.name())
            .field("dependencies", &self.dependencies.iter().map(|d| d.service_type.name()).collect::<Vec<_>>())
            .field("initialized", &self.is_initialized())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
