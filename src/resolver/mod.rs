//! Per-transition resolution of a service generation.
//!
//! A [`Resolver`] computes the next generation from a target screen, the
//! previously committed generation and the explicit configs of one
//! transition. It owns everything it builds until [`Resolver::commit`] turns
//! it into a [`Generation`]; dropping it instead is the rollback.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::app::AppHandle;
use crate::descriptors::{AnyParams, ServiceConfig, ServiceType};
use crate::error::{DiError, DiResult};
use crate::generation::Generation;
use crate::instance::ServiceCell;
use crate::internal::{ResolutionStack, MAX_DEPTH};
use crate::key::ServiceKey;
use crate::observer::Observers;
use crate::screen::Screen;
use crate::traits::Service;

mod context;
pub use context::BuildContext;

/// Transactional engine computing one generation of services.
///
/// At most one instance exists per service type within a resolver; once a
/// type has been resolved the same instance is returned for the rest of the
/// resolver's lifetime.
///
/// Most applications drive resolvers through [`App::go`](crate::App::go).
/// Using one directly exposes the three phases: `prepare` (synchronous
/// resolution), `init` (asynchronous, dependency ordered) and `commit`.
///
/// # Examples
///
/// ```
/// use screenflow::{AppHandle, Block, BuildContext, Resolver, Screen, Service, ServiceError, View};
/// use std::sync::Arc;
///
/// struct Store;
///
/// #[async_trait::async_trait]
/// impl Service for Store {
///     type Params = ();
///     fn build(_: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
///         Ok(Store)
///     }
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let list = Block::new("list");
/// let screen = Arc::new(Screen::new("items").define([View::new(&list).require::<Store>()]));
///
/// let mut first = Resolver::new(AppHandle::detached());
/// first.prepare(&screen, None, &[]).unwrap();
/// first.init().await.unwrap();
/// let first = Arc::new(first.commit());
///
/// let mut second = Resolver::new(AppHandle::detached());
/// second.prepare(&screen, Some(first.clone()), &[]).unwrap();
/// second.init().await.unwrap();
/// let second = second.commit();
///
/// assert!(second.shares::<Store>(&first));
/// # });
/// ```
pub struct Resolver {
    app: AppHandle,
    number: u64,
    screen: Option<Arc<Screen>>,
    previous: Option<Arc<Generation>>,
    explicit: HashMap<ServiceKey, ServiceConfig>,
    services: HashMap<ServiceKey, Arc<ServiceCell>>,
    configs: HashMap<ServiceKey, ServiceConfig>,
    order: Vec<ServiceKey>,
    stack: ResolutionStack,
    observers: Arc<Observers>,
}

impl Resolver {
    /// Creates an empty resolver owned by `app`.
    pub fn new(app: AppHandle) -> Self {
        Self {
            app,
            number: 1,
            screen: None,
            previous: None,
            explicit: HashMap::new(),
            services: HashMap::new(),
            configs: HashMap::new(),
            order: Vec::new(),
            stack: ResolutionStack::new(MAX_DEPTH),
            observers: Arc::new(Observers::default()),
        }
    }

    /// Bounds the depth of nested resolutions.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.stack = ResolutionStack::new(max_depth);
        self
    }

    pub(crate) fn with_observers(mut self, observers: Arc<Observers>) -> Self {
        self.observers = observers;
        self
    }

    /// Seeds the resolver and resolves every service `screen` depends on.
    ///
    /// Explicit configs are installed first (the last config for a type
    /// wins), then the previous generation is linked for reuse, then the
    /// screen's dependency set is resolved in declaration order.
    pub fn prepare(
        &mut self,
        screen: &Arc<Screen>,
        previous: Option<Arc<Generation>>,
        configs: &[ServiceConfig],
    ) -> DiResult<()> {
        for config in configs {
            self.explicit.insert(config.key(), config.clone());
        }
        self.number = previous.as_ref().map_or(1, |g| g.number() + 1);
        self.previous = previous;
        self.screen = Some(Arc::clone(screen));

        for service_type in screen.dependencies() {
            self.resolve(*service_type)?;
        }
        tracing::trace!(
            screen = screen.name(),
            generation = self.number,
            services = self.services.len(),
            "generation resolved"
        );
        Ok(())
    }

    /// Returns the instance of `S` this generation uses, resolving it if
    /// needed.
    pub fn require<S: Service>(&mut self) -> DiResult<Arc<S>> {
        self.resolve(ServiceType::of::<S>())?.downcast::<S>()
    }

    /// Instance of `S`, if already resolved.
    pub fn get<S: Service>(&self) -> Option<Arc<S>> {
        self.services.get(&crate::key_of::<S>())?.downcast::<S>().ok()
    }

    /// Number of resolved services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Number of the generation being built.
    pub fn number(&self) -> u64 {
        self.number
    }

    pub(crate) fn app(&self) -> &AppHandle {
        &self.app
    }

    pub(crate) fn resolve(&mut self, service_type: ServiceType) -> DiResult<Arc<ServiceCell>> {
        let key = service_type.key();
        if let Some(cell) = self.services.get(&key) {
            return Ok(Arc::clone(cell));
        }

        self.stack.push(key)?;
        let resolved = self.resolve_uncached(service_type);
        self.stack.pop(key);
        let (cell, config) = resolved?;

        self.services.insert(key, Arc::clone(&cell));
        self.order.push(key);
        if let Some(config) = config {
            self.configs.insert(key, config);
        }
        Ok(cell)
    }

    fn resolve_uncached(&mut self, service_type: ServiceType) -> DiResult<(Arc<ServiceCell>, Option<ServiceConfig>)> {
        let key = service_type.key();

        // An explicit config always means a fresh instance.
        if let Some(config) = self.explicit.get(&key).cloned() {
            let cell = self.construct(service_type, config.any_params().clone())?;
            return Ok((cell, Some(config)));
        }

        let (candidate, config) = match &self.previous {
            Some(previous) => (previous.cell(&key).cloned(), previous.config_for(&key).cloned()),
            None => (None, None),
        };

        if let Some(candidate) = candidate {
            if self.can_reuse(&candidate)? {
                self.observers.service_reused(&key, self.number);
                return Ok((candidate, config));
            }
        }

        let params = match &config {
            Some(config) => config.any_params().clone(),
            None => service_type.default_params(),
        };
        let cell = self.construct(service_type, params)?;
        Ok((cell, config))
    }

    /// A previous instance is reusable when each of its dependencies resolves
    /// to the very same instance in this generation.
    fn can_reuse(&mut self, candidate: &Arc<ServiceCell>) -> DiResult<bool> {
        if candidate.needs_reinit() {
            return Ok(false);
        }
        for dependency in candidate.dependencies() {
            // Still being resolved up the chain: cannot be validated.
            if self.stack.contains(dependency.key()) {
                return Ok(false);
            }
            let current = self.resolve(dependency.service_type())?;
            if !Arc::ptr_eq(&current, dependency) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn construct(&mut self, service_type: ServiceType, params: AnyParams) -> DiResult<Arc<ServiceCell>> {
        let key = service_type.key();
        let mut ctx = BuildContext::new(self, key);
        let constructed = service_type.construct(&mut ctx, &params)?;
        let (dependencies, teardown) = ctx.finish();

        let cell = Arc::new(ServiceCell::new(service_type, constructed, params, dependencies, teardown));
        self.observers.service_created(&key, self.number);
        Ok(cell)
    }

    /// Initializes every resolved service.
    ///
    /// Each service's `init` starts only after all of its dependencies have
    /// initialized; shared dependencies initialize once. The returned future
    /// fails with the first error reported. Initializers already running are
    /// not cancelled by that failure, nor by dropping the future: they run to
    /// completion on the runtime and their results are simply ignored.
    ///
    /// Must be awaited within a tokio runtime.
    pub fn init(&self) -> impl Future<Output = DiResult<()>> + Send + 'static {
        let cells: Vec<Arc<ServiceCell>> = self
            .order
            .iter()
            .filter_map(|key| self.services.get(key).cloned())
            .collect();

        async move {
            let pending = cells.len();
            let (tx, mut rx) = mpsc::unbounded_channel();
            for cell in cells {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(cell.initialize().await);
                });
            }
            drop(tx);

            for _ in 0..pending {
                match rx.recv().await {
                    Some(Ok(())) => {}
                    Some(Err(err)) => return Err(err),
                    None => {
                        return Err(DiError::InitAborted("initializer exited without a result".to_string()));
                    }
                }
            }
            Ok(())
        }
    }

    /// Makes this generation the current one.
    ///
    /// Call only after [`init`](Resolver::init) succeeded. Every instance of
    /// the previous generation that is not also part of this one is torn
    /// down, dependents before their dependencies. The link to the previous
    /// generation is released.
    pub fn commit(mut self) -> Generation {
        if let Some(previous) = self.previous.take() {
            for key in previous.order().iter().rev() {
                let Some(old) = previous.cell(key) else { continue };
                let kept = self.services.get(key).is_some_and(|new| Arc::ptr_eq(new, old));
                if !kept && old.destroy() {
                    self.observers.service_destroyed(key);
                }
            }
        }

        let screen = self.screen.take().unwrap_or_else(|| Arc::new(Screen::new("")));
        Generation::new(self.number, screen, self.services, self.configs, self.order)
    }

    /// Abandons this generation.
    ///
    /// Nothing is torn down: previous services stay untouched and services
    /// created by this resolver are released without their `destroy` hook.
    pub fn rollback(self) {
        tracing::trace!(generation = self.number, services = self.services.len(), "generation rolled back");
    }
}
