//! Build context handed to service constructors.

use std::sync::Arc;

use crate::app::AppHandle;
use crate::descriptors::ServiceType;
use crate::error::DiResult;
use crate::instance::ServiceCell;
use crate::internal::DisposeBag;
use crate::key::ServiceKey;
use crate::traits::Service;

use super::Resolver;

/// Context passed to [`Service::build`] for declaring dependencies.
///
/// Every service obtained through [`require`](BuildContext::require) is
/// recorded, once, as a dependency of the service under construction. That
/// list decides both init ordering and whether the service may be reused by
/// the next generation.
///
/// # Examples
///
/// ```
/// use screenflow::{BuildContext, Service, ServiceError};
/// use std::sync::Arc;
///
/// struct Socket;
///
/// #[async_trait::async_trait]
/// impl Service for Socket {
///     type Params = ();
///     fn build(_: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
///         Ok(Socket)
///     }
/// }
///
/// struct Presence {
///     socket: Arc<Socket>,
/// }
///
/// #[async_trait::async_trait]
/// impl Service for Presence {
///     type Params = ();
///     fn build(ctx: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
///         let socket = ctx.require::<Socket>()?;
///         ctx.on_destroy(|| println!("presence: unsubscribed"));
///         Ok(Presence { socket })
///     }
/// }
/// ```
pub struct BuildContext<'r> {
    resolver: &'r mut Resolver,
    key: ServiceKey,
    dependencies: Vec<Arc<ServiceCell>>,
    teardown: DisposeBag,
}

impl<'r> BuildContext<'r> {
    pub(crate) fn new(resolver: &'r mut Resolver, key: ServiceKey) -> Self {
        Self {
            resolver,
            key,
            dependencies: Vec::new(),
            teardown: DisposeBag::default(),
        }
    }

    /// Resolves `T` in the generation being built and records it as a
    /// dependency of the service under construction.
    pub fn require<T: Service>(&mut self) -> DiResult<Arc<T>> {
        let cell = self.resolver.resolve(ServiceType::of::<T>())?;
        if !self.dependencies.iter().any(|d| Arc::ptr_eq(d, &cell)) {
            self.dependencies.push(cell.clone());
        }
        cell.downcast::<T>()
    }

    /// Registers a callback run when the instance is torn down, before
    /// [`Service::destroy`]. Callbacks run in reverse registration order.
    pub fn on_destroy(&mut self, f: impl FnOnce() + Send + 'static) {
        self.teardown.push(Box::new(f));
    }

    /// Weak handle to the owning application.
    pub fn app(&self) -> AppHandle {
        self.resolver.app().clone()
    }

    /// Key of the service being built.
    pub fn service_key(&self) -> ServiceKey {
        self.key
    }

    /// Number of the generation being built.
    pub fn generation(&self) -> u64 {
        self.resolver.number()
    }

    pub(crate) fn finish(self) -> (Vec<Arc<ServiceCell>>, DisposeBag) {
        (self.dependencies, self.teardown)
    }
}
