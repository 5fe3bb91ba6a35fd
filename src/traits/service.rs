//! The service authoring surface.

use std::any::Any;
use async_trait::async_trait;

use crate::descriptors::ServiceConfig;
use crate::error::ServiceError;
use crate::resolver::BuildContext;

/// A long-lived stateful unit required by one or more screens.
///
/// Services are built in two phases. During [`build`](Service::build) the
/// service declares every dependency it needs through
/// [`BuildContext::require`]; the list is frozen when `build` returns. Once
/// the whole generation is resolved, [`init`](Service::init) runs after the
/// `init` of every declared dependency has completed.
///
/// A dependency obtained any other way (for instance by looking it up on the
/// [`App`](crate::App) later) is invisible to the reuse check: the service
/// would be carried into the next generation even when that dependency is
/// replaced.
///
/// # Examples
///
/// ```
/// use screenflow::{BuildContext, Service, ServiceError};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct Api {
///     base_url: String,
/// }
///
/// #[async_trait]
/// impl Service for Api {
///     type Params = String;
///
///     fn build(_ctx: &mut BuildContext<'_>, base_url: &String) -> Result<Self, ServiceError> {
///         Ok(Api { base_url: base_url.clone() })
///     }
/// }
///
/// struct Inbox {
///     api: Arc<Api>,
/// }
///
/// #[async_trait]
/// impl Service for Inbox {
///     type Params = ();
///
///     fn build(ctx: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
///         Ok(Inbox { api: ctx.require::<Api>()? })
///     }
///
///     async fn init(&self, _: &()) -> Result<(), ServiceError> {
///         // `Api::init` has already completed here
///         let _ = &self.api.base_url;
///         Ok(())
///     }
/// }
///
/// let config = Api::with("https://mail.example".to_string());
/// assert_eq!(config.params::<Api>().map(String::as_str), Some("https://mail.example"));
/// ```
#[async_trait]
pub trait Service: Send + Sync + Sized + 'static {
    /// Construction parameters. `Default` is used when neither an explicit
    /// config nor a previous generation supplies any.
    type Params: Default + Send + Sync + 'static;

    /// Constructs the service and declares its dependencies.
    fn build(ctx: &mut BuildContext<'_>, params: &Self::Params) -> Result<Self, ServiceError>;

    /// Asynchronous initialization, run at most once per instance.
    async fn init(&self, _params: &Self::Params) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Returning `true` prevents this instance from being carried into the
    /// next generation.
    fn needs_reinit(&self) -> bool {
        false
    }

    /// Teardown hook, called after the callbacks registered with
    /// [`BuildContext::on_destroy`].
    fn destroy(&self) {}

    /// Shorthand for [`ServiceConfig::new`].
    fn with(params: Self::Params) -> ServiceConfig {
        ServiceConfig::new::<Self>(params)
    }
}

/// Object-safe view of a [`Service`] used by the engine.
#[async_trait]
pub(crate) trait DynService: Send + Sync {
    async fn erased_init(&self, params: &(dyn Any + Send + Sync)) -> Result<(), ServiceError>;

    fn erased_needs_reinit(&self) -> bool;

    fn erased_destroy(&self);
}

#[async_trait]
impl<S: Service> DynService for S {
    async fn erased_init(&self, params: &(dyn Any + Send + Sync)) -> Result<(), ServiceError> {
        let params = params
            .downcast_ref::<S::Params>()
            .ok_or(crate::DiError::TypeMismatch(std::any::type_name::<S::Params>()))?;
        Service::init(self, params).await
    }

    fn erased_needs_reinit(&self) -> bool {
        Service::needs_reinit(self)
    }

    fn erased_destroy(&self) {
        Service::destroy(self)
    }
}
