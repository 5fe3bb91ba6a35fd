//! Type-erased service descriptors and per-transition configs.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of, ServiceKey};
use crate::resolver::BuildContext;
use crate::traits::{DynService, Service};

/// Construction parameters with their concrete type erased.
pub(crate) type AnyParams = Arc<dyn Any + Send + Sync>;

/// A freshly built instance, viewed both as `Any` (for typed lookup) and as
/// a lifecycle object (for init and teardown).
pub(crate) struct Constructed {
    pub(crate) any: Arc<dyn Any + Send + Sync>,
    pub(crate) lifecycle: Arc<dyn DynService>,
}

type ConstructFn = fn(&mut BuildContext<'_>, &AnyParams) -> DiResult<Constructed>;

/// Descriptor of a service type: its key plus how to build it.
///
/// Screens and views declare their dependencies as `ServiceType`s, and every
/// instance remembers the descriptor it was built from so the resolver can
/// re-resolve it by type in later generations.
///
/// # Examples
///
/// ```rust
/// use screenflow::{key_of, BuildContext, Service, ServiceError, ServiceType};
///
/// struct Clock;
///
/// #[async_trait::async_trait]
/// impl Service for Clock {
///     type Params = ();
///     fn build(_: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
///         Ok(Clock)
///     }
/// }
///
/// let ty = ServiceType::of::<Clock>();
/// assert_eq!(ty.key(), key_of::<Clock>());
/// assert_eq!(ty, ServiceType::of::<Clock>());
/// ```
#[derive(Clone, Copy)]
pub struct ServiceType {
    key: ServiceKey,
    construct: ConstructFn,
    default_params: fn() -> AnyParams,
}

impl ServiceType {
    /// Descriptor for `S`.
    pub fn of<S: Service>() -> Self {
        ServiceType {
            key: key_of::<S>(),
            construct: construct_erased::<S>,
            default_params: default_params::<S>,
        }
    }

    /// Key of the described type.
    pub fn key(&self) -> ServiceKey {
        self.key
    }

    /// Short type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.key.short_name()
    }

    pub(crate) fn construct(&self, ctx: &mut BuildContext<'_>, params: &AnyParams) -> DiResult<Constructed> {
        (self.construct)(ctx, params)
    }

    pub(crate) fn default_params(&self) -> AnyParams {
        (self.default_params)()
    }
}

impl PartialEq for ServiceType {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ServiceType {}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceType").field(&self.key.display_name()).finish()
    }
}

fn construct_erased<S: Service>(ctx: &mut BuildContext<'_>, params: &AnyParams) -> DiResult<Constructed> {
    let params = params
        .downcast_ref::<S::Params>()
        .ok_or(DiError::TypeMismatch(type_name::<S::Params>()))?;
    let service = S::build(ctx, params).map_err(|err| DiError::construction(key_of::<S>().short_name(), err))?;
    let service = Arc::new(service);
    Ok(Constructed {
        any: service.clone(),
        lifecycle: service,
    })
}

fn default_params<S: Service>() -> AnyParams {
    Arc::new(S::Params::default())
}

/// Explicit construction parameters for one service type.
///
/// Passing a config to [`App::go`](crate::App::go) always forces a fresh
/// instance of that type for the transition, even if an identical instance
/// could have been reused. Configs are immutable and cheap to clone; a
/// generation carries the config of every type it was given one for, so
/// later transitions rebuild the type with the same parameters.
#[derive(Clone)]
pub struct ServiceConfig {
    service: ServiceType,
    params: AnyParams,
}

impl ServiceConfig {
    /// Config building `S` from `params`.
    pub fn new<S: Service>(params: S::Params) -> Self {
        ServiceConfig {
            service: ServiceType::of::<S>(),
            params: Arc::new(params),
        }
    }

    /// Builds a config from JSON, failing on malformed parameters.
    #[cfg(feature = "config")]
    pub fn from_json<S>(value: serde_json::Value) -> DiResult<Self>
    where
        S: Service,
        S::Params: serde::de::DeserializeOwned,
    {
        let params: S::Params = serde_json::from_value(value)
            .map_err(|err| DiError::Config(format!("{}: {}", key_of::<S>().short_name(), err)))?;
        Ok(Self::new::<S>(params))
    }

    /// The configured service type.
    pub fn service_type(&self) -> ServiceType {
        self.service
    }

    /// Key of the configured service type.
    pub fn key(&self) -> ServiceKey {
        self.service.key()
    }

    /// Typed access to the parameters; `None` if `S` is not the configured type.
    pub fn params<S: Service>(&self) -> Option<&S::Params> {
        if self.service.key() != key_of::<S>() {
            return None;
        }
        self.params.downcast_ref::<S::Params>()
    }

    /// True when both configs share the same parameter allocation.
    pub fn same_params(&self, other: &ServiceConfig) -> bool {
        Arc::ptr_eq(&self.params, &other.params)
    }

    pub(crate) fn any_params(&self) -> &AnyParams {
        &self.params
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("service", &self.service.name())
            .finish_non_exhaustive()
    }
}
