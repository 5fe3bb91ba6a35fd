//! Committed generations of services.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::descriptors::ServiceConfig;
use crate::error::{DiError, DiResult};
use crate::instance::ServiceCell;
use crate::key::{key_of, ServiceKey};
use crate::screen::Screen;
use crate::traits::Service;

/// The full set of services resolved for one screen.
///
/// A generation is an immutable snapshot: once committed it is only ever
/// read, and the application replaces it as a whole on the next successful
/// transition. Lookups are typed and return the shared instance.
///
/// # Examples
///
/// ```
/// use screenflow::{App, BuildContext, Screen, Service, ServiceError, View, Block};
/// use std::sync::Arc;
///
/// struct Theme;
///
/// #[async_trait::async_trait]
/// impl Service for Theme {
///     type Params = ();
///     fn build(_: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
///         Ok(Theme)
///     }
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let main = Block::new("main");
/// let home = Screen::new("home").define([View::new(&main).require::<Theme>()]);
///
/// let app = App::new();
/// let generation = app.go(home, []).await.unwrap();
///
/// let theme: Arc<Theme> = generation.get::<Theme>().unwrap();
/// assert!(generation.is_initialized::<Theme>());
/// assert_eq!(generation.screen().name(), "home");
/// # });
/// ```
pub struct Generation {
    number: u64,
    screen: Arc<Screen>,
    services: HashMap<ServiceKey, Arc<ServiceCell>>,
    configs: HashMap<ServiceKey, ServiceConfig>,
    order: Vec<ServiceKey>,
}

impl Generation {
    pub(crate) fn new(
        number: u64,
        screen: Arc<Screen>,
        services: HashMap<ServiceKey, Arc<ServiceCell>>,
        configs: HashMap<ServiceKey, ServiceConfig>,
        order: Vec<ServiceKey>,
    ) -> Self {
        Self {
            number,
            screen,
            services,
            configs,
            order,
        }
    }

    /// Sequence number; the first committed generation is 1.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// The screen this generation was resolved for.
    pub fn screen(&self) -> &Arc<Screen> {
        &self.screen
    }

    /// Instance of `S`, if the generation holds one.
    pub fn get<S: Service>(&self) -> Option<Arc<S>> {
        self.services.get(&key_of::<S>())?.downcast::<S>().ok()
    }

    /// Instance of `S`, failing with [`DiError::NotFound`] if absent.
    pub fn get_required<S: Service>(&self) -> DiResult<Arc<S>> {
        match self.services.get(&key_of::<S>()) {
            Some(cell) => cell.downcast::<S>(),
            None => Err(DiError::NotFound(key_of::<S>().short_name())),
        }
    }

    /// True if the generation holds an instance of `S`.
    pub fn contains<S: Service>(&self) -> bool {
        self.contains_key(&key_of::<S>())
    }

    pub fn contains_key(&self, key: &ServiceKey) -> bool {
        self.services.contains_key(key)
    }

    /// True if `S` is present and its `init` completed successfully.
    pub fn is_initialized<S: Service>(&self) -> bool {
        self.services
            .get(&key_of::<S>())
            .is_some_and(|cell| cell.is_initialized())
    }

    /// True if both generations hold the very same instance of `S`.
    pub fn shares<S: Service>(&self, other: &Generation) -> bool {
        let key = key_of::<S>();
        match (self.services.get(&key), other.services.get(&key)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Config `S` was built with, explicit or carried forward.
    pub fn config<S: Service>(&self) -> Option<&ServiceConfig> {
        self.configs.get(&key_of::<S>())
    }

    /// Every config recorded for this generation, in resolution order.
    pub fn configs(&self) -> Vec<ServiceConfig> {
        self.order
            .iter()
            .filter_map(|key| self.configs.get(key).cloned())
            .collect()
    }

    /// Service keys in resolution order (dependencies before dependents).
    pub fn keys(&self) -> impl Iterator<Item = ServiceKey> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub(crate) fn cell(&self, key: &ServiceKey) -> Option<&Arc<ServiceCell>> {
        self.services.get(key)
    }

    pub(crate) fn config_for(&self, key: &ServiceKey) -> Option<&ServiceConfig> {
        self.configs.get(key)
    }

    pub(crate) fn order(&self) -> &[ServiceKey] {
        &self.order
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generation")
            .field("number", &self.number)
            .field("screen", &self.screen.name())
            .field("services", &self.order.iter().map(|k| k.short_name()).collect::<Vec<_>>())
            .finish()
    }
}
