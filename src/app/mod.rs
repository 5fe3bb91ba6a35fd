//! Application context and the transition state machine.
//!
//! An [`App`] owns the committed [`Generation`] and moves between screens
//! with [`App::go`]. Each call is one transaction: the new generation is
//! resolved and initialized off to the side, and only becomes current once
//! every service initialized successfully. Until then readers keep seeing the
//! previous generation, untouched.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use tokio::sync::{oneshot, watch};

use crate::config::AppConfig;
use crate::descriptors::ServiceConfig;
use crate::error::{DiError, DiResult};
use crate::generation::Generation;
use crate::observer::{Observers, TransitionObserver};
use crate::resolver::Resolver;
use crate::screen::Screen;
use crate::traits::Service;

mod history;

pub use history::HistoryEntry;
use history::{History, Navigation};

/// A screen plus the explicit configs to enter it with.
#[derive(Clone, Debug)]
pub struct TransitionRequest {
    screen: Arc<Screen>,
    configs: Vec<ServiceConfig>,
}

impl TransitionRequest {
    pub fn new(screen: impl Into<Arc<Screen>>, configs: impl IntoIterator<Item = ServiceConfig>) -> Self {
        Self {
            screen: screen.into(),
            configs: configs.into_iter().collect(),
        }
    }

    pub fn screen(&self) -> &Arc<Screen> {
        &self.screen
    }

    pub fn configs(&self) -> &[ServiceConfig] {
        &self.configs
    }
}

/// How a single transition attempt ended.
#[derive(Debug)]
pub enum TransitionOutcome {
    /// The new generation is current.
    Committed(Arc<Generation>),
    /// The attempt failed; the previous generation is still current.
    Failed(DiError),
    /// Another transition was requested while this one was activating. This
    /// attempt is abandoned and the carried request should be driven next.
    Superseded(TransitionRequest),
}

/// Application context.
///
/// Cheap to clone; clones share the same state. Services receive a weak
/// [`AppHandle`] instead so that a generation never keeps its application
/// alive.
///
/// # Examples
///
/// ```
/// use screenflow::{App, Block, BuildContext, Screen, Service, ServiceError, View};
///
/// struct Cart {
///     currency: String,
/// }
///
/// #[async_trait::async_trait]
/// impl Service for Cart {
///     type Params = String;
///     fn build(_: &mut BuildContext<'_>, currency: &String) -> Result<Self, ServiceError> {
///         Ok(Cart { currency: currency.clone() })
///     }
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let main = Block::new("main");
/// let shop = Screen::new("shop").define([View::new(&main).require::<Cart>()]);
///
/// let app = App::new();
/// app.go(shop.clone(), [Cart::with("EUR".to_string())]).await.unwrap();
/// let first = app.service::<Cart>().unwrap();
/// assert_eq!(first.currency, "EUR");
///
/// // Same screen, no new config: the cart is carried over as is.
/// app.go(shop, []).await.unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &app.service::<Cart>().unwrap()));
/// # });
/// ```
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

pub(crate) struct AppInner {
    config: AppConfig,
    observers: Arc<Observers>,
    state: Mutex<AppState>,
    published: watch::Sender<Option<Arc<Generation>>>,
}

struct AppState {
    current: Option<Arc<Generation>>,
    activation: Option<Activation>,
    history: History,
}

/// Present while a transition is activating.
struct Activation {
    redirect: Option<TransitionRequest>,
    wake: Option<oneshot::Sender<()>>,
}

impl AppInner {
    fn lock_state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl App {
    pub fn new() -> Self {
        AppBuilder::new().build()
    }

    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Weak handle to this application.
    pub fn handle(&self) -> AppHandle {
        AppHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Transitions to `screen`, following redirects.
    ///
    /// Resolves the screen's services against the current generation, awaits
    /// their initialization and commits. On failure the current generation
    /// and screen are left exactly as they were and the error is returned.
    ///
    /// Calling `go` while a transition is activating does not queue: the
    /// request replaces any earlier pending one as the in-flight
    /// transition's redirect, and this call returns
    /// [`DiError::Redirected`] immediately. The in-flight call then abandons
    /// its own attempt and drives the redirect instead.
    pub async fn go(
        &self,
        screen: impl Into<Arc<Screen>>,
        configs: impl IntoIterator<Item = ServiceConfig>,
    ) -> DiResult<Arc<Generation>> {
        self.drive(TransitionRequest::new(screen, configs), Navigation::Push).await
    }

    /// Runs a single transition attempt without following redirects.
    pub async fn transition(&self, request: TransitionRequest) -> TransitionOutcome {
        self.attempt(request, Navigation::Push).await
    }

    async fn drive(&self, mut request: TransitionRequest, mut navigation: Navigation) -> DiResult<Arc<Generation>> {
        let mut redirects = 0;
        loop {
            match self.attempt(request, navigation).await {
                TransitionOutcome::Committed(generation) => return Ok(generation),
                TransitionOutcome::Failed(err) => return Err(err),
                TransitionOutcome::Superseded(next) => {
                    if redirects == self.inner.config.max_redirects {
                        return Err(DiError::RedirectLimit(redirects));
                    }
                    redirects += 1;
                    tracing::debug!(screen = next.screen().name(), redirects, "following redirect");
                    request = next;
                    navigation = Navigation::Push;
                }
            }
        }
    }

    async fn attempt(&self, request: TransitionRequest, navigation: Navigation) -> TransitionOutcome {
        let (wake_tx, wake_rx) = oneshot::channel();
        let previous = {
            let mut state = self.inner.lock_state();
            if let Some(activation) = state.activation.as_mut() {
                let screen = request.screen().name().to_string();
                tracing::debug!(screen = %screen, "transition requested while activating");
                activation.redirect = Some(request);
                if let Some(wake) = activation.wake.take() {
                    let _ = wake.send(());
                }
                return TransitionOutcome::Failed(DiError::Redirected { screen });
            }
            state.activation = Some(Activation {
                redirect: None,
                wake: Some(wake_tx),
            });
            state.current.clone()
        };

        let started = Instant::now();
        let screen_name = request.screen().name().to_string();
        let number = previous.as_ref().map_or(1, |g| g.number() + 1);
        self.inner.observers.transition_started(&screen_name, number);

        let mut resolver = Resolver::new(self.handle())
            .with_max_depth(self.inner.config.max_resolution_depth)
            .with_observers(Arc::clone(&self.inner.observers));

        let result = match resolver.prepare(request.screen(), previous, request.configs()) {
            Ok(()) => {
                let init = resolver.init();
                tokio::select! {
                    result = init => result,
                    // The pending redirect is picked up below.
                    _ = wake_rx => Ok(()),
                }
            }
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            let redirect = self.end_activation();
            resolver.rollback();
            return match redirect {
                Some(next) => self.superseded(&screen_name, next),
                None => {
                    tracing::debug!(screen = %screen_name, error = %err, "transition rolled back");
                    self.inner.observers.failed(&screen_name, &err);
                    TransitionOutcome::Failed(err)
                }
            };
        }

        let pending = {
            let mut state = self.inner.lock_state();
            let pending = state.activation.as_mut().and_then(|a| a.redirect.take());
            if pending.is_some() {
                state.activation = None;
            }
            pending
        };
        if let Some(next) = pending {
            resolver.rollback();
            return self.superseded(&screen_name, next);
        }

        let generation = Arc::new(resolver.commit());
        let late = {
            let mut state = self.inner.lock_state();
            state.current = Some(Arc::clone(&generation));
            state.history.record(
                navigation,
                HistoryEntry::new(Arc::clone(generation.screen()), generation.configs()),
            );
            state.activation.take().and_then(|a| a.redirect)
        };
        self.inner.published.send_replace(Some(Arc::clone(&generation)));
        self.inner.observers.committed(&generation, started.elapsed());

        match late {
            Some(next) => self.superseded(&screen_name, next),
            None => TransitionOutcome::Committed(generation),
        }
    }

    fn end_activation(&self) -> Option<TransitionRequest> {
        self.inner.lock_state().activation.take().and_then(|a| a.redirect)
    }

    fn superseded(&self, screen: &str, next: TransitionRequest) -> TransitionOutcome {
        self.inner.observers.superseded(screen, next.screen().name());
        TransitionOutcome::Superseded(next)
    }

    /// Re-enters the history entry at `index` with its stored screen and
    /// configs. On success the history cursor moves to `index`.
    pub async fn navigate(&self, index: usize) -> DiResult<Arc<Generation>> {
        let entry = self.inner.lock_state().history.entry(index).cloned();
        let entry = entry.ok_or(DiError::NoHistory(index))?;
        let request = TransitionRequest::new(Arc::clone(entry.screen()), entry.configs().to_vec());
        self.drive(request, Navigation::Restore(index)).await
    }

    pub async fn back(&self) -> DiResult<Arc<Generation>> {
        let cursor = self.history_index().and_then(|c| c.checked_sub(1));
        self.navigate(cursor.ok_or(DiError::HistoryEnd)?).await
    }

    pub async fn forward(&self) -> DiResult<Arc<Generation>> {
        let next = {
            let state = self.inner.lock_state();
            let len = state.history.entries().len();
            state.history.cursor().map(|c| c + 1).filter(|&index| index < len)
        };
        self.navigate(next.ok_or(DiError::HistoryEnd)?).await
    }

    /// The committed generation, if any transition succeeded yet.
    pub fn current(&self) -> Option<Arc<Generation>> {
        self.inner.lock_state().current.clone()
    }

    pub fn current_screen(&self) -> Option<Arc<Screen>> {
        self.current().map(|g| Arc::clone(g.screen()))
    }

    /// Instance of `S` in the committed generation.
    pub fn service<S: Service>(&self) -> Option<Arc<S>> {
        self.current()?.get::<S>()
    }

    pub fn is_activating(&self) -> bool {
        self.inner.lock_state().activation.is_some()
    }

    /// Receiver notified with every committed generation.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Generation>>> {
        self.inner.published.subscribe()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inner.lock_state().history.entries().to_vec()
    }

    pub fn history_index(&self) -> Option<usize> {
        self.inner.lock_state().history.cursor()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Weak reference to an [`App`], handed to services at construction.
#[derive(Clone)]
pub struct AppHandle {
    inner: Weak<AppInner>,
}

impl AppHandle {
    /// Handle not tied to any application, for resolvers used on their own.
    pub fn detached() -> Self {
        AppHandle { inner: Weak::new() }
    }

    pub fn app(&self) -> Option<App> {
        self.inner.upgrade().map(|inner| App { inner })
    }

    /// [`App::go`] on the referenced application.
    pub async fn go(
        &self,
        screen: impl Into<Arc<Screen>>,
        configs: impl IntoIterator<Item = ServiceConfig>,
    ) -> DiResult<Arc<Generation>> {
        let app = self.app().ok_or(DiError::AppDropped)?;
        app.go(screen, configs).await
    }
}

/// Builder for [`App`].
pub struct AppBuilder {
    config: AppConfig,
    observers: Observers,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            observers: Observers::new(),
        }
    }

    pub fn config(&mut self, config: AppConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Registers an observer notified of every transition.
    pub fn add_observer(&mut self, observer: Arc<dyn TransitionObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    pub fn build(self) -> App {
        if self.observers.has_observers() {
            tracing::trace!("app built with transition observers");
        }
        let (published, _) = watch::channel(None);
        let history = History::new(self.config.history_limit);
        App {
            inner: Arc::new(AppInner {
                config: self.config,
                observers: Arc::new(self.observers),
                state: Mutex::new(AppState {
                    current: None,
                    activation: None,
                    history,
                }),
                published,
            }),
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
