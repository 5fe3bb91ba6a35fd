//! Navigation demo: a small mail client moving between screens.
//!
//! Shows:
//! - services reused across screens and rebuilt when their config changes
//! - dependency-ordered async init
//! - a guard redirecting from inside its `init`
//! - history navigation
//!
//! Run with `RUST_LOG=debug cargo run --example navigation` to see every
//! lifecycle decision logged by the `LoggingObserver`.

use screenflow::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

static SIGNED_IN: AtomicBool = AtomicBool::new(false);

/// Mail backend location.
#[derive(Clone)]
struct Endpoint(String);

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint("https://mail.example".to_string())
    }
}

/// HTTP client pointed at the mail backend.
struct Api {
    base_url: String,
}

#[async_trait::async_trait]
impl Service for Api {
    type Params = Endpoint;

    fn build(ctx: &mut BuildContext<'_>, endpoint: &Endpoint) -> Result<Self, ServiceError> {
        let url = endpoint.0.clone();
        ctx.on_destroy(move || println!("  api: closing connections to {}", url));
        Ok(Api {
            base_url: endpoint.0.clone(),
        })
    }

    async fn init(&self, _: &Endpoint) -> Result<(), ServiceError> {
        // connection warm-up
        sleep(Duration::from_millis(20)).await;
        println!("  api: connected to {}", self.base_url);
        Ok(())
    }
}

/// Redirects to the login screen unless someone is signed in.
struct Auth {
    app: AppHandle,
}

#[async_trait::async_trait]
impl Service for Auth {
    type Params = ();

    fn build(ctx: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
        ctx.require::<Api>()?;
        Ok(Auth { app: ctx.app() })
    }

    async fn init(&self, _: &()) -> Result<(), ServiceError> {
        if !SIGNED_IN.load(Ordering::SeqCst) {
            self.app.go(screens().login, []).await?;
        }
        Ok(())
    }

    fn needs_reinit(&self) -> bool {
        // check again once the user has signed in
        !SIGNED_IN.load(Ordering::SeqCst)
    }
}

struct Inbox {
    api: Arc<Api>,
}

#[async_trait::async_trait]
impl Service for Inbox {
    type Params = ();

    fn build(ctx: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
        ctx.require::<Auth>()?;
        Ok(Inbox { api: ctx.require::<Api>()? })
    }

    async fn init(&self, _: &()) -> Result<(), ServiceError> {
        println!("  inbox: fetched 3 messages from {}", self.api.base_url);
        Ok(())
    }

    fn destroy(&self) {
        println!("  inbox: destroyed");
    }
}

struct LoginForm;

#[async_trait::async_trait]
impl Service for LoginForm {
    type Params = ();

    fn build(ctx: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
        ctx.require::<Api>()?;
        Ok(LoginForm)
    }

    fn destroy(&self) {
        println!("  login form: destroyed");
    }
}

struct Screens {
    login: Screen,
    inbox: Screen,
}

fn screens() -> Screens {
    let content = Block::new("content");
    let base = Screen::new("base");
    Screens {
        login: base.extend("login", [View::new(&content).require::<LoginForm>()]),
        inbox: base.extend("inbox", [View::new(&content).require::<Inbox>()]),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("📬 screenflow navigation demo\n");

    let config = AppConfig::from_env("screenflow")?;
    let mut builder = App::builder();
    builder
        .config(config)
        .add_observer(Arc::new(LoggingObserver::with_prefix("mail")));
    let app = builder.build();

    println!("1. Opening the inbox while signed out");
    let generation = app.go(screens().inbox, []).await?;
    println!("   landed on '{}'\n", generation.screen().name());

    println!("2. Signing in and opening the inbox again");
    SIGNED_IN.store(true, Ordering::SeqCst);
    let inbox = app.go(screens().inbox, []).await?;
    println!("   landed on '{}' with {} services\n", inbox.screen().name(), inbox.len());

    println!("3. Switching backends rebuilds everything that depends on the api");
    let switched = app
        .go(screens().inbox, [Api::with(Endpoint("https://eu.mail.example".to_string()))])
        .await?;
    println!("   inbox rebuilt: {}\n", !switched.shares::<Inbox>(&inbox));

    println!("4. Going back in history");
    let back = app.back().await?;
    println!(
        "   back on '{}' against {}\n",
        back.screen().name(),
        back.get_required::<Api>()?.base_url
    );

    let entries: Vec<_> = app.history().iter().map(|e| e.screen().name().to_string()).collect();
    println!("History: {:?} (at {:?})", entries, app.history_index());
    Ok(())
}
