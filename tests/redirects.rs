mod common;

use std::time::Duration;

use async_trait::async_trait;
use common::*;
use screenflow::{
    App, AppConfig, AppHandle, BuildContext, DiError, Service, ServiceError, TransitionOutcome, TransitionRequest,
};

struct Loader;

#[async_trait]
impl Service for Loader {
    type Params = ();

    fn build(_: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
        Ok(Loader)
    }

    async fn init(&self, _: &()) -> Result<(), ServiceError> {
        tokio::time::sleep(Duration::from_millis(30)).await;
        record("init:Loader");
        Ok(())
    }

    fn destroy(&self) {
        record("destroy:Loader");
    }
}

async fn until_activating(app: &App) {
    while !app.is_activating() {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn go_while_activating_redirects_the_in_flight_transition() {
    let app = App::new();
    let before = app.go(account(), []).await.unwrap();

    let slow = app.go(single::<Loader>("loading"), []);
    let nested = async {
        until_activating(&app).await;
        // the committed generation stays visible meanwhile
        assert!(std::sync::Arc::ptr_eq(&app.current().unwrap(), &before));
        app.go(home(), []).await
    };
    let (outer, nested) = tokio::join!(slow, nested);

    let nested = nested.unwrap_err();
    assert!(nested.is_redirect());
    assert_eq!(nested.to_string(), "Redirecting to screen home");

    let generation = outer.unwrap();
    assert_eq!(generation.screen().name(), "home");
    assert!(!generation.contains::<Loader>());
    assert!(generation.shares::<Session>(&before));
    assert!(!app.is_activating());

    // the abandoned loader is never torn down, even once its init finished
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(count("init:Loader"), 1);
    assert_eq!(count("destroy:Loader"), 0);
    let names: Vec<_> = app.history().iter().map(|e| e.screen().name().to_string()).collect();
    assert_eq!(names, vec!["account", "home"]);
}

#[tokio::test]
async fn last_redirect_wins() {
    let app = App::new();

    let slow = app.go(single::<Loader>("loading"), []);
    let first = async {
        until_activating(&app).await;
        app.go(account(), []).await
    };
    let second = async {
        until_activating(&app).await;
        app.go(home(), []).await
    };
    let (outer, first, second) = tokio::join!(slow, first, second);

    assert!(first.unwrap_err().is_redirect());
    assert!(second.unwrap_err().is_redirect());
    assert_eq!(outer.unwrap().screen().name(), "home");
}

struct Guard {
    app: AppHandle,
}

#[async_trait]
impl Service for Guard {
    type Params = ();

    fn build(ctx: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
        Ok(Guard { app: ctx.app() })
    }

    async fn init(&self, _: &()) -> Result<(), ServiceError> {
        // not signed in
        self.app.go(account(), []).await?;
        Ok(())
    }

    fn destroy(&self) {
        record("destroy:Guard");
    }
}

#[tokio::test]
async fn init_can_redirect_through_its_handle() {
    let app = App::new();

    let generation = app.go(single::<Guard>("admin"), []).await.unwrap();

    assert_eq!(generation.screen().name(), "account");
    assert!(!generation.contains::<Guard>());
    assert_eq!(app.current_screen().unwrap().name(), "account");
    assert_eq!(count("destroy:Guard"), 0);
    assert_eq!(app.history().len(), 1);
}

#[tokio::test]
async fn single_attempt_reports_supersession() {
    let app = App::new();

    let outcome = app.transition(TransitionRequest::new(single::<Guard>("admin"), [])).await;

    match outcome {
        TransitionOutcome::Superseded(next) => {
            assert_eq!(next.screen().name(), "account");
            assert!(next.configs().is_empty());
        }
        other => panic!("expected supersession, got {:?}", other),
    }
    assert!(app.current().is_none());
    assert!(!app.is_activating());

    match app.transition(TransitionRequest::new(account(), [])).await {
        TransitionOutcome::Committed(generation) => assert_eq!(generation.number(), 1),
        other => panic!("expected commit, got {:?}", other),
    }
}

struct Bouncer {
    app: AppHandle,
}

#[async_trait]
impl Service for Bouncer {
    type Params = ();

    fn build(ctx: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
        Ok(Bouncer { app: ctx.app() })
    }

    async fn init(&self, _: &()) -> Result<(), ServiceError> {
        record("init:Bouncer");
        self.app.go(single::<Bouncer>("bounce"), []).await?;
        Ok(())
    }
}

#[tokio::test]
async fn redirect_chains_are_bounded() {
    let mut builder = App::builder();
    builder.config(AppConfig::default().with_max_redirects(3));
    let app = builder.build();

    let err = app.go(single::<Bouncer>("bounce"), []).await.unwrap_err();

    assert!(matches!(err, DiError::RedirectLimit(3)));
    assert_eq!(count("init:Bouncer"), 4);
    assert!(app.current().is_none());
    assert!(!app.is_activating());
}
