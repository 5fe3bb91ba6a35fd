mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::*;
use screenflow::{
    App, AppHandle, DiError, Generation, Resolver, Screen, Service, ServiceKey, TransitionObserver,
};

fn resolve(screen: &Screen, previous: Option<Arc<Generation>>, configs: &[screenflow::ServiceConfig]) -> Resolver {
    let mut resolver = Resolver::new(AppHandle::detached());
    resolver.prepare(&Arc::new(screen.clone()), previous, configs).unwrap();
    resolver
}

#[tokio::test]
async fn phases_can_be_driven_by_hand() {
    let mut resolver = resolve(&account(), None, &[]);
    assert_eq!(resolver.number(), 1);
    assert_eq!(resolver.len(), 2);
    assert!(resolver.get::<Feed>().is_none());
    assert_eq!(count("init:Session"), 0);

    // requiring outside the screen adds to the same generation
    let sidebar = resolver.require::<Sidebar>().unwrap();
    assert!(Arc::ptr_eq(&sidebar, &resolver.require::<Sidebar>().unwrap()));
    assert_eq!(resolver.len(), 3);

    resolver.init().await.unwrap();
    let generation = Arc::new(resolver.commit());
    assert!(generation.is_initialized::<Session>());
    assert!(generation.contains::<Sidebar>());

    let next = resolve(&home(), Some(Arc::clone(&generation)), &[]);
    assert_eq!(next.number(), 2);
    assert!(Arc::ptr_eq(
        &next.get::<Session>().unwrap(),
        &generation.get::<Session>().unwrap()
    ));
}

#[tokio::test]
async fn rollback_never_tears_anything_down() {
    let mut first = resolve(&home(), None, &[]);
    first.init().await.unwrap();
    let first = Arc::new(first.commit());
    clear();

    let second = resolve(&account(), Some(Arc::clone(&first)), &[Settings::with("x".to_string())]);
    second.init().await.unwrap();
    second.rollback();

    assert!(journal().iter().all(|e| !e.starts_with("destroy") && !e.starts_with("teardown")));
    assert!(first.is_initialized::<Feed>());
}

#[tokio::test]
async fn last_explicit_config_for_a_type_wins() {
    let resolver = resolve(
        &account(),
        None,
        &[Settings::with("a".to_string()), Settings::with("b".to_string())],
    );
    assert_eq!(resolver.get::<Settings>().unwrap().label, "b");
}

#[tokio::test]
async fn resolution_errors_surface_from_prepare() {
    let mut resolver = Resolver::new(AppHandle::detached()).with_max_depth(1);
    let err = resolver.prepare(&Arc::new(account()), None, &[]).unwrap_err();
    assert!(matches!(err, DiError::DepthExceeded(1)));
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl TransitionObserver for Recorder {
    fn transition_started(&self, screen: &str, generation: u64) {
        self.push(format!("start {} #{}", screen, generation));
    }

    fn committed(&self, generation: &Generation, _duration: Duration) {
        self.push(format!("commit #{}", generation.number()));
    }

    fn failed(&self, screen: &str, error: &DiError) {
        self.push(format!("fail {}: {}", screen, error));
    }

    fn service_created(&self, key: &ServiceKey, _generation: u64) {
        self.push(format!("new {}", key));
    }

    fn service_reused(&self, key: &ServiceKey, _generation: u64) {
        self.push(format!("keep {}", key));
    }

    fn service_destroyed(&self, key: &ServiceKey) {
        self.push(format!("drop {}", key));
    }
}

#[tokio::test]
async fn observers_see_every_lifecycle_decision() {
    let recorder = Arc::new(Recorder::default());
    let mut builder = App::builder();
    builder.add_observer(recorder.clone());
    let app = builder.build();

    app.go(account(), []).await.unwrap();
    assert_eq!(
        recorder.take(),
        vec!["start account #1", "new Settings", "new Session", "commit #1"]
    );

    app.go(single::<Sidebar>("side"), []).await.unwrap();
    assert_eq!(
        recorder.take(),
        vec!["start side #2", "new Sidebar", "drop Session", "drop Settings", "commit #2"]
    );

    app.go(home(), [Settings::with("x".to_string())]).await.unwrap();
    let events = recorder.take();
    assert_eq!(events.first().map(String::as_str), Some("start home #3"));
    assert!(events.contains(&"keep Sidebar".to_string()));
}
