//! Shared fixtures: a per-thread event journal and a small service graph.
//!
//! `#[tokio::test]` runs on a current-thread runtime, so every spawned init
//! task records into the journal of the test that spawned it.
#![allow(dead_code)]

use std::cell::RefCell;
use std::sync::Arc;

use async_trait::async_trait;
use screenflow::{Block, BuildContext, Screen, Service, ServiceError, View};

thread_local! {
    static JOURNAL: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

pub fn record(event: impl Into<String>) {
    let event = event.into();
    JOURNAL.with(|journal| journal.borrow_mut().push(event));
}

pub fn journal() -> Vec<String> {
    JOURNAL.with(|journal| journal.borrow().clone())
}

pub fn clear() {
    JOURNAL.with(|journal| journal.borrow_mut().clear());
}

pub fn count(event: &str) -> usize {
    JOURNAL.with(|journal| journal.borrow().iter().filter(|e| *e == event).count())
}

/// Index of the first occurrence of `event`.
pub fn position(event: &str) -> Option<usize> {
    JOURNAL.with(|journal| journal.borrow().iter().position(|e| e == event))
}

/// Leaf service configured with a label.
pub struct Settings {
    pub label: String,
}

#[async_trait]
impl Service for Settings {
    type Params = String;

    fn build(ctx: &mut BuildContext<'_>, label: &String) -> Result<Self, ServiceError> {
        record("build:Settings");
        ctx.on_destroy(|| record("teardown:Settings:1"));
        ctx.on_destroy(|| record("teardown:Settings:2"));
        Ok(Settings { label: label.clone() })
    }

    async fn init(&self, _: &String) -> Result<(), ServiceError> {
        record("init:Settings");
        Ok(())
    }

    fn destroy(&self) {
        record("destroy:Settings");
    }
}

pub struct Session {
    pub settings: Arc<Settings>,
}

#[async_trait]
impl Service for Session {
    type Params = ();

    fn build(ctx: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
        let settings = ctx.require::<Settings>()?;
        record("build:Session");
        Ok(Session { settings })
    }

    async fn init(&self, _: &()) -> Result<(), ServiceError> {
        record("init:Session");
        Ok(())
    }

    fn destroy(&self) {
        record("destroy:Session");
    }
}

pub struct Feed {
    pub session: Arc<Session>,
}

#[async_trait]
impl Service for Feed {
    type Params = ();

    fn build(ctx: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
        let session = ctx.require::<Session>()?;
        record("build:Feed");
        Ok(Feed { session })
    }

    async fn init(&self, _: &()) -> Result<(), ServiceError> {
        record("init:Feed");
        Ok(())
    }

    fn destroy(&self) {
        record("destroy:Feed");
    }
}

pub struct Sidebar;

#[async_trait]
impl Service for Sidebar {
    type Params = ();

    fn build(_: &mut BuildContext<'_>, _: &()) -> Result<Self, ServiceError> {
        record("build:Sidebar");
        Ok(Sidebar)
    }

    async fn init(&self, _: &()) -> Result<(), ServiceError> {
        record("init:Sidebar");
        Ok(())
    }

    fn destroy(&self) {
        record("destroy:Sidebar");
    }
}

/// Feed in the content block, Sidebar on the side.
pub fn home() -> Screen {
    Screen::new("home").define([
        View::new(&Block::new("content")).require::<Feed>(),
        View::new(&Block::new("side")).require::<Sidebar>(),
    ])
}

/// Only needs the session.
pub fn account() -> Screen {
    Screen::new("account").define([View::new(&Block::new("content")).require::<Session>()])
}

/// Screen with a single block requiring `S`.
pub fn single<S: Service>(name: &str) -> Screen {
    Screen::new(name).define([View::new(&Block::new("main")).require::<S>()])
}
