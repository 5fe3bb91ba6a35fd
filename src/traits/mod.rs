//! Core traits for service authors.

mod service;

pub use service::Service;
pub(crate) use service::DynService;
