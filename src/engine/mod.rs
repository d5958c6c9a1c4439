//! Admission and dispatch engine: capacity, per-resource exclusion,
//! background classification, guaranteed release.

pub mod dispatch;
mod guard;

pub use dispatch::Dispatcher;
