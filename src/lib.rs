//! # predict-rs
//!
//! Admission and dispatch engine for image classification predictions.
//!
//! A [`engine::Dispatcher`] bounds how many classification calls are in
//! flight, refuses concurrent work on the same resource, and runs each
//! admitted prediction in the background until its result is persisted.
//! The classification service and the record store sit behind the
//! [`classifier::Classifier`] and [`store::PredictionStore`] traits.

pub mod classifier;
pub mod codec;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod model;
pub mod store;
pub mod telemetry;
