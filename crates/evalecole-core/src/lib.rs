//! Core types, rule engine and trait definitions for Éval'École.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Every other crate depends on it: the storage backends implement
//! [`store::EntityStore`], the API and the terminal client drive the rule
//! engine ([`visibility`], [`scoring`], [`submission`], [`adjustment`]) and
//! exchange the owned models in [`views`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod adjustment;
pub mod catalog;
pub mod error;
pub mod event;
pub mod memory;
pub mod navigation;
pub mod role;
pub mod scoring;
pub mod seed;
pub mod session;
pub mod store;
pub mod submission;
pub mod user;
pub mod views;
pub mod visibility;

pub use error::{Error, Result};

/// Generate a fresh opaque identifier for a user, class or event.
pub fn new_id() -> String { uuid::Uuid::new_v4().to_string() }
