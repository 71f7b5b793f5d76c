//! Core types and collaborator traits for the WFD import engine.
//!
//! This crate is deliberately free of XML, HTTP, and database dependencies.
//! Every other crate in the workspace depends on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod claim;
pub mod config;
pub mod entity;
pub mod error;
pub mod plan;
pub mod record;
pub mod store;
pub mod vocab;

pub use error::{Error, Result};
