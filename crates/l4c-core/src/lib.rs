//! Core types and trait definitions for Link4Coders.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! database and the two external APIs (repository source, voice provider) are
//! expressed as traits here and implemented by `l4c-store-sqlite` and
//! `l4c-remote`.

// Native `async fn` in traits; the returned futures carry explicit `Send`
// bounds where the traits declare them.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod assistant;
pub mod engagement;
pub mod error;
pub mod link;
pub mod profile;
pub mod remote;
pub mod store;
pub mod subscription;
pub mod template;
pub mod view;

pub use error::{Error, Result};
