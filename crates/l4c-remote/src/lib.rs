//! HTTP clients for the services Link4Coders talks to: GitHub for
//! repository import and VAPI for hosted voice assistants.
//!
//! Both implement the `l4c-core` remote traits, so the API layer can swap
//! them for fakes in tests.

mod github;
mod vapi;

pub mod error;

pub use error::{Error, Result};
pub use github::{GithubClient, GithubConfig};
pub use vapi::{VapiClient, VapiConfig};
