//! Authenticated routing gateway for serverless text-to-speech engines.
//!
//! The flow: a caller posts the JSON envelope, the dispatcher
//! authenticates the bearer token (when the deployment requires one),
//! resolves the named engine in the registry, performs the backend call
//! with a timeout and bounded retries, and returns a normalized response.

pub mod auth;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod health;
pub mod registry;
pub mod serve;
