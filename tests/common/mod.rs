//! Common test utilities and helpers
//!
//! - Binary path resolution and invocation
//! - Project fixtures laid out like the pcapi repository

pub(crate) mod helpers;
