//! Shared utilities for jdl-ldop integration tests.
//!
//! - `TestHarness`: in-memory database plus a stub JD server
//! - builders for configs, tokens and pickup orders

#![allow(unused_imports)]

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{CountingOrderStore, TestHarness, OAUTH_PATH, ROUTER_PATH};
