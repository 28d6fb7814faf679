//! Shared test utilities for configmap-to-disk integration tests.
//!
//! This module provides:
//! - `TestHarness` for an isolated target file, metrics and controller
//! - `ConfigMapBuilder` for ConfigMap snapshots
//! - `ScriptedSource`, a watch source that replays a fixed script

#![allow(dead_code, unused_imports)]

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{ScriptedSource, TestHarness};
