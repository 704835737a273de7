//! Integration test suite for maestro.
//!
//! These tests drive the public API the way a coordinator loop would:
//! boards go in, recommendations, plans and hand-outs come out.
//!
//! # Test Categories
//!
//! - `scenarios`: End-to-end behavior of each orchestration mode
//! - `properties`: Invariants that hold across templates, sizes and boards
//! - `registry`: Mode persistence, cooldowns and config files on disk

mod fixtures;

mod properties;
mod registry;
mod scenarios;
