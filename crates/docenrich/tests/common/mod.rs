//! Shared test utilities for docenrich integration tests.
//!
//! This module provides:
//! - `FakeServices`, scriptable in-process stand-ins for every collaborator
//! - `TestHarness`, a supervisor wired to the fakes plus polling helpers

pub mod fakes;
pub mod harness;

pub use fakes::{Behavior, FakeServices};
pub use harness::TestHarness;
