//! Shared test doubles.

pub mod mocks;
