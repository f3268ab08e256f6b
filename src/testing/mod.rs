//! Test doubles for the generation-service boundary.

mod mocks;

pub use mocks::ScriptedService;
