//! CLI integration tests.

mod build_tests;
mod common;
mod config_tests;
mod digest_tests;
