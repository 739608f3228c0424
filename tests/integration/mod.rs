//! Integration tests for the launcher
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod bootstrap_flow;
pub mod cli;
