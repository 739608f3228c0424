//! Shared test utilities for the launcher
//!
//! This module provides common helpers for integration tests:
//! - Temporary bot checkouts in various setup states
//! - Scripted interpreters for end-to-end runs of the binary

#![allow(dead_code)]
