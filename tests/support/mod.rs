//! Shared helpers for integration tests.

pub mod zotero_fixture;
