//! Integration tests for reposync-sync
//!
//! Drives the orchestrator, resolver and uploader against an in-memory
//! platform and checks the guarantees a caller relies on: result order,
//! abort semantics, collision handling, idempotence, failure isolation,
//! bounded retry and cancellation.

mod common;

mod test_service;
