//! E2E test suite entry point.

mod fixture;
mod install_workflow;
mod sync_workflow;
