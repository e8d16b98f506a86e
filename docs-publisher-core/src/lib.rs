#![doc = "docs-publisher-core: pipeline logic for docs-publisher."]

//! Builds versioned documentation for a set of libraries and publishes the
//! generated site to an object store behind a CDN.
//!
//! All external programs are reached through [`contract::ExternalTool`], so
//! the orchestration in [`pipeline`] can be exercised with mocks.

pub mod builder;
pub mod config;
pub mod contract;
pub mod error;
pub mod manifest;
pub mod patch;
pub mod pipeline;
pub mod publish;
pub mod site;
pub mod version;
pub mod workspace;
