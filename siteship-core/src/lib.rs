#![doc = "siteship-core: core logic library for siteship."]

//! This crate contains all logic, data models and pipelines for siteship:
//! the build task graph and the conditional remote sync. Network transport
//! is not included here; the remote side is the [`contract::RemoteStore`]
//! trait, implemented by the CLI crate and by test doubles.
//!
//! # Usage
//! Add this as a dependency for all shared pipeline, manifest, config and
//! sync code.

pub mod config;
pub mod contract;
pub mod error;
pub mod manifest;
pub mod plan;
pub mod synchronise;
pub mod tasks;
