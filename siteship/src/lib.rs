#![doc = "siteship: CLI crate. Argument parsing, environment resolution and the FTP client."]

//! All pipeline logic (task graph, manifest, sync orchestration) lives in
//! the [`siteship-core`] crate; this crate is CLI glue plus the concrete
//! [`siteship_core::contract::RemoteStore`] implementation.
//!
//! [`siteship-core`]: ../siteship_core/

pub mod cli;
pub mod ftp;
pub mod load_config;
