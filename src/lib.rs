//! esdash - terminal dashboard for live Elasticsearch cluster observability.
//!
//! This library provides the core functionality behind the `esdash` binary:
//! - [`gateway`] - the HTTP capability surface over a cluster's REST API
//! - [`assembler`] - gathers one coherent snapshot from the gateway's reads
//! - [`derive`] - pure derivation of display rows, metrics, and recommendations
//! - [`dashboard`] - the single-writer TUI model, update loop, and renderer
//! - [`history`] - the sparkline point-history ring buffer
//! - [`model`] - the cluster snapshot data model
//! - [`sanitize`] - terminal-escape stripping for externally sourced strings
//! - [`cli`] - argument parsing and connection URI parsing
//! - [`logging`] - tracing subscriber setup

pub mod assembler;
pub mod cli;
pub mod dashboard;
pub mod derive;
pub mod gateway;
pub mod history;
pub mod logging;
pub mod model;
pub mod sanitize;
