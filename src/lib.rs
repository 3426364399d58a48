//! # Notion Test Cases
//!
//! A small HTTP API that reads pages, blocks, and tables from the Notion API
//! and re-projects them into test-case records.
//!
//! Pages whose title contains `TC_<digits>` become test cases; the tables on
//! those pages are flattened into rows of plain-text cells.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  HTTP / CLI  │──▶│  testcases   │──▶│   client     │──▶ Notion API
//! │ server, ntc  │   │  aggregator  │   │ DocumentApi  │
//! └──────────────┘   └──────┬───────┘   └──────────────┘
//!                           │
//!            ┌──────────────┼──────────────┐
//!            ▼              ▼              ▼
//!      ┌──────────┐   ┌──────────┐   ┌──────────┐
//!      │properties│   │  blocks  │   │  tables  │
//!      └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export NOTION_API_KEY=secret_...
//! ntc list                       # discovered test cases
//! ntc blocks 01001 --type table  # table blocks of TC_01001
//! ntc serve                      # start the HTTP API on :8080
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML and environment configuration |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Raw upstream document model |
//! | [`client`] | Remote document client |
//! | [`properties`] | Page property extraction |
//! | [`blocks`] | Block projection |
//! | [`tables`] | Table reconstruction |
//! | [`testcases`] | Test-case discovery and aggregation |
//! | [`server`] | HTTP API |
//! | [`logging`] | Tracing setup |

pub mod blocks;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod properties;
pub mod server;
pub mod tables;
pub mod testcases;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
