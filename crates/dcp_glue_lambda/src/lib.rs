//! AWS-oriented adapters and handlers for the DCP Glue automation Lambdas.
//!
//! This crate owns runtime integration details (Lambda handlers, the
//! CloudFormation callback client, and storage/workflow seams). Payload
//! contracts and script templating live in `dcp_glue_core`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
