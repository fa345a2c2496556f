//! Shared contracts for the DCP Glue automation handlers.
//!
//! This crate owns the event and callback payload shapes, script templating,
//! and object key layout. It intentionally excludes AWS SDK and Lambda
//! runtime concerns, which live in `dcp_glue_lambda`.

pub mod contract;
pub mod script_template;
pub mod storage_keys;
