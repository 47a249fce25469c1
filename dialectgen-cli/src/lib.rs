//! Library half of the `dialectgen` CLI: `dialectgen.toml` loading and merging with
//! command-line overrides into pipeline settings.

pub mod config;
