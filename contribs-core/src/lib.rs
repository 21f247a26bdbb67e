//! contribs-core library exports

pub mod builder;
pub mod config;
pub mod descriptor;
pub mod fetch;
pub mod filter;
pub mod listing;
pub mod logging;
pub mod record;
pub mod writer;
