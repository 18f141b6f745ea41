//! Command implementations for the doccrawl CLI

pub mod check;
pub mod check_remote;
pub mod crawl;
pub mod list;
