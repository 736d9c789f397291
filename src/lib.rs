pub mod advisory;
pub mod aggregate;
pub mod backfill;
pub mod classify;
pub mod config;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod logging;
pub mod news;
pub mod render;
pub mod report;
pub mod trade_log;
