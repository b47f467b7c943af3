pub mod competition;
pub mod config;
pub mod error;
pub mod ingest;
pub mod ledger;
pub mod output;
pub mod pipeline;
pub mod scoring;
