pub mod balances;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod grouping;
pub mod indexer;
pub mod metadata;
pub mod nfd;
pub mod output;
pub mod pipeline;
pub mod server;
pub mod tiers;
