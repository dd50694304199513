use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GalleryError {
    #[error("invalid asset id: {0}")]
    InvalidAssetId(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("indexer request failed: {0}")]
    IndexerHttp(String),

    #[error("indexer returned status {status}: {message}")]
    IndexerStatus { status: u16, message: String },

    #[error("metadata request failed: {0}")]
    MetadataHttp(String),

    #[error("metadata service returned status {status}: {message}")]
    MetadataStatus { status: u16, message: String },

    #[error("malformed metadata payload: {0}")]
    MalformedMetadata(String),

    #[error("balances request failed: {0}")]
    BalancesHttp(String),

    #[error("balances service returned status {status}: {message}")]
    BalancesStatus { status: u16, message: String },

    #[error("NFD request failed: {0}")]
    NfdHttp(String),

    #[error("NFD service returned status {status}: {message}")]
    NfdStatus { status: u16, message: String },

    #[error("cache entry is malformed: {0}")]
    CacheParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("server error: {0}")]
    Server(String),
}
