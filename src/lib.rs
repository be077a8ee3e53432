pub mod charts;
pub mod config;
pub mod encoding;
pub mod error;
pub mod events;
pub mod export;
pub mod http_cache;
pub mod ingest;
pub mod involvement;
pub mod mining;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod sequencer;
