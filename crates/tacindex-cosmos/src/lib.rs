//! tacindex-cosmos — CometBFT/LCD fetcher, message processor and index loop.

pub mod builder;
pub mod client;
pub mod fetcher;
pub mod index_loop;
pub mod processor;

pub use builder::IndexerBuilder;
pub use client::{HttpClientConfig, HttpCosmosClient};
pub use fetcher::{CosmosFetcher, CosmosRpcClient};
pub use index_loop::IndexLoop;
pub use processor::MsgProcessor;
