//! Ready-made downloaders

pub mod data_uri;

pub use data_uri::{encode_data_uri, DataUriDownloader};
