//! HTTP access to the exported graph data.

pub mod client;

pub use client::DataClient;
