//! bx-http: HTTP transport for the bucket-explorer client
//!
//! This crate provides the implementation of the BucketApi trait
//! on top of reqwest. It is the only crate that talks HTTP.

pub mod client;

pub use client::HttpClient;
