//! Concrete sink implementations

pub mod http;

pub use http::HttpSink;
