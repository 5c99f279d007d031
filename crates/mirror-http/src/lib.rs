//! # mirror-http
//!
//! HTTP implementation of the resource-fetcher port: arbitrary method +
//! path + body against the resource endpoint, returning decoded JSON or a
//! structured [`mirror_core::FetchError`].

mod client;

pub use client::RestClient;
