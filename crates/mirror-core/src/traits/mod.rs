//! Ports - interfaces the domain needs the infrastructure to provide

mod fetcher;

pub use fetcher::{FetchResult, Method, ResourceFetcher};
