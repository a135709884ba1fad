pub mod charset;
pub mod client;
pub mod errors;
pub mod types;

pub use client::HttpFetcher;
pub use errors::FetchError;
pub use types::PageResponse;
