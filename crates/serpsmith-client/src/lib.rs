//! Rate-limited outbound HTTP client for the serpsmith pipeline.
//!
//! Every external call (SERP provider, page scraping, NLP, generative APIs)
//! goes through one shared [`ApiClient`], which paces dispatch per endpoint
//! class, retries transient failures with exponential backoff, and honors a
//! cancellation token while waiting. Concurrency above this layer is bounded
//! by the pacing intervals, not by worker count.

pub mod client;
pub mod error;
pub mod generative;
pub mod pacer;
mod retry;

pub use client::ApiClient;
pub use error::ApiError;
pub use generative::{ChatCompletionsProvider, GenerativeProvider, ProviderChain};
pub use pacer::{EndpointClass, Pacer};
