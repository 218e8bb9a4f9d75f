//! These models represent the values passed between the pipeline stages
//!
//! - messages and requests, sent from a stage to the completion client
//! - completion responses and usage, returned by the provider
//! - search results and ranked documents, moved from search to scrape to distillation
//!
//! The wire formats of the remote API are kept private to the provider; these
//! structs are the internal representation every stage works with.
pub mod completion;
pub mod message;
pub mod search;
