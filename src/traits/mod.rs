//! Core trait abstractions.
//!
//! These traits define the seams between the pipeline and its external
//! collaborators: the completion service and the retrieval index.

pub mod completion;
pub mod retriever;

pub use completion::{find_json_object, Completion, CompletionOptions};
pub use retriever::{Retriever, ScoredChunk};
