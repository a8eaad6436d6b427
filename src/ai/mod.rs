//! Provider implementations of the [`crate::traits::Completion`] trait.

mod openai;

pub use openai::OpenAI;
