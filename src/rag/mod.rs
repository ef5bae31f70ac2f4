pub mod parsing;
pub mod pipeline;
pub mod prompt;
pub mod schema;

pub use pipeline::{ProductRetriever, PromptInputs, RagError, RagPipeline};
pub use schema::{RagAnswer, SchemaError};
