pub mod gemini;
pub mod mistral;
pub mod traits;

pub use gemini::GeminiProvider;
pub use mistral::MistralOcr;
pub use traits::{CompletionProvider, OcrProvider, Retriever};
