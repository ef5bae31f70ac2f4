pub mod api;
pub mod config;
pub mod database;
pub mod nutrition;
pub mod providers;
pub mod rag;

// Re-export commonly used items
pub use config::Settings;
pub use rag::pipeline::RagPipeline;
pub use rag::schema::RagAnswer;
