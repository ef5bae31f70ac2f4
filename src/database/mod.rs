pub mod vector_db;

pub use vector_db::{CandidateDocument, VectorDB, VectorDBError};
