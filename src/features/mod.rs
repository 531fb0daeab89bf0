// Feature engineering: vocabulary construction and TF-IDF sparse matrices.

pub mod matrix;
pub mod tfidf;
pub mod vocabulary;

pub use matrix::{SparseMatrix, SparseRow};
pub use tfidf::{transform, TfIdfVectorizer};
pub use vocabulary::Vocabulary;
