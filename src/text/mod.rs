// Text cleaning: the deterministic string contract every later stage consumes.

pub mod normalize;
pub mod stopwords;

pub use normalize::normalize;
