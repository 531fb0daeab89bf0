// Dataset acquisition, loading, and the stratified train/test split.

pub mod corpus;
pub mod download;
pub mod split;
