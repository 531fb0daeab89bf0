// newsclass: news article classification pipeline
//
// This is the library root. Each module corresponds to one concern of the
// preprocess -> features -> train -> evaluate pipeline.

pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod status;
pub mod text;
