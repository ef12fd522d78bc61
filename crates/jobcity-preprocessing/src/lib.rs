//! Text pre-processing for jobcity.
//!
//! Turns raw labelled records into a sparse feature matrix: class selection,
//! stop-word removal, stemming/lemmatization and count or TF-IDF
//! vectorization over fixed-width word n-grams.

pub mod data;
pub mod data_loader;
mod error;
pub mod pre_processor;

pub use data::{ClassSelection, ModelData, Record};
pub use error::{Error, Result};
pub use pre_processor::{
    DocFrequency, PreprocessorConfig, StemLem, StopWords, TextPreprocessor, Weighting,
};
