//! # jobcity
//!
//! Classify free-text records (for example job descriptions labelled with the
//! city they were posted in) and measure how well that works.
//!
//! A [`ClassificationPipeline`] selects the most frequent labels, turns the
//! text into a sparse count or TF-IDF matrix with
//! [`jobcity_preprocessing::TextPreprocessor`], and trains any [`Classifier`].
//! Cross-validation reports per-fold accuracy, the summed confusion matrix
//! and per-class precision/recall/F1.
//!
//! ## Quick Start
//!
//! ```rust
//! use jobcity::{ClassificationPipeline, MultinomialNb, PreprocessorConfig, Record};
//!
//! let records = vec![
//!     Record::new("harbor seafood lobster", "boston"),
//!     Record::new("harbor seafood ferry", "boston"),
//!     Record::new("mountain skiing altitude", "denver"),
//!     Record::new("mountain skiing brewery", "denver"),
//! ];
//!
//! let mut pipeline =
//!     ClassificationPipeline::new(MultinomialNb::new(), PreprocessorConfig::default())?;
//! pipeline.fit(&records)?;
//! let labels = pipeline.predict_labels(&["fresh seafood"])?;
//! assert_eq!(labels, vec!["boston".to_string()]);
//! # Ok::<(), jobcity::PipelineError>(())
//! ```
//!
//! `pipeline.cross_validate(&records, num_folds)` selects the classes once,
//! re-fits the pre-processor and classifier on each training fold and returns a [`CrossValidationReport`] that prints as a
//! table.

#[cfg(feature = "cli")]
pub mod cli;

pub mod classifier;
pub mod cross_validation;
mod error;
pub mod metrics;
mod pipeline;

pub use classifier::{AdaBoostStumps, Classifier, FeatureImportances, MultinomialNb};
pub use cross_validation::KFold;
pub use error::{ClassifierError, PipelineError, Result};
pub use jobcity_preprocessing::{
    data_loader, DocFrequency, PreprocessorConfig, Record, StemLem, StopWords, Weighting,
};
pub use metrics::{score_report, ClassScores, CrossValidationReport, FeatureReport};
pub use pipeline::ClassificationPipeline;
