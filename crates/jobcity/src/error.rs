use jobcity_preprocessing::Error as PreprocessingError;

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("data shape error: {0}")]
    DataShape(String),

    #[error("classifier must be fitted before it can predict")]
    NotFitted,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("pipeline must be fitted first")]
    NotFitted,

    /// The classifier does not expose feature importances.
    #[error("classifier does not expose feature importances")]
    UnsupportedModel,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("data shape error: {0}")]
    DataShape(String),

    #[error(transparent)]
    Preprocessing(PreprocessingError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

impl From<PreprocessingError> for PipelineError {
    fn from(err: PreprocessingError) -> Self {
        match err {
            PreprocessingError::NotFitted => Self::NotFitted,
            PreprocessingError::InvalidConfiguration(msg) => Self::InvalidConfiguration(msg),
            PreprocessingError::DataShape(msg) => Self::DataShape(msg),
            other => Self::Preprocessing(other),
        }
    }
}
