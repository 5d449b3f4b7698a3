use thiserror::Error;

use crate::model::training::{MediaRefError, TrainingError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Training(#[from] TrainingError),
    #[error(transparent)]
    MediaRef(#[from] MediaRefError),
}
