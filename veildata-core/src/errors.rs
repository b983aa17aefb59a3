use thiserror::Error;
use veildata_ckks::CkksError;

use crate::{dataset::DatasetError, dp::DpError, pipeline::PipelineError};

pub type VeildataResult<T> = Result<T, VeildataError>;

#[derive(Debug, Error)]
pub enum VeildataError {
    #[error(transparent)]
    InvalidParameter(#[from] DpError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Encryption(#[from] CkksError),
}
