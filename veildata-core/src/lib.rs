//! veildata-core – privacy-preserving transformation engines for tabular
//! data. Two independent paths over the same column-oriented dataset: a
//! per-column differential-privacy transformer (Laplace and analytic
//! Gaussian mechanisms with per-cell independent draws) and an
//! encrypted-column pipeline driving the CKKS-style substrate in
//! `veildata-ckks` through an explicit encrypt → add-scalar → decrypt state
//! machine. Both read the source dataset immutably and produce new values.

pub mod config;
pub mod dataset;
pub mod dp;
pub mod errors;
pub mod pipeline;
pub mod transform;

pub use config::{Mechanism, PrivacyConfig, PrivacySettings};
pub use dataset::{Column, ColumnData, ColumnSummary, Dataset, DatasetError};
pub use dp::DpError;
pub use errors::{VeildataError, VeildataResult};
pub use pipeline::{ColumnPipeline, PendingEncrypt, PipelineError, PipelineState};
pub use transform::DatasetPrivacyTransformer;
pub use veildata_ckks::{Ciphertext, CkksContext, CkksError, CkksParams, DECRYPT_TOLERANCE};
