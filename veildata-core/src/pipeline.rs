//! Encrypted-column pipeline: Empty → Encrypted → Modified → Decrypted.
//!
//! Each pipeline owns at most one ciphertext and is never shared; long
//! encrypts move the whole pipeline into a worker thread and hand it back
//! through [`PendingEncrypt`], so no operation can race the encryption. The
//! shared context stays read-only behind `Arc`.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::debug;
use veildata_ckks::{Ciphertext, CkksContext, CkksError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid pipeline state: {0}")]
    InvalidState(&'static str),
    #[error(transparent)]
    Encryption(#[from] CkksError),
    #[error("encryption worker terminated abnormally")]
    WorkerFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Empty,
    Encrypted,
    Modified,
    Decrypted,
}

pub struct ColumnPipeline {
    context: Arc<CkksContext>,
    rng: ChaCha20Rng,
    state: PipelineState,
    ciphertext: Option<Ciphertext>,
}

impl ColumnPipeline {
    pub fn new(context: Arc<CkksContext>) -> Self {
        Self::with_seed(context, random_seed())
    }

    pub fn with_seed(context: Arc<CkksContext>, seed: [u8; 32]) -> Self {
        Self {
            context,
            rng: ChaCha20Rng::from_seed(seed),
            state: PipelineState::Empty,
            ciphertext: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn context(&self) -> &Arc<CkksContext> {
        &self.context
    }

    /// Encrypts a column as one packed ciphertext. Legal from every state;
    /// a previously held ciphertext is discarded only once the new one
    /// exists, so a failed encrypt leaves the pipeline unchanged.
    pub fn encrypt(&mut self, values: &[f64]) -> Result<(), PipelineError> {
        let ciphertext = self.context.encrypt(values, &mut self.rng)?;
        if self.ciphertext.replace(ciphertext).is_some() {
            debug!("discarding previous ciphertext on re-encrypt");
        }
        self.state = PipelineState::Encrypted;
        Ok(())
    }

    /// Homomorphically adds a public scalar to the held ciphertext.
    pub fn add_scalar(&mut self, scalar: f64) -> Result<(), PipelineError> {
        match self.state {
            PipelineState::Empty => Err(PipelineError::InvalidState("encrypt data first")),
            PipelineState::Decrypted => Err(PipelineError::InvalidState(
                "pipeline already decrypted; encrypt a new column first",
            )),
            PipelineState::Encrypted | PipelineState::Modified => {
                let Some(ciphertext) = self.ciphertext.as_ref() else {
                    return Err(PipelineError::InvalidState("encrypt data first"));
                };
                let modified = self.context.add_plain_scalar(ciphertext, scalar)?;
                self.ciphertext = Some(modified);
                self.state = PipelineState::Modified;
                Ok(())
            }
        }
    }

    /// Decrypts and decodes the held ciphertext. The returned values match
    /// the ideal arithmetic only approximately; see
    /// [`veildata_ckks::DECRYPT_TOLERANCE`].
    pub fn decrypt(&mut self) -> Result<Vec<f64>, PipelineError> {
        match self.state {
            PipelineState::Empty => Err(PipelineError::InvalidState(
                "encrypt and modify data first",
            )),
            PipelineState::Decrypted => Err(PipelineError::InvalidState(
                "ciphertext already decrypted; encrypt a new column first",
            )),
            PipelineState::Encrypted | PipelineState::Modified => {
                let Some(ciphertext) = self.ciphertext.as_ref() else {
                    return Err(PipelineError::InvalidState(
                        "encrypt and modify data first",
                    ));
                };
                let values = self.context.decrypt(ciphertext)?;
                self.state = PipelineState::Decrypted;
                Ok(values)
            }
        }
    }

    /// Runs the expensive encrypt on a worker thread. The pipeline moves
    /// into the worker, so follow-up operations are only possible once
    /// [`PendingEncrypt::wait`] hands it back.
    pub fn encrypt_background(mut self, values: Vec<f64>) -> PendingEncrypt {
        debug!(len = values.len(), "spawning background encrypt");
        let handle = thread::spawn(move || {
            self.encrypt(&values)?;
            Ok(self)
        });
        PendingEncrypt { handle }
    }
}

/// Handle to an in-flight background encrypt.
pub struct PendingEncrypt {
    handle: JoinHandle<Result<ColumnPipeline, PipelineError>>,
}

impl PendingEncrypt {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the worker completes and returns the pipeline in
    /// `Encrypted` state, or the typed failure that stopped it.
    pub fn wait(self) -> Result<ColumnPipeline, PipelineError> {
        self.handle.join().map_err(|_| PipelineError::WorkerFailed)?
    }
}

fn random_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    let mut rng = rand::rngs::StdRng::from_entropy();
    rng.fill_bytes(&mut seed);
    seed
}
