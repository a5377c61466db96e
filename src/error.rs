//! Error types for consensus validation

use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ConsensusError {
    /// Decoding failed: truncated, overlong or otherwise ill-formed bytes
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(Cow<'static, str>),

    /// A committed hash does not match the recomputed value
    #[error("Hash mismatch in {field}: expected {expected}, got {actual}")]
    HashMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    /// Header claims a consensus mode its fields do not support
    #[error("Invalid consensus mode: {0}")]
    InvalidConsensusMode(Cow<'static, str>),

    /// Stake origin is spent, missing, or not deep enough
    #[error("Stake input unavailable: {0}")]
    StakeInputUnavailable(Cow<'static, str>),

    /// Stake modifier for the eligible height has not been indexed yet
    #[error("Stake modifier not ready for height {height}")]
    ModifierNotReady { height: u64 },

    #[error("Invalid signature: {0}")]
    SignatureInvalid(Cow<'static, str>),

    /// Kernel hash above the weight-scaled target
    #[error("Kernel hash does not meet target")]
    KernelTargetNotMet,

    #[error("Invalid amount: required at least {required}, got {actual}")]
    InvalidAmount { required: i64, actual: i64 },

    #[error("Invalid proof of work: {0}")]
    InvalidProofOfWork(Cow<'static, str>),
}

impl ConsensusError {
    /// Errors that reject the candidate block outright and justify
    /// penalising the peer that relayed it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConsensusError::MalformedEncoding(_) | ConsensusError::SignatureInvalid(_)
        )
    }

    /// Routine outcomes of a staking search loop. Callers retry or move on
    /// rather than reporting these.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            ConsensusError::ModifierNotReady { .. } | ConsensusError::KernelTargetNotMet
        )
    }

    pub(crate) fn truncated(what: &'static str) -> Self {
        ConsensusError::MalformedEncoding(Cow::Owned(format!("truncated {what}")))
    }
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
