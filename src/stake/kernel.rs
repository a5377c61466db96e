//! Stake kernel protocol
//!
//! `kernel = hash256(le64(modifier) || le32(stake_time) || uniqueness || le32(attempt_time))`
//!
//! `stake_time` is the time of the block that confirmed the staked value.
//! A kernel wins when `U256(kernel) < expand_target(bits) * value`: larger
//! stakes get proportionally easier targets.

use super::{ChainIndex, StakeInput};
use crate::crypto::Hasher256;
use crate::error::{ConsensusError, Result};
use crate::pow::{expand_target, U256};
use crate::types::{Amount, Hash, StakeModifier};

/// A winning kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelHit {
    pub attempt_time: u32,
    pub kernel_hash: Hash,
}

pub fn compute_kernel_hash(
    modifier: StakeModifier,
    stake_time: u32,
    uniqueness: &[u8],
    attempt_time: u32,
) -> Hash {
    let mut hasher = Hasher256::new();
    hasher
        .write_u64(modifier)
        .write_u32(stake_time)
        .write(uniqueness)
        .write_u32(attempt_time);
    hasher.finalize()
}

/// Weight-scaled target: `expand_target(bits) * value`, saturating at 2^256 - 1
pub fn stake_target(bits: u32, value: Amount) -> Result<U256> {
    if value <= 0 {
        return Err(ConsensusError::InvalidAmount {
            required: 1,
            actual: value,
        });
    }
    Ok(expand_target(bits)?.saturating_mul_u64(value as u64))
}

/// Kernel inputs that do not change across attempt times
struct KernelInputs {
    modifier: StakeModifier,
    stake_time: u32,
    uniqueness: Vec<u8>,
    target: U256,
}

fn gather(input: &dyn StakeInput, chain: &dyn ChainIndex, bits: u32) -> Result<KernelInputs> {
    let origin = input.origin_index(chain)?;
    let modifier = input.modifier(chain)?;
    let uniqueness = input.uniqueness(chain)?;
    let target = stake_target(bits, input.value(chain)?)?;
    Ok(KernelInputs {
        modifier,
        stake_time: origin.time,
        uniqueness,
        target,
    })
}

fn attempt(inputs: &KernelInputs, attempt_time: u32) -> Result<Hash> {
    if attempt_time <= inputs.stake_time {
        return Err(ConsensusError::StakeInputUnavailable(
            format!(
                "attempt time {attempt_time} not after origin time {}",
                inputs.stake_time
            )
            .into(),
        ));
    }
    let kernel =
        compute_kernel_hash(inputs.modifier, inputs.stake_time, &inputs.uniqueness, attempt_time);
    if U256::from(&kernel) < inputs.target {
        Ok(kernel)
    } else {
        Err(ConsensusError::KernelTargetNotMet)
    }
}

/// Check one attempt time. Returns the kernel hash on success.
pub fn check_stake_kernel(
    input: &dyn StakeInput,
    chain: &dyn ChainIndex,
    bits: u32,
    attempt_time: u32,
) -> Result<Hash> {
    let inputs = gather(input, chain, bits)?;
    attempt(&inputs, attempt_time)
}

/// Try attempt times `start_time .. start_time + window` in order and return
/// the first hit, or `KernelTargetNotMet` when the window is exhausted.
pub fn search_kernel(
    input: &dyn StakeInput,
    chain: &dyn ChainIndex,
    bits: u32,
    start_time: u32,
    window: u32,
) -> Result<KernelHit> {
    let inputs = gather(input, chain, bits)?;

    for attempt_time in start_time..start_time.saturating_add(window) {
        match attempt(&inputs, attempt_time) {
            Ok(kernel_hash) => {
                tracing::debug!(attempt_time, "stake kernel found");
                return Ok(KernelHit {
                    attempt_time,
                    kernel_hash,
                });
            }
            Err(ConsensusError::KernelTargetNotMet) => continue,
            Err(e) => return Err(e),
        }
    }

    tracing::debug!(start_time, window, "no stake kernel in window");
    Err(ConsensusError::KernelTargetNotMet)
}
