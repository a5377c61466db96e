//! Stake backed by a plain previous output

use super::{modifier_after, resolve_output, signer_of, unavailable, ChainIndex, IndexEntry, StakeInput};
use crate::config::StakeParams;
use crate::error::{ConsensusError, Result};
use crate::types::{
    Amount, ByteString, Hash, OutPoint, StakeModifier, Transaction, TransactionInput,
    TransactionOutput,
};

/// Stake that spends `outpoint`.
///
/// Uniqueness is `le32(index) || txid`. The coinstake returns the whole
/// total to the staked script, split into two halves above the split
/// threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransparentStake {
    outpoint: OutPoint,
    modifier_offset: u64,
    split_threshold: Amount,
}

impl TransparentStake {
    pub fn new(outpoint: OutPoint, params: &StakeParams) -> Self {
        TransparentStake {
            outpoint,
            modifier_offset: params.modifier_offset,
            split_threshold: params.stake_split_threshold,
        }
    }

    pub fn outpoint(&self) -> &OutPoint {
        &self.outpoint
    }

    fn staked_output(&self, chain: &dyn ChainIndex) -> Result<TransactionOutput> {
        let (tx, _) = resolve_output(chain, &self.outpoint)?;
        let mut outputs = tx.outputs;
        Ok(outputs.swap_remove(self.outpoint.index as usize))
    }
}

impl StakeInput for TransparentStake {
    fn origin_index(&self, chain: &dyn ChainIndex) -> Result<IndexEntry> {
        resolve_output(chain, &self.outpoint).map(|(_, entry)| entry)
    }

    fn create_tx_in(
        &self,
        chain: &dyn ChainIndex,
        _output_hash: Option<Hash>,
    ) -> Result<TransactionInput> {
        self.check_unspent(chain)?;
        Ok(TransactionInput::new(self.outpoint, Vec::new()))
    }

    fn source_transaction(&self, chain: &dyn ChainIndex) -> Result<Transaction> {
        resolve_output(chain, &self.outpoint).map(|(tx, _)| tx)
    }

    fn value(&self, chain: &dyn ChainIndex) -> Result<Amount> {
        Ok(self.staked_output(chain)?.value)
    }

    fn create_tx_outs(
        &self,
        chain: &dyn ChainIndex,
        total: Amount,
    ) -> Result<Vec<TransactionOutput>> {
        let staked = self.staked_output(chain)?;
        if total < staked.value {
            return Err(ConsensusError::InvalidAmount {
                required: staked.value,
                actual: total,
            });
        }

        let script = staked.script_pubkey;
        if total > self.split_threshold {
            let half = total / 2;
            Ok(vec![
                TransactionOutput::new(half, script.clone()),
                TransactionOutput::new(total - half, script),
            ])
        } else {
            Ok(vec![TransactionOutput::new(total, script)])
        }
    }

    fn modifier(&self, chain: &dyn ChainIndex) -> Result<StakeModifier> {
        let origin = self.origin_index(chain)?;
        modifier_after(chain, origin.height, self.modifier_offset)
    }

    fn uniqueness(&self, _chain: &dyn ChainIndex) -> Result<ByteString> {
        let mut out = Vec::with_capacity(36);
        out.extend_from_slice(&self.outpoint.index.to_le_bytes());
        out.extend_from_slice(&self.outpoint.hash);
        Ok(out)
    }

    fn signer(&self, chain: &dyn ChainIndex) -> Result<ByteString> {
        signer_of(&self.staked_output(chain)?.script_pubkey)
    }

    fn check_unspent(&self, chain: &dyn ChainIndex) -> Result<()> {
        if chain.is_spent(&self.outpoint) {
            return Err(unavailable(format!("{} already spent", self.outpoint)));
        }
        Ok(())
    }
}
