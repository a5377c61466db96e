//! Stake backed by a fixed-denomination commitment
//!
//! The commitment is minted by an output of exactly `denomination` and
//! identified on spend by its serial hash. Staking reveals the serial, so a
//! commitment can win at most once: once the serial is spent the input is
//! gone.

use super::{modifier_after, resolve_output, signer_of, unavailable, ChainIndex, IndexEntry, StakeInput};
use crate::config::StakeParams;
use crate::error::{ConsensusError, Result};
use crate::types::{
    Amount, ByteString, Hash, OutPoint, StakeModifier, Transaction, TransactionInput,
    TransactionOutput,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenominatedStake {
    mint: OutPoint,
    serial_hash: Hash,
    denomination: Amount,
    modifier_offset: u64,
}

impl DenominatedStake {
    pub fn new(mint: OutPoint, serial_hash: Hash, denomination: Amount, params: &StakeParams) -> Self {
        DenominatedStake {
            mint,
            serial_hash,
            denomination,
            modifier_offset: params.modifier_offset,
        }
    }

    pub fn serial_hash(&self) -> &Hash {
        &self.serial_hash
    }

    pub fn denomination(&self) -> Amount {
        self.denomination
    }

    fn mint_output(&self, chain: &dyn ChainIndex) -> Result<TransactionOutput> {
        let (tx, _) = resolve_output(chain, &self.mint)?;
        let mut outputs = tx.outputs;
        let output = outputs.swap_remove(self.mint.index as usize);
        if output.value != self.denomination {
            return Err(unavailable(format!(
                "mint output {} holds {}, not denomination {}",
                self.mint, output.value, self.denomination
            )));
        }
        Ok(output)
    }
}

impl StakeInput for DenominatedStake {
    fn origin_index(&self, chain: &dyn ChainIndex) -> Result<IndexEntry> {
        resolve_output(chain, &self.mint).map(|(_, entry)| entry)
    }

    /// Spends the mint, revealing the serial hash and committing to
    /// `output_hash` in the input script.
    fn create_tx_in(
        &self,
        chain: &dyn ChainIndex,
        output_hash: Option<Hash>,
    ) -> Result<TransactionInput> {
        self.check_unspent(chain)?;
        let mut script_sig = Vec::with_capacity(64);
        script_sig.extend_from_slice(&self.serial_hash);
        if let Some(hash) = output_hash {
            script_sig.extend_from_slice(&hash);
        }
        Ok(TransactionInput::new(self.mint, script_sig))
    }

    fn source_transaction(&self, chain: &dyn ChainIndex) -> Result<Transaction> {
        resolve_output(chain, &self.mint).map(|(tx, _)| tx)
    }

    fn value(&self, chain: &dyn ChainIndex) -> Result<Amount> {
        Ok(self.mint_output(chain)?.value)
    }

    /// Re-mints the same denomination and pays the remainder, if any, to the
    /// same script.
    fn create_tx_outs(
        &self,
        chain: &dyn ChainIndex,
        total: Amount,
    ) -> Result<Vec<TransactionOutput>> {
        if total < self.denomination {
            return Err(ConsensusError::InvalidAmount {
                required: self.denomination,
                actual: total,
            });
        }
        let script = self.mint_output(chain)?.script_pubkey;
        let remainder = total - self.denomination;

        let mut outputs = vec![TransactionOutput::new(self.denomination, script.clone())];
        if remainder > 0 {
            outputs.push(TransactionOutput::new(remainder, script));
        }
        Ok(outputs)
    }

    fn modifier(&self, chain: &dyn ChainIndex) -> Result<StakeModifier> {
        let origin = self.origin_index(chain)?;
        modifier_after(chain, origin.height, self.modifier_offset)
    }

    fn uniqueness(&self, _chain: &dyn ChainIndex) -> Result<ByteString> {
        Ok(self.serial_hash.to_vec())
    }

    fn signer(&self, chain: &dyn ChainIndex) -> Result<ByteString> {
        signer_of(&self.mint_output(chain)?.script_pubkey)
    }

    /// Spent once the serial is revealed, whatever happened to the mint
    fn check_unspent(&self, chain: &dyn ChainIndex) -> Result<()> {
        if chain.is_serial_spent(&self.serial_hash) {
            return Err(unavailable("serial already spent"));
        }
        Ok(())
    }
}
