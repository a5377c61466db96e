//! Block locator
//!
//! A sparse list of block hashes, densest near the sender's tip, that lets a
//! peer find the last block both sides share. Building one from a chain is
//! the chain index's job; this type only carries and encodes the list.

use crate::types::Hash;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLocator {
    pub have: Vec<Hash>,
}

impl BlockLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_hashes(have: Vec<Hash>) -> Self {
        BlockLocator { have }
    }

    pub fn set_null(&mut self) {
        self.have.clear();
    }

    /// Null iff the list is empty
    pub fn is_null(&self) -> bool {
        self.have.is_empty()
    }
}
