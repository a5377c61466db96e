//! Consensus and wire-format constants

/// One coin in base units
pub const COIN: i64 = 100_000_000;

/// Mask applied to the header time before it feeds the proof-of-work digest.
/// Clears the low 7 bits, so the time component changes every 128 seconds.
pub const TIME_MASK: u32 = 0xffff_ff80;

/// Output index marking a null outpoint
pub const NULL_INDEX: u32 = u32::MAX;

/// Protocol version written in front of network-purpose locators
pub const PROTOCOL_VERSION: i32 = 70_017;

/// Serialized header size without the two flag bytes:
/// version(4) + prev(32) + merkle(32) + time(4) + bits(4) + nonce(4) + prevout_stake(36)
pub const HEADER_HASH_SIZE: usize = 116;

/// Serialized header size on the wire, flags included
pub const HEADER_NETWORK_SIZE: usize = HEADER_HASH_SIZE + 2;

/// Prefix of the header fed to the proof-of-work mixer (version through nonce)
pub const POW_PREFIX_SIZE: usize = 80;

/// Maximum block serialized size in bytes
pub const MAX_BLOCK_SERIALIZED_SIZE: usize = 4_000_000;

/// Maximum number of inputs or outputs per transaction accepted by the decoder
pub const MAX_TX_IO: usize = 100_000;

/// Maximum script length accepted by the decoder
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum entries in a block locator (Bitcoin Core MAX_LOCATOR_SZ)
pub const MAX_LOCATOR_ENTRIES: usize = 101;

/// Maximum length of a DER-encoded block signature
pub const MAX_BLOCK_SIGNATURE_SIZE: usize = 80;

/// Blocks a stake origin must be buried under before it may stake
pub const DEFAULT_MIN_STAKE_DEPTH: u64 = 100;

/// Stake outputs above this total are split in two
pub const DEFAULT_STAKE_SPLIT_THRESHOLD: i64 = 2000 * COIN;

/// Loosest target any block may claim
pub const DEFAULT_POW_LIMIT_BITS: u32 = 0x1e0f_ffff;
