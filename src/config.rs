//! Configuration for hybrid-consensus
//!
//! Provides the tunable parameters of stake eligibility, proof-of-work limits
//! and decoder bounds. These settings can be loaded from config files,
//! environment variables, or passed programmatically.

use crate::constants::{
    DEFAULT_MIN_STAKE_DEPTH, DEFAULT_POW_LIMIT_BITS, DEFAULT_STAKE_SPLIT_THRESHOLD,
    MAX_BLOCK_SERIALIZED_SIZE, MAX_BLOCK_SIGNATURE_SIZE, MAX_LOCATOR_ENTRIES,
};
use crate::types::Amount;
use serde::{Deserialize, Serialize};

/// Stake eligibility parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeParams {
    /// Confirmations an origin block needs before its outputs may stake
    /// Default: 100
    #[serde(default = "default_min_stake_depth")]
    pub min_stake_depth: u64,

    /// Blocks past the origin height whose stake modifier the kernel uses
    /// Default: 1
    #[serde(default = "default_modifier_offset")]
    pub modifier_offset: u64,

    /// Coinstake returns above this are split into two outputs
    /// Default: 2000 coins
    #[serde(default = "default_stake_split_threshold")]
    pub stake_split_threshold: Amount,

    /// Attempt times tried per `HybridConsensus::search_kernel` call, in seconds
    /// Default: 64
    #[serde(default = "default_max_search_window")]
    pub max_search_window: u32,
}

fn default_min_stake_depth() -> u64 {
    DEFAULT_MIN_STAKE_DEPTH
}

fn default_modifier_offset() -> u64 {
    1
}

fn default_stake_split_threshold() -> Amount {
    DEFAULT_STAKE_SPLIT_THRESHOLD
}

fn default_max_search_window() -> u32 {
    64
}

impl Default for StakeParams {
    fn default() -> Self {
        Self {
            min_stake_depth: default_min_stake_depth(),
            modifier_offset: default_modifier_offset(),
            stake_split_threshold: default_stake_split_threshold(),
            max_search_window: default_max_search_window(),
        }
    }
}

/// Proof-of-work parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowParams {
    /// Easiest target a proof-of-work header may claim, compact form
    /// Default: 0x1e0fffff
    #[serde(default = "default_pow_limit_bits")]
    pub pow_limit_bits: u32,
}

fn default_pow_limit_bits() -> u32 {
    DEFAULT_POW_LIMIT_BITS
}

impl Default for PowParams {
    fn default() -> Self {
        Self {
            pow_limit_bits: default_pow_limit_bits(),
        }
    }
}

/// Decoder bounds for data arriving from peers
///
/// These limits protect against DoS attacks by bounding allocation before
/// any hashing happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLimits {
    /// Maximum hashes in a block locator
    /// Default: 101
    #[serde(default = "default_max_locator_entries")]
    pub max_locator_entries: usize,

    /// Maximum serialized block size in bytes
    /// Default: 4,000,000
    #[serde(default = "default_max_block_size")]
    pub max_block_size: usize,

    /// Maximum block signature length in bytes
    /// Default: 80
    #[serde(default = "default_max_block_signature_len")]
    pub max_block_signature_len: usize,
}

fn default_max_locator_entries() -> usize {
    MAX_LOCATOR_ENTRIES
}

fn default_max_block_size() -> usize {
    MAX_BLOCK_SERIALIZED_SIZE
}

fn default_max_block_signature_len() -> usize {
    MAX_BLOCK_SIGNATURE_SIZE
}

impl Default for NetworkLimits {
    fn default() -> Self {
        Self {
            max_locator_entries: default_max_locator_entries(),
            max_block_size: default_max_block_size(),
            max_block_signature_len: default_max_block_signature_len(),
        }
    }
}

/// Debug and development configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DebugConfig {
    /// Emit a `warn` event for every rejected block
    /// Default: false
    #[serde(default)]
    pub log_rejections: bool,
}

/// Complete consensus configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConsensusConfig {
    /// Stake eligibility
    #[serde(default)]
    pub stake: StakeParams,

    /// Proof-of-work limits
    #[serde(default)]
    pub pow: PowParams,

    /// Decoder bounds
    #[serde(default)]
    pub network_limits: NetworkLimits,

    #[serde(default)]
    pub debug: DebugConfig,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|val| val.trim().parse().ok())
}

/// Parse a compact target given as decimal or `0x`-prefixed hex
fn env_parse_bits(key: &str) -> Option<u32> {
    let val = std::env::var(key).ok()?;
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

impl ConsensusConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: `HYBRID_CONSENSUS_<SECTION>_<KEY>`
    ///
    /// Examples:
    /// - `HYBRID_CONSENSUS_STAKE_MIN_STAKE_DEPTH=600`
    /// - `HYBRID_CONSENSUS_POW_POW_LIMIT_BITS=0x1e0fffff`
    /// - `HYBRID_CONSENSUS_NETWORK_LIMITS_MAX_LOCATOR_ENTRIES=101`
    ///
    /// Unset or unparsable variables leave the default in place.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(depth) = env_parse("HYBRID_CONSENSUS_STAKE_MIN_STAKE_DEPTH") {
            config.stake.min_stake_depth = depth;
        }
        if let Some(offset) = env_parse("HYBRID_CONSENSUS_STAKE_MODIFIER_OFFSET") {
            config.stake.modifier_offset = offset;
        }
        if let Some(threshold) = env_parse("HYBRID_CONSENSUS_STAKE_STAKE_SPLIT_THRESHOLD") {
            config.stake.stake_split_threshold = threshold;
        }
        if let Some(window) = env_parse("HYBRID_CONSENSUS_STAKE_MAX_SEARCH_WINDOW") {
            config.stake.max_search_window = window;
        }

        if let Some(bits) = env_parse_bits("HYBRID_CONSENSUS_POW_POW_LIMIT_BITS") {
            config.pow.pow_limit_bits = bits;
        }

        if let Some(limit) = env_parse("HYBRID_CONSENSUS_NETWORK_LIMITS_MAX_LOCATOR_ENTRIES") {
            config.network_limits.max_locator_entries = limit;
        }
        if let Some(size) = env_parse("HYBRID_CONSENSUS_NETWORK_LIMITS_MAX_BLOCK_SIZE") {
            config.network_limits.max_block_size = size;
        }
        if let Some(len) = env_parse("HYBRID_CONSENSUS_NETWORK_LIMITS_MAX_BLOCK_SIGNATURE_LEN") {
            config.network_limits.max_block_signature_len = len;
        }

        if let Some(enabled) = env_parse("HYBRID_CONSENSUS_DEBUG_LOG_REJECTIONS") {
            config.debug.log_rejections = enabled;
        }

        config
    }
}

/// Global consensus configuration instance
///
/// Initialized once at startup. All consensus entry points that are not
/// handed a config explicitly read this one.
static GLOBAL_CONSENSUS_CONFIG: std::sync::OnceLock<ConsensusConfig> = std::sync::OnceLock::new();

/// Initialize global consensus configuration
///
/// Should be called once at startup, before any validation. Returns the
/// rejected config if one was already installed.
pub fn init_consensus_config(config: ConsensusConfig) -> Result<(), ConsensusConfig> {
    GLOBAL_CONSENSUS_CONFIG.set(config)
}

/// Get global consensus configuration
///
/// Returns the global config if initialized, otherwise loads one from the
/// environment.
pub fn get_consensus_config() -> ConsensusConfig {
    GLOBAL_CONSENSUS_CONFIG
        .get()
        .cloned()
        .unwrap_or_else(ConsensusConfig::from_env)
}
