//! System-wide constants for the SlotBook order-book object.

/// Number of order slots in every order-book state. Never resized.
pub const ORDER_SLOTS: usize = 100;

/// Maximum ticker length in bytes.
pub const TICKER_MAX_LEN: usize = 8;

/// Length of a settlement address (a 20-byte public key hash).
pub const ADDR_LEN: usize = 20;

/// Width of one persisted order record:
/// `ticker_len(1) + ticker(8) + quantity(8) + price(8) + side(1) + addr(20) + closed(1)`.
pub const RECORD_SIZE: usize = 1 + TICKER_MAX_LEN + 8 + 8 + 1 + ADDR_LEN + 1;

/// Width of a fully encoded order-book state.
pub const STATE_SIZE: usize = ORDER_SLOTS * RECORD_SIZE;

/// Tag prefixed to every contract locking script.
pub const CONTRACT_SCRIPT_TAG: &[u8] = b"slotbook:v1";

/// Satoshis per whole coin, used when converting order-entry prices.
pub const SATS_PER_COIN: u64 = 100_000_000;

/// Transaction format version written by the builder.
pub const TX_VERSION: u32 = 1;

/// Input sequence number written by the builder.
pub const DEFAULT_INPUT_SEQUENCE: u32 = 0xFFFF_FFFF;

/// Balance locked into the contract output at deployment.
pub const DEFAULT_DEPLOY_BALANCE: u64 = 1;

/// File the deployment writes the contract script hash to.
pub const DEFAULT_SCRIPT_HASH_FILE: &str = ".scriptHash";

/// Default fee the builder leaves to the network, in satoshis.
pub const DEFAULT_TX_FEE: u64 = 500;

/// Buffered state updates per subscription before a slow reader lags.
pub const SUBSCRIPTION_CAPACITY: usize = 256;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "SlotBook";
