// -
// Connection defaults

/// Default watch API address
pub(crate) const DEFAULT_TARGET: &str = "127.0.0.1:12090";

/// Prefix of a target carrying a comma separated list of addresses
pub(crate) const MULTI_TARGET_PREFIX: &str = "multi:///";

/// Delay before retrying after a transport error
pub(crate) const DEFAULT_ERROR_DELAY_MS: u64 = 1000;

/// Max gRPC message size (4MB)
pub(crate) const DEFAULT_MAX_MSG_SIZE: usize = 4 << 20;

pub(crate) const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1000;
pub(crate) const DEFAULT_TCP_KEEPALIVE_IN_SECS: u64 = 300;
pub(crate) const DEFAULT_HTTP2_KEEP_ALIVE_INTERVAL_IN_SECS: u64 = 60;
pub(crate) const DEFAULT_HTTP2_KEEP_ALIVE_TIMEOUT_IN_SECS: u64 = 20;

// -
// Round delivery

/// Pending aggregates buffered between the grouper and the caller
pub(crate) const RESULTS_CHANNEL_CAPACITY: usize = 100;

// -
// Environment

/// Environment variables prefix, e.g. `LOCALNET__TARGET`
pub(crate) const ENV_PREFIX: &str = "LOCALNET";
pub(crate) const ENV_CONFIG_PATH: &str = "CONFIG_PATH";
