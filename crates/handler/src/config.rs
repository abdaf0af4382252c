//! Host configuration.

use std::fmt;
use std::str::FromStr;

use ibc_engine_types::connection::{MerklePrefix, Version};
use ibc_engine_types::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[doc(inline)]
pub use self::duration::Duration;

/// Default commitment prefix of the host.
pub const DEFAULT_COMMITMENT_PREFIX: &str = "ibc";

/// Default upper bound on the time between two blocks of the host.
pub const DEFAULT_MAX_EXPECTED_TIME_PER_BLOCK: dur::Duration = {
    const DURATION_IN_SECS: u128 = 30;
    dur::Duration::from_secs(DURATION_IN_SECS)
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse host config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("commitment prefix must not be empty")]
    EmptyPrefix,
    #[error("at least one connection version must be supported")]
    NoSupportedVersions,
    #[error("max expected time per block must be positive")]
    ZeroBlockTime,
}

/// Parameters of the IBC host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Prefix under which this chain's commitments are proven.
    pub commitment_prefix: String,
    /// Connection versions offered during handshakes, in order of preference.
    pub supported_versions: Vec<Version>,
    /// Used to convert connection delay periods into a number of blocks.
    ///
    /// Formatted as regular time strings (e.g. `"30s"`),
    /// or nanoseconds (e.g. `30000000000`).
    pub max_expected_time_per_block: Duration,
    /// Account allowed to register client types and bind ports. Anyone
    /// may do so if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<Address>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            commitment_prefix: DEFAULT_COMMITMENT_PREFIX.to_owned(),
            supported_versions: vec![Version::default()],
            max_expected_time_per_block: Duration(DEFAULT_MAX_EXPECTED_TIME_PER_BLOCK),
            admin: None,
        }
    }
}

impl HostConfig {
    /// Parse and validate a JSON encoded config. Missing fields take
    /// their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.commitment_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.supported_versions.is_empty() {
            return Err(ConfigError::NoSupportedVersions);
        }
        if self.max_expected_time_per_block.as_nanos() == 0 {
            return Err(ConfigError::ZeroBlockTime);
        }
        Ok(())
    }

    pub fn merkle_prefix(&self) -> MerklePrefix {
        MerklePrefix::new(self.commitment_prefix.as_bytes())
    }

    /// Number of blocks a delay of `delay_time_period` nanoseconds spans,
    /// rounded up.
    pub fn delay_block_period(&self, delay_time_period: u64) -> u64 {
        let block_time = self.max_expected_time_per_block.as_nanos();
        if block_time == 0 {
            return 0;
        }
        let blocks = u128::from(delay_time_period).div_ceil(block_time);
        u64::try_from(blocks).unwrap_or(u64::MAX)
    }

    /// Whether `caller` may perform admin-gated operations.
    pub fn is_admin(&self, caller: &Address) -> bool {
        self.admin.is_none() || self.admin.as_ref() == Some(caller)
    }
}

fn deserialize_from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let s = String::deserialize(deserializer)?;
    T::from_str(&s).map_err(serde::de::Error::custom)
}

fn serialize_to_str<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: fmt::Display,
{
    serializer.serialize_str(&value.to_string())
}

mod duration {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct HumanDuration(#[serde(deserialize_with = "deserialize_from_str")] dur::Duration);

    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    enum AnyDuration {
        Human(HumanDuration),
        Nanos(u64),
    }

    impl From<AnyDuration> for Duration {
        fn from(dur: AnyDuration) -> Self {
            match dur {
                AnyDuration::Human(HumanDuration(dur)) => Self(dur),
                AnyDuration::Nanos(nanos) => Self(dur::Duration::from_nanos(u128::from(nanos))),
            }
        }
    }

    /// Duration accepting both human readable strings and nanosecond counts.
    #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
    #[serde(from = "AnyDuration")]
    #[repr(transparent)]
    pub struct Duration(#[serde(serialize_with = "serialize_to_str")] pub dur::Duration);

    impl Duration {
        pub fn as_nanos(&self) -> u128 {
            self.0.as_nanos()
        }
    }
}
