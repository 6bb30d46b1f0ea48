//! Session manager options and wallet SDK configuration types.
//!
//! This module provides the chain identifiers known to the front-end, the payload handed to
//! the wallet SDK on initialization, and the options of the [`SessionManager`](crate::SessionManager).

use crate::callback::{OnConnect, OnError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeMap, fmt, time::Duration};
use thiserror::Error;
use url::Url;

/// The chain a disconnected session reports.
pub const DEFAULT_CHAIN_ID: u64 = ChainId::Mainnet.id();

/// How often the auto-connect watcher checks the SDK for a provider.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

const STAGING_WHITELIST: [(&str, &str); 4] = [
    (
        "https://sdk-staging.biconomy.io",
        "MEQCIBgO86Ds-nQ6JLHWmo5umziadaY-VDCQxLmwy-DX6nCxAiBJPnc0SOZmFTkphRfS7yd81DsC--Uj6Vb-WqvfSXngnQ",
    ),
    (
        "http://sdk-staging.biconomy.io",
        "MEUCIQDW2lTR5y_sTv3UTJEhfnC3_cLDb_aBrWtev8Ih4kXG4QIgIMjQhpQs9g14c3t64bEt3mQMMPuWHrbLBfo7hRAGEZc",
    ),
    (
        "https://sdk-dev.biconomy.io",
        "MEQCID90gUAazem-Ia_YIfVqLZr0lxo0Oawnx9ZoIcCiTtCNAiB6fZOA3AV22CDKtQ0QKYUSucPymeJoP3wmMsHZjNj-wQ",
    ),
    (
        "http://sdk-dev.biconomy.io",
        "MEUCIQCt5ga5aLrrAjtojAZmfTFwcv9bgmTbR_VKjDTtbRf0pAIgESLgcY-tBQe1pzsawiPdEY0vQwe8ux0XDTAtBh--MRM",
    ),
];

/// Networks the front-end knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainId {
    /// Ethereum mainnet.
    Mainnet,
    /// Goerli test network.
    Goerli,
    /// Polygon Mumbai test network.
    PolygonMumbai,
    /// Polygon PoS mainnet.
    PolygonMainnet,
}

impl ChainId {
    /// Returns the numeric chain id.
    pub const fn id(self) -> u64 {
        match self {
            ChainId::Mainnet => 1,
            ChainId::Goerli => 5,
            ChainId::PolygonMumbai => 80001,
            ChainId::PolygonMainnet => 137,
        }
    }

    /// Looks up a known network by its numeric id.
    pub fn from_id(id: u64) -> Option<Self> {
        [
            ChainId::Mainnet,
            ChainId::Goerli,
            ChainId::PolygonMumbai,
            ChainId::PolygonMainnet,
        ]
        .into_iter()
        .find(|chain| chain.id() == id)
    }
}

impl From<ChainId> for u64 {
    fn from(chain: ChainId) -> Self {
        chain.id()
    }
}

/// The network tier label passed to the wallet SDK.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkTier {
    #[default]
    Testnet,
    Mainnet,
}

impl fmt::Display for NetworkTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkTier::Testnet => f.write_str("testnet"),
            NetworkTier::Mainnet => f.write_str("mainnet"),
        }
    }
}

/// Errors raised while validating or loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A whitelist key could not be parsed as a URL.
    #[error("Invalid whitelist origin {origin:?}: {source}")]
    InvalidOrigin {
        origin: String,
        #[source]
        source: url::ParseError,
    },
    /// A whitelist key is a URL, but not an http(s) origin.
    #[error("Whitelist origin {0:?} must use http or https")]
    UnsupportedScheme(String),
    /// The chain id is neither a `0x`-prefixed hex string nor an integer.
    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),
    /// The SDK is initialized on a different chain than the session reports while disconnected.
    #[error("SDK chain id {sdk} does not match the default chain id {default}")]
    ChainMismatch { default: u64, sdk: u64 },
    /// The configuration document is not valid JSON for [`SdkInitConfig`].
    #[error("JSON error: {0}")]
    Json(String),
}

/// The configuration handed to the wallet SDK's `init` call.
///
/// It serializes to the shape the SDK expects:
/// `{"chainId": "0x1", "network": "testnet", "whitelistUrls": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
pub struct SdkInitConfig {
    /// The chain the embedded wallet targets. Serialized as a hex string.
    #[serde(serialize_with = "serialize_hex", deserialize_with = "deserialize_hex")]
    #[builder(default = DEFAULT_CHAIN_ID, into)]
    pub chain_id: u64,

    /// The network tier label.
    #[serde(default)]
    #[builder(default)]
    pub network: NetworkTier,

    /// Allowed embedding origins mapped to their signed allow-list tokens.
    #[serde(default)]
    #[builder(default)]
    pub whitelist_urls: BTreeMap<String, String>,
}

impl SdkInitConfig {
    /// The configuration shipped with the front-end: mainnet chain id, testnet tier and the
    /// staging/dev allow-list.
    pub fn staging() -> Self {
        Self::staging_on(DEFAULT_CHAIN_ID)
    }

    /// The staging configuration targeting `chain_id`.
    pub fn staging_on(chain_id: impl Into<u64>) -> Self {
        Self::builder()
            .chain_id(chain_id)
            .whitelist_urls(
                STAGING_WHITELIST
                    .iter()
                    .map(|(origin, token)| (origin.to_string(), token.to_string()))
                    .collect(),
            )
            .build()
    }

    /// Parses a configuration document, e.g. one embedded at build time.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the chain id in the hex form the SDK expects.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// Checks that every whitelist key is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for origin in self.whitelist_urls.keys() {
            let url = Url::parse(origin).map_err(|source| ConfigError::InvalidOrigin {
                origin: origin.clone(),
                source,
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::UnsupportedScheme(origin.clone()));
            }
        }
        Ok(())
    }
}

impl Default for SdkInitConfig {
    fn default() -> Self {
        Self::staging()
    }
}

fn serialize_hex<S: Serializer>(chain_id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:#x}", chain_id))
}

fn deserialize_hex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawChainId {
        Number(u64),
        Text(String),
    }

    match RawChainId::deserialize(deserializer)? {
        RawChainId::Number(id) => Ok(id),
        RawChainId::Text(text) => parse_chain_id(&text).map_err(serde::de::Error::custom),
    }
}

/// Parses `"0x89"` or `"137"` into a chain id.
pub fn parse_chain_id(text: &str) -> Result<u64, ConfigError> {
    let parsed = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    };
    parsed.map_err(|_| ConfigError::InvalidChainId(text.to_string()))
}

/// Options for the [`SessionManager`](crate::SessionManager).
#[derive(Clone, bon::Builder)]
pub struct SessionManagerOptions {
    /// The chain id reported while no wallet is connected.
    #[builder(default = DEFAULT_CHAIN_ID, into)]
    pub default_chain_id: u64,

    /// The configuration passed to every SDK handle the manager initializes. If not provided,
    /// the staging configuration on `default_chain_id` will be used.
    #[builder(default = SdkInitConfig::staging_on(default_chain_id))]
    pub sdk_config: SdkInitConfig,

    /// Interval of the auto-connect watcher. If not provided, 1 second will be used.
    #[builder(default = DEFAULT_POLL_INTERVAL)]
    pub poll_interval: Duration,

    /// If set to `false`, the manager never connects on its own; only explicit
    /// [`connect`](crate::SessionManager::connect) calls establish a session.
    #[builder(default = true)]
    pub auto_connect: bool,

    /// Callback once a session has been established.
    #[builder(into)]
    pub on_connect: Option<OnConnect>,

    /// Callback in case a connection attempt nobody awaits fails.
    #[builder(into)]
    pub on_error: Option<OnError>,
}

impl SessionManagerOptions {
    /// Checks the SDK configuration and that it targets `default_chain_id`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sdk_config.validate()?;
        if self.sdk_config.chain_id != self.default_chain_id {
            return Err(ConfigError::ChainMismatch {
                default: self.default_chain_id,
                sdk: self.sdk_config.chain_id,
            });
        }
        Ok(())
    }
}

impl Default for SessionManagerOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for SessionManagerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManagerOptions")
            .field("default_chain_id", &self.default_chain_id)
            .field("sdk_config", &self.sdk_config)
            .field("poll_interval", &self.poll_interval)
            .field("auto_connect", &self.auto_connect)
            .field("on_connect", &self.on_connect.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
