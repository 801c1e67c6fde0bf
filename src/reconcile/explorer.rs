use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// How to build a transaction link for one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerTemplate {
    pub base_url: String,
    /// Appended after the hash, e.g. `?cluster=devnet`
    pub suffix: Option<String>,
}

impl ExplorerTemplate {
    pub fn new(base_url: &str, suffix: Option<&str>) -> Self {
        Self {
            base_url: base_url.to_string(),
            suffix: suffix.map(str::to_string),
        }
    }

    pub fn link(&self, tx_hash: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url,
            tx_hash,
            self.suffix.as_deref().unwrap_or("")
        )
    }
}

/// Transaction explorer per network name
pub struct ExplorerRegistry {
    templates: HashMap<String, ExplorerTemplate>,
}

impl ExplorerRegistry {
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    pub fn register(&mut self, network: &str, template: ExplorerTemplate) {
        self.templates.insert(network.to_string(), template);
    }

    pub fn with(mut self, network: &str, template: ExplorerTemplate) -> Self {
        self.register(network, template);
        self
    }

    /// Link for `tx_hash` on `network`, `None` for networks we know nothing about
    pub fn explorer_link(&self, network: &str, tx_hash: &str) -> Option<String> {
        self.templates.get(network).map(|t| t.link(tx_hash))
    }

    /// Add or replace templates from `NETWORK|base_url|suffix` items
    /// separated by `;`. The suffix part is optional. Returns how many were
    /// registered.
    pub fn extend_from(&mut self, overrides: &str) -> usize {
        let mut added = 0;
        for item in overrides.split(';').map(str::trim).filter(|i| !i.is_empty()) {
            let mut parts = item.split('|').map(str::trim);
            match (parts.next(), parts.next()) {
                (Some(network), Some(base_url)) if !network.is_empty() && !base_url.is_empty() => {
                    let suffix = parts.next().filter(|s| !s.is_empty());
                    self.register(network, ExplorerTemplate::new(base_url, suffix));
                    added += 1;
                }
                _ => warn!("Ignoring malformed explorer template: {}", item),
            }
        }
        added
    }

    pub fn networks(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ExplorerRegistry {
    fn default() -> Self {
        Self::empty()
            .with("APTOS", ExplorerTemplate::new("https://explorer.aptoslabs.com/txn/", Some("?network=mainnet")))
            .with("APTOS_TESTNET", ExplorerTemplate::new("https://explorer.aptoslabs.com/tx/", None))
            .with("POLYGON", ExplorerTemplate::new("https://polygonscan.com/tx/", None))
            .with(
                "POLYGON_TESTNET_AMOY",
                ExplorerTemplate::new("https://amoy.polygonscan.com/tx/", Some("?network=testnet")),
            )
            .with("BASE", ExplorerTemplate::new("https://basescan.org/tx/", None))
            .with("OSMOSIS", ExplorerTemplate::new("https://www.mintscan.io/osmosis/tx/", None))
            .with("SOLANA", ExplorerTemplate::new("https://explorer.solana.com/block/", Some("?cluster=mainnet")))
            .with(
                "SOLANA_DEVNET",
                ExplorerTemplate::new("https://explorer.solana.com/block/", Some("?cluster=devnet")),
            )
    }
}
