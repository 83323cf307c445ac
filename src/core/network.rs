//! Network selection and per-network Esplora backend candidates.

/// Sentinel backend used when configuration yields no candidate for a network.
pub const SENTINEL_URL: &str = "http://127.0.0.1:3002";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NetworkSelection { Bitcoin, #[default] Testnet, Signet, Regtest }

impl NetworkSelection {
    pub const ALL: [NetworkSelection; 4] = [Self::Bitcoin, Self::Testnet, Self::Signet, Self::Regtest];

    pub fn as_str(&self) -> &'static str {
        match self { Self::Bitcoin => "bitcoin", Self::Testnet => "testnet", Self::Signet => "signet", Self::Regtest => "regtest" }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bitcoin" | "mainnet" => Some(Self::Bitcoin),
            "testnet" => Some(Self::Testnet),
            "signet" => Some(Self::Signet),
            "regtest" => Some(Self::Regtest),
            _ => None,
        }
    }

    #[cfg(feature = "bdk")]
    pub fn to_bdk(&self) -> bdk_wallet::bitcoin::Network {
        use bdk_wallet::bitcoin::Network;
        match self { Self::Bitcoin => Network::Bitcoin, Self::Testnet => Network::Testnet, Self::Signet => Network::Signet, Self::Regtest => Network::Regtest }
    }
}

impl std::fmt::Display for NetworkSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Ordered candidate backend URLs per network. The first entry is the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCatalog {
    pub bitcoin: Vec<String>,
    pub testnet: Vec<String>,
    pub signet: Vec<String>,
    pub regtest: Vec<String>,
}

impl Default for BackendCatalog {
    fn default() -> Self {
        Self {
            bitcoin: vec!["https://blockstream.info/api".into(), "https://mempool.space/api".into()],
            testnet: vec!["https://blockstream.info/testnet/api".into(), "https://mempool.space/testnet/api".into()],
            signet: vec!["https://mempool.space/signet/api".into(), "https://mutinynet.com/api".into()],
            regtest: vec!["http://127.0.0.1:3002".into()],
        }
    }
}

impl BackendCatalog {
    pub fn empty() -> Self {
        Self { bitcoin: vec![], testnet: vec![], signet: vec![], regtest: vec![] }
    }

    pub fn with_urls(mut self, network: NetworkSelection, urls: Vec<String>) -> Self {
        *self.slot_mut(network) = urls;
        self
    }

    /// Never empty: blank entries are dropped and an empty list yields the sentinel.
    pub fn urls(&self, network: NetworkSelection) -> Vec<String> {
        let urls: Vec<String> = self.slot(network).iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if urls.is_empty() { vec![SENTINEL_URL.to_string()] } else { urls }
    }

    pub fn default_url(&self, network: NetworkSelection) -> String {
        self.urls(network).swap_remove(0)
    }

    pub fn contains(&self, network: NetworkSelection, url: &str) -> bool {
        self.urls(network).iter().any(|u| u == url)
    }

    fn slot(&self, network: NetworkSelection) -> &Vec<String> {
        match network {
            NetworkSelection::Bitcoin => &self.bitcoin,
            NetworkSelection::Testnet => &self.testnet,
            NetworkSelection::Signet => &self.signet,
            NetworkSelection::Regtest => &self.regtest,
        }
    }

    fn slot_mut(&mut self, network: NetworkSelection) -> &mut Vec<String> {
        match network {
            NetworkSelection::Bitcoin => &mut self.bitcoin,
            NetworkSelection::Testnet => &mut self.testnet,
            NetworkSelection::Signet => &mut self.signet,
            NetworkSelection::Regtest => &mut self.regtest,
        }
    }
}
