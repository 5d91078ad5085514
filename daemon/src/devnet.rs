//! Devnet configuration: the parties one daemon hosts and the settings
//! their nodes share.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context};
use ehr_node::NodeConfig;
use ehr_types::PartyName;
use serde::{Deserialize, Serialize};

/// One hosted party.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySpec {
    pub name: String,
    pub rpc_port: u16,
}

/// A local network of parties sharing one notary and one attachment store.
///
/// ```toml
/// secret = "devnet"
///
/// [node]
/// session_timeout_ms = 10000
/// enable_metrics = true
///
/// [[party]]
/// name = "Doctor D1"
/// rpc_port = 10050
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DevnetConfig {
    /// Seeds every party's key. Anyone holding it can act as any party.
    #[serde(default = "default_secret")]
    pub secret: String,

    #[serde(default = "default_attachment_limit")]
    pub attachment_limit: usize,

    /// Settings shared by every node. `party_name` and `rpc_port` are taken
    /// from each party instead.
    #[serde(default)]
    pub node: NodeConfig,

    #[serde(default = "default_parties", rename = "party")]
    pub parties: Vec<PartySpec>,
}

fn default_secret() -> String {
    "devnet".to_string()
}

fn default_attachment_limit() -> usize {
    16 * 1024 * 1024
}

fn default_parties() -> Vec<PartySpec> {
    [("Doctor D1", 10050), ("Doctor D2", 10051), ("Patient P", 10052)]
        .into_iter()
        .map(|(name, rpc_port)| PartySpec {
            name: name.to_string(),
            rpc_port,
        })
        .collect()
}

impl Default for DevnetConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            attachment_limit: default_attachment_limit(),
            node: NodeConfig::default(),
            parties: default_parties(),
        }
    }
}

impl DevnetConfig {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("parsing devnet config")?;
        config.validate()?;
        Ok(config)
    }

    /// Party names must be valid and unique, ports unique.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.parties.is_empty() {
            bail!("a devnet needs at least one party");
        }
        let mut names = HashSet::new();
        let mut ports = HashSet::new();
        for party in &self.parties {
            PartyName::parse(&party.name)
                .with_context(|| format!("party name {:?}", party.name))?;
            if !names.insert(party.name.as_str()) {
                bail!("party {} is listed twice", party.name);
            }
            if self.node.enable_rpc && !ports.insert(party.rpc_port) {
                bail!("rpc port {} is used by more than one party", party.rpc_port);
            }
        }
        for party in &self.parties {
            self.node_config(party).validate()?;
        }
        Ok(())
    }

    /// The full node configuration for one hosted party.
    pub fn node_config(&self, party: &PartySpec) -> NodeConfig {
        NodeConfig {
            party_name: party.name.clone(),
            rpc_port: party.rpc_port,
            ..self.node.clone()
        }
    }
}
