/* This file is part of dbft-core
 *
 * Copyright (C) 2024-2026 dbft-core Contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Node configuration, kept deliberately small (§1 "config file parsing"
//! is out of spec.md's scope; carried only as the minimal struct a daemon
//! needs to open its store and bind its ports).

use serde::Deserialize;

/// One delegate peer this node dials or accepts connections from.
#[derive(Clone, Debug, Deserialize)]
pub struct PeerConfig {
    pub delegate_id: u8,
    pub address: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Directory the sled database is opened from.
    pub data_dir: String,
    /// TCP port this node's consensus endpoint listens on.
    pub consensus_port: u16,
    /// TCP port the bootstrap puller listens on (§6, default 7000).
    pub bootstrap_port: u16,
    /// This node's own index in the 32-delegate committee, if it is one.
    pub delegate_id: Option<u8>,
    pub peers: Vec<PeerConfig>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            data_dir: "dbftd_db".to_string(),
            consensus_port: 8000,
            bootstrap_port: 7000,
            delegate_id: None,
            peers: Vec::new(),
        }
    }
}

impl NodeConfig {
    pub fn load(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable_standalone() {
        let config = NodeConfig::default();
        assert_eq!(config.bootstrap_port, 7000);
        assert!(config.peers.is_empty());
    }

    #[test]
    fn loads_peers_from_toml() {
        let toml = r#"
            data_dir = "/tmp/dbftd"
            consensus_port = 9001

            [[peers]]
            delegate_id = 3
            address = "127.0.0.1:9003"
        "#;
        let config = NodeConfig::load(toml).unwrap();
        assert_eq!(config.consensus_port, 9001);
        assert_eq!(config.peers.len(), 1);
        assert_eq!(config.peers[0].delegate_id, 3);
    }
}
