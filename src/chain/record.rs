use std::fmt::{Display, Formatter, Result};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One mined block, normalized to the fields the analysis needs.
///
/// Upstream blocks carry many more keys (transactions, fees, size, ...).
/// They are dropped at deserialization so that every record in the store
/// has the same shape regardless of which endpoint produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "block_index")]
    pub index: u64,
    pub hash: String,
    pub height: u64,
    #[serde(rename = "time")]
    pub timestamp: i64,
}

impl Record {
    pub fn new(index: u64, hash: &str, height: u64, timestamp: i64) -> Self {
        return Self {
            index,
            hash: hash.to_string(),
            height,
            timestamp,
        };
    }
}

impl Display for Record {
    /// Example output:
    /// "Block #170 (height 170) mined 2009-01-12 03:30:25 UTC, Hash 00000000d1145790a..."
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let mined: String = match DateTime::<Utc>::from_timestamp(self.timestamp, 0) {
            Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => format!("@{}", self.timestamp),
        };
        let short_hash: &str = self.hash.get(..17).unwrap_or(&self.hash);
        return write!(
            f,
            "Block #{} (height {}) mined {}, Hash {}...",
            self.index, self.height, mined, short_hash
        );
    }
}

/// Envelope returned by both upstream endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct BlocksPage {
    #[serde(default)]
    pub blocks: Vec<Record>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_block_is_projected_to_four_fields() -> () {
        let body: &str = r#"{
            "blocks": [{
                "hash": "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f",
                "height": 0,
                "time": 1231006505,
                "block_index": 0,
                "main_chain": true,
                "n_tx": 1,
                "fee": 0
            }]
        }"#;
        let page: BlocksPage = serde_json::from_str(body).unwrap();

        assert_eq!(page.blocks.len(), 1);
        assert_eq!(page.blocks[0].index, 0);
        assert_eq!(page.blocks[0].timestamp, 1_231_006_505);

        let stored: serde_json::Value = serde_json::to_value(&page.blocks[0]).unwrap();
        let keys: Vec<&String> = stored.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
        assert!(stored.get("block_index").is_some());
        assert!(stored.get("time").is_some());
        assert!(stored.get("main_chain").is_none());
    }

    #[test]
    fn missing_blocks_key_is_an_empty_page() -> () {
        let page: BlocksPage = serde_json::from_str("{}").unwrap();
        assert!(page.blocks.is_empty());
    }
}
