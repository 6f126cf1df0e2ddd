use std::fmt::Display;
use std::str::FromStr;

use bitcoin::BlockHash;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FilterParseError {
    #[error("Filter line has {0} parts, expected 3 to 5")]
    WrongPartCount(usize),
    #[error("Invalid block height: {0}")]
    InvalidHeight(String),
    #[error("Invalid block hash: {0}")]
    InvalidBlockHash(String),
    #[error("Invalid filter hex: {0}")]
    InvalidFilter(String),
    #[error("Invalid block time: {0}")]
    InvalidBlockTime(String),
}

/// A compact block filter as served by the backend.
///
/// On the wire each filter is a single colon separated line:
/// `height:blockHash:filterHex[:prevBlockHash[:blockTime]]`. The filter part
/// may be empty for blocks without any matchable scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FilterModel {
    pub block_height: u64,
    pub block_hash: BlockHash,
    pub filter: Vec<u8>,
    pub prev_block_hash: Option<BlockHash>,
    pub block_time: Option<u64>,
}

impl FilterModel {
    pub fn is_empty(&self) -> bool {
        self.filter.is_empty()
    }
}

impl FromStr for FilterModel {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if !(3..=5).contains(&parts.len()) {
            return Err(FilterParseError::WrongPartCount(parts.len()));
        }

        let block_height = parts[0]
            .parse()
            .map_err(|_| FilterParseError::InvalidHeight(parts[0].to_string()))?;
        let block_hash =
            BlockHash::from_str(parts[1]).map_err(|_| FilterParseError::InvalidBlockHash(parts[1].to_string()))?;
        let filter = hex::decode(parts[2]).map_err(|_| FilterParseError::InvalidFilter(parts[2].to_string()))?;

        let prev_block_hash = match parts.get(3) {
            Some(p) => Some(BlockHash::from_str(p).map_err(|_| FilterParseError::InvalidBlockHash(p.to_string()))?),
            None => None,
        };
        let block_time = match parts.get(4) {
            Some(p) => Some(
                p.parse()
                    .map_err(|_| FilterParseError::InvalidBlockTime(p.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            block_height,
            block_hash,
            filter,
            prev_block_hash,
            block_time,
        })
    }
}

impl Display for FilterModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.block_height, self.block_hash, hex::encode(&self.filter))?;
        if let Some(prev) = &self.prev_block_hash {
            write!(f, ":{}", prev)?;
            if let Some(time) = self.block_time {
                write!(f, ":{}", time)?;
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for FilterModel {
    type Error = FilterParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FilterModel> for String {
    fn from(value: FilterModel) -> Self {
        value.to_string()
    }
}
