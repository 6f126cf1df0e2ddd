use serde::{Deserialize, Serialize};

use crate::models::FilterModel;

/// New filters after the caller's best known block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersResponse {
    pub best_height: u64,
    pub filters: Vec<FilterModel>,
}

/// Fee rate estimates in satoshi per virtual byte for one confirmation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimationPair {
    pub economical: u64,
    pub conservative: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub ticker: String,
    pub rate: f64,
}

/// Raw payload of the software versions endpoint.
///
/// Older backends spell the second key `backenMajordVersion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionsResponse {
    pub client_version: String,
    #[serde(alias = "backenMajordVersion")]
    pub backend_major_version: String,
}
