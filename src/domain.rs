use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GalleryError;

pub const UNKNOWN: &str = "Unknown";

/// Numeric asset identifier as assigned by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(u64);

impl AssetId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssetId {
    type Err = GalleryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(GalleryError::InvalidAssetId(value.to_string()));
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| GalleryError::InvalidAssetId(value.to_string()))
    }
}

/// One name/value descriptor attached to a collectible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    pub display_name: String,
    pub display_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Collectible {
    pub description: Option<String>,
    #[serde(default)]
    pub traits: Vec<Trait>,
    pub metadata_image: Option<String>,
    #[serde(default)]
    pub media: Vec<MediaRef>,
}

/// One NFT record as aggregated from the metadata service, including the
/// derived display attributes and the raw upstream payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: u64,
    pub name: String,
    pub unit_name: Option<String>,
    pub creator_address: Option<String>,
    pub total_supply: Option<u64>,
    pub description: Option<String>,
    pub collectible: Option<Collectible>,
    pub tier: String,
    pub gem_value: String,
    pub month: String,
    pub image_url: Option<String>,
    pub raw_json: serde_json::Value,
}

impl Asset {
    pub fn id(&self) -> AssetId {
        AssetId(self.asset_id)
    }

    pub fn traits(&self) -> &[Trait] {
        self.collectible
            .as_ref()
            .map(|c| c.traits.as_slice())
            .unwrap_or_default()
    }
}

/// An address currently holding a positive balance of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    pub address: String,
    pub amount: u64,
    pub nfd: Option<String>,
}

/// Trait lookups match category names case-insensitively by substring, so a
/// trait named "Subtier" also matches "tier". First match wins.
fn find_trait<'a>(traits: &'a [Trait], needle: &str) -> Option<&'a str> {
    traits
        .iter()
        .find(|t| t.display_name.to_lowercase().contains(needle))
        .map(|t| t.display_value.as_str())
}

pub fn derive_tier(traits: &[Trait]) -> String {
    match find_trait(traits, "tier") {
        Some(value) => format!("Tier {value}"),
        None => UNKNOWN.to_string(),
    }
}

pub fn derive_gem(traits: &[Trait]) -> String {
    find_trait(traits, "gem")
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn derive_month(traits: &[Trait]) -> String {
    find_trait(traits, "month")
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Release month/year parsed from the `"<series>-<month>-<year>"` naming
/// convention. Ordering is chronological (year, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReleaseDate {
    pub year: i32,
    pub month: u32,
}

impl ReleaseDate {
    /// Fallback for malformed or unparseable dates; sorts as oldest.
    pub const EPOCH: ReleaseDate = ReleaseDate { year: 1970, month: 1 };
}

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// 1-based month number for a full English month name, case-insensitive.
pub fn month_number(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|idx| idx as u32 + 1)
}

/// Parse the release date out of an asset name. Names with fewer than 3
/// dash-delimited segments carry no date at all; names with 3 segments but
/// an unrecognized month or year fall back to the epoch.
pub fn release_date(name: &str) -> Option<ReleaseDate> {
    let parts: Vec<&str> = name.split('-').collect();
    if parts.len() < 3 {
        return None;
    }
    let month = month_number(parts[1].trim());
    let year = parts[2].trim().parse::<i32>().ok();
    match (month, year) {
        (Some(month), Some(year)) => Some(ReleaseDate { year, month }),
        _ => Some(ReleaseDate::EPOCH),
    }
}

/// Edition bucket key (`"<month> <year>"`) for a well-formed asset name.
/// Malformed names have no edition and are excluded from that view.
pub fn edition_key(name: &str) -> Option<String> {
    let parts: Vec<&str> = name.split('-').collect();
    if parts.len() < 3 {
        return None;
    }
    Some(format!("{} {}", parts[1].trim(), parts[2].trim()))
}

/// Gateway-backed image URL with the optimizer query attached. Prefers a
/// media entry already on the gateway, then rewrites an `ipfs://` metadata
/// image. Assets without usable media have no image.
pub fn optimized_image_url(asset: &Asset, gateway: &str, large: bool) -> Option<String> {
    let collectible = asset.collectible.as_ref()?;

    let mut image_url = collectible
        .media
        .iter()
        .filter_map(|m| m.url.as_deref())
        .find(|url| url.starts_with(gateway))
        .map(str::to_string);

    if image_url.is_none() {
        if let Some(image) = collectible.metadata_image.as_deref() {
            if let Some(cid) = image.strip_prefix("ipfs://") {
                image_url = Some(format!("{gateway}{cid}"));
            } else if image.starts_with(gateway) {
                image_url = Some(image.to_string());
            }
        }
    }

    let url = image_url?;
    let (width, quality) = if large { (1200, 100) } else { (300, 70) };
    Some(format!("{url}?optimizer=image&width={width}&quality={quality}"))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_asset_id_valid() {
        let id: AssetId = " 123456 ".parse().unwrap();
        assert_eq!(id.value(), 123456);
    }

    #[test]
    fn parse_asset_id_invalid() {
        let err = "abc".parse::<AssetId>().unwrap_err();
        assert_matches!(err, GalleryError::InvalidAssetId(_));
        let err = "".parse::<AssetId>().unwrap_err();
        assert_matches!(err, GalleryError::InvalidAssetId(_));
    }

    #[test]
    fn month_number_case_insensitive() {
        assert_eq!(month_number("January"), Some(1));
        assert_eq!(month_number("december"), Some(12));
        assert_eq!(month_number("Frimaire"), None);
    }

    #[test]
    fn release_date_fallbacks() {
        assert_eq!(
            release_date("Hero-March-2024"),
            Some(ReleaseDate {
                year: 2024,
                month: 3
            })
        );
        assert_eq!(release_date("Hero"), None);
        assert_eq!(release_date("Hero-Smarch-2024"), Some(ReleaseDate::EPOCH));
        assert_eq!(release_date("Hero-March-20xx"), Some(ReleaseDate::EPOCH));
    }
}
