use assert_matches::assert_matches;

use hodl_gallery::domain::{
    Asset, AssetId, Collectible, MediaRef, ReleaseDate, Trait, UNKNOWN, derive_gem, derive_month,
    derive_tier, edition_key, optimized_image_url, release_date,
};
use hodl_gallery::error::GalleryError;

fn traits(entries: &[(&str, &str)]) -> Vec<Trait> {
    entries
        .iter()
        .map(|(name, value)| Trait {
            display_name: name.to_string(),
            display_value: value.to_string(),
        })
        .collect()
}

#[test]
fn parse_asset_id() {
    let id: AssetId = "987654321".parse().unwrap();
    assert_eq!(id.value(), 987654321);

    assert_matches!(
        "not-a-number".parse::<AssetId>(),
        Err(GalleryError::InvalidAssetId(_))
    );
    assert_matches!("".parse::<AssetId>(), Err(GalleryError::InvalidAssetId(_)));
    assert_matches!(
        "-5".parse::<AssetId>(),
        Err(GalleryError::InvalidAssetId(_))
    );
}

#[test]
fn derivation_is_deterministic() {
    let list = traits(&[("Tier", "2"), ("Gem", "5"), ("Month", "March")]);
    assert_eq!(derive_tier(&list), "Tier 2");
    assert_eq!(derive_tier(&list), "Tier 2");
    assert_eq!(derive_gem(&list), "5");
    assert_eq!(derive_month(&list), "March");
}

#[test]
fn derivation_defaults_to_unknown() {
    let list = traits(&[("Background", "Blue")]);
    assert_eq!(derive_tier(&list), UNKNOWN);
    assert_eq!(derive_gem(&list), UNKNOWN);
    assert_eq!(derive_month(&list), UNKNOWN);

    assert_eq!(derive_tier(&[]), UNKNOWN);
}

#[test]
fn derivation_matches_case_insensitive_substring() {
    // "Subtier" contains "tier", so it matches.
    let list = traits(&[("Subtier", "9")]);
    assert_eq!(derive_tier(&list), "Tier 9");

    let list = traits(&[("GEM COUNT", "3"), ("Release MONTH", "July")]);
    assert_eq!(derive_gem(&list), "3");
    assert_eq!(derive_month(&list), "July");
}

#[test]
fn derivation_takes_first_match() {
    let list = traits(&[("Tier", "1"), ("Subtier", "4")]);
    assert_eq!(derive_tier(&list), "Tier 1");
}

#[test]
fn release_date_from_well_formed_name() {
    assert_eq!(
        release_date("Hero-March-2024"),
        Some(ReleaseDate {
            year: 2024,
            month: 3
        })
    );
    assert_eq!(
        release_date("Hero- december -2023"),
        Some(ReleaseDate {
            year: 2023,
            month: 12
        })
    );
}

#[test]
fn release_date_malformed_names() {
    assert_eq!(release_date("Hero"), None);
    assert_eq!(release_date("Hero-March"), None);
    // 3 segments but an unparseable month falls back to the epoch.
    assert_eq!(release_date("Hero-Brumaire-2024"), Some(ReleaseDate::EPOCH));
    assert_eq!(release_date("Hero-Mar-2024"), Some(ReleaseDate::EPOCH));
    assert_eq!(release_date("Hero-March-twenty"), Some(ReleaseDate::EPOCH));
}

#[test]
fn release_date_ordering_is_chronological() {
    let early = release_date("Hero-February-2023").unwrap();
    let late = release_date("Hero-January-2024").unwrap();
    assert!(early < late);
    assert!(ReleaseDate::EPOCH < early);
}

#[test]
fn edition_keys() {
    assert_eq!(
        edition_key("Hero-March-2024").as_deref(),
        Some("March 2024")
    );
    assert_eq!(edition_key("Hero"), None);
    assert_eq!(edition_key("Hero-March"), None);
    // Extra segments keep the month/year positions.
    assert_eq!(
        edition_key("Hero-April-2024-Special").as_deref(),
        Some("April 2024")
    );
}

fn asset_with_collectible(collectible: Option<Collectible>) -> Asset {
    Asset {
        asset_id: 1,
        name: "Hero-March-2024".to_string(),
        unit_name: Some("HERO".to_string()),
        creator_address: None,
        total_supply: Some(100),
        description: None,
        collectible,
        tier: "Tier 1".to_string(),
        gem_value: "1".to_string(),
        month: "March".to_string(),
        image_url: None,
        raw_json: serde_json::json!({}),
    }
}

const GATEWAY: &str = "https://ipfs.algonode.dev/ipfs/";

#[test]
fn image_url_prefers_gateway_media() {
    let asset = asset_with_collectible(Some(Collectible {
        description: None,
        traits: Vec::new(),
        metadata_image: Some("ipfs://QmMeta".to_string()),
        media: vec![
            MediaRef { url: None },
            MediaRef {
                url: Some("https://example.com/other.png".to_string()),
            },
            MediaRef {
                url: Some("https://ipfs.algonode.dev/ipfs/QmMedia".to_string()),
            },
        ],
    }));

    let url = optimized_image_url(&asset, GATEWAY, false).unwrap();
    assert_eq!(
        url,
        "https://ipfs.algonode.dev/ipfs/QmMedia?optimizer=image&width=300&quality=70"
    );
}

#[test]
fn image_url_rewrites_ipfs_scheme() {
    let asset = asset_with_collectible(Some(Collectible {
        metadata_image: Some("ipfs://QmMeta".to_string()),
        ..Collectible::default()
    }));

    let url = optimized_image_url(&asset, GATEWAY, true).unwrap();
    assert_eq!(
        url,
        "https://ipfs.algonode.dev/ipfs/QmMeta?optimizer=image&width=1200&quality=100"
    );
}

#[test]
fn image_url_absent_without_usable_media() {
    assert_eq!(optimized_image_url(&asset_with_collectible(None), GATEWAY, false), None);

    let asset = asset_with_collectible(Some(Collectible {
        metadata_image: Some("https://example.com/hosted-elsewhere.png".to_string()),
        ..Collectible::default()
    }));
    assert_eq!(optimized_image_url(&asset, GATEWAY, false), None);
}
