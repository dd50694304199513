use std::cmp::Ordering;

use clap::ValueEnum;
use regex::Regex;
use serde::Serialize;

use crate::domain::{Asset, Holder, ReleaseDate, edition_key, release_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GemOrder {
    HighestFirst,
    HighestLast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DateOrder {
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    pub gem_order: GemOrder,
    pub date_order: DateOrder,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            gem_order: GemOrder::HighestFirst,
            date_order: DateOrder::NewestFirst,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TierGroup {
    pub tier: String,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditionGroup {
    pub edition: String,
    pub assets: Vec<Asset>,
}

/// Numeric tier out of a bucket key like "Tier 3". Missing or non-numeric
/// keys (including "Unknown") count as 0.
fn tier_number(tier: &str) -> u32 {
    Regex::new(r"\d+")
        .unwrap()
        .find(tier)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Numeric gem weight for edition-internal ordering. Exact-match "Gem"
/// trait, unlike the substring match used for the derived display value.
fn gem_weight(asset: &Asset) -> i64 {
    asset
        .traits()
        .iter()
        .find(|t| t.display_name == "Gem")
        .and_then(|t| t.display_value.parse().ok())
        .unwrap_or(0)
}

fn release_key(asset: &Asset) -> ReleaseDate {
    release_date(&asset.name).unwrap_or(ReleaseDate::EPOCH)
}

/// Partition by derived tier string. Every asset lands in a bucket (the
/// "Unknown" tier included); malformed names stay in their bucket and sort
/// as oldest. All sorts are stable: equal keys keep upstream order.
pub fn group_by_tier(assets: &[Asset], config: &SortConfig) -> Vec<TierGroup> {
    let mut groups: Vec<TierGroup> = Vec::new();
    for asset in assets {
        match groups.iter_mut().find(|g| g.tier == asset.tier) {
            Some(group) => group.assets.push(asset.clone()),
            None => groups.push(TierGroup {
                tier: asset.tier.clone(),
                assets: vec![asset.clone()],
            }),
        }
    }

    for group in &mut groups {
        group.assets.sort_by(|a, b| {
            let (ka, kb) = (release_key(a), release_key(b));
            match config.date_order {
                DateOrder::NewestFirst => kb.cmp(&ka),
                DateOrder::OldestFirst => ka.cmp(&kb),
            }
        });
    }

    // Tier 1 is the highest tier, so "highest first" is ascending numbers.
    groups.sort_by(|a, b| {
        let (na, nb) = (tier_number(&a.tier), tier_number(&b.tier));
        match config.gem_order {
            GemOrder::HighestFirst => na.cmp(&nb),
            GemOrder::HighestLast => nb.cmp(&na),
        }
    });
    groups
}

/// Partition by the `"<month> <year>"` edition key. Assets whose name does
/// not parse into the 3-segment convention are silently dropped from this
/// view (but still appear in tier grouping).
pub fn group_by_edition(assets: &[Asset], config: &SortConfig) -> Vec<EditionGroup> {
    let mut groups: Vec<(ReleaseDate, EditionGroup)> = Vec::new();
    for asset in assets {
        let Some(key) = edition_key(&asset.name) else {
            continue;
        };
        match groups.iter_mut().find(|(_, g)| g.edition == key) {
            Some((_, group)) => group.assets.push(asset.clone()),
            None => groups.push((
                release_key(asset),
                EditionGroup {
                    edition: key,
                    assets: vec![asset.clone()],
                },
            )),
        }
    }

    for (_, group) in &mut groups {
        group.assets.sort_by(|a, b| {
            let (ga, gb) = (gem_weight(a), gem_weight(b));
            match config.gem_order {
                GemOrder::HighestFirst => gb.cmp(&ga),
                GemOrder::HighestLast => ga.cmp(&gb),
            }
        });
    }

    groups.sort_by(|(da, _), (db, _)| match config.date_order {
        DateOrder::NewestFirst => db.cmp(da),
        DateOrder::OldestFirst => da.cmp(db),
    });
    groups.into_iter().map(|(_, group)| group).collect()
}

/// Deterministic holder order for display: resolved names first
/// (alphabetical by name), then the rest alphabetical by address.
pub fn sort_holders(holders: &mut [Holder]) {
    holders.sort_by(|a, b| match (&a.nfd, &b.nfd) {
        (Some(na), Some(nb)) => na.cmp(nb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.address.cmp(&b.address),
    });
}
