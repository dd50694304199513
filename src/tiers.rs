use serde::Serialize;

/// Static membership-tier descriptors served by `/api/tiers`.
#[derive(Debug, Clone, Serialize)]
pub struct TierDescriptor {
    pub name: &'static str,
    pub image: &'static str,
    pub requirement: &'static str,
    pub perk: &'static str,
}

pub static TIER_DESCRIPTORS: [TierDescriptor; 4] = [
    TierDescriptor {
        name: "Tier 4 - Emerald Hero",
        image: "/placeholder.svg?height=600&width=600",
        requirement: "Hold 1B $HODL for 30 days.",
        perk: "4 entries in the monthly raffle.",
    },
    TierDescriptor {
        name: "Tier 3 - Ruby Hero",
        image: "/placeholder.svg?height=600&width=600",
        requirement: "Hold 2.5B $HODL for 30 days.",
        perk: "2 entries in the monthly raffle.",
    },
    TierDescriptor {
        name: "Tier 2 - Sapphire Hero",
        image: "/placeholder.svg?height=600&width=600",
        requirement: "Hold 5B $HODL for 30 days.",
        perk: "1 entry in the monthly raffle.",
    },
    TierDescriptor {
        name: "Tier 1 - Diamond Hero",
        image: "/placeholder.svg?height=600&width=600",
        requirement: "Hold 10B $HODL for 30 days.",
        perk: "Membership in the exclusive Diamond Heroes Network.",
    },
];
