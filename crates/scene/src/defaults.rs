//! Built-in map used when neither the backend nor the local cache has data.

use crate::ids::{LocationId, UniverseId};
use crate::model::{GlobalConfig, Location, LocationKind, MapData, Universe};

pub use crate::model::DEFAULT_BACKGROUND_URL;

fn location(id: &str, name: &str, description: &str, cx: f64, cy: f64, kind: LocationKind) -> Location {
    Location {
        id: LocationId::new(id),
        name: name.to_string(),
        description: description.to_string(),
        cx,
        cy,
        kind,
        thumb_url: format!("/images/{id}-thumb.png"),
    }
}

#[allow(clippy::too_many_arguments)]
fn universe(
    id: &str,
    name: &str,
    description: &str,
    color: &str,
    cx: f64,
    cy: f64,
    sort_order: i32,
    locations: Vec<Location>,
) -> Universe {
    Universe {
        id: UniverseId::new(id),
        name: name.to_string(),
        description: description.to_string(),
        color: color.to_string(),
        cx,
        cy,
        thumb_url: format!("/images/{id}-thumb.png"),
        background_url: format!("/images/{id}.png"),
        image_url: format!("/images/{id}.png"),
        locations,
        sort_order,
    }
}

pub fn default_config() -> GlobalConfig {
    GlobalConfig::default()
}

pub fn default_map() -> MapData {
    use LocationKind::*;

    MapData::new(vec![
        universe(
            "nebula-prime",
            "ALPHA ONE",
            "The central hub of the multiverse, where trade routes converge.",
            "#4f46e5",
            500.0,
            300.0,
            0,
            vec![
                location("prime-core", "Prime Core", "The administrative heart of Alpha One.", 400.0, 350.0, Station),
                location("trading-outpost", "Trading Outpost", "A bustling market at the edge of the nebula.", 600.0, 250.0, Station),
                location("ancient-shard", "Ancient Shard", "A fragment of a collapsed reality.", 500.0, 500.0, Anomaly),
            ],
        ),
        universe(
            "cryo-wastes",
            "Cryo Wastes",
            "A frozen expanse where time itself seems to slow.",
            "#06b6d4",
            200.0,
            200.0,
            1,
            vec![
                location("ice-citadel", "Ice Citadel", "A fortress carved from eternal ice.", 150.0, 150.0, Planet),
                location("frozen-wreck", "Frozen Wreck", "The remains of a ship lost to the cold.", 250.0, 250.0, Anomaly),
            ],
        ),
        universe(
            "magma-forge",
            "Magma Forge",
            "Volcanic worlds fuelling the multiverse's industry.",
            "#ef4444",
            800.0,
            600.0,
            2,
            vec![
                location("smelter-complex", "Smelter Complex", "Refineries that never sleep.", 750.0, 550.0, Station),
                location("lava-extraction", "Lava Extraction", "Molten rivers tapped for energy.", 850.0, 650.0, Planet),
            ],
        ),
        universe(
            "void-expanse",
            "Void Expanse",
            "The dark edge of known space.",
            "#8b5cf6",
            850.0,
            150.0,
            3,
            vec![
                location("dark-anchor", "Dark Anchor", "A gravity well holding the void at bay.", 800.0, 100.0, Anomaly),
                location("void-eye", "Void Eye", "An observatory staring into nothing.", 900.0, 200.0, Station),
            ],
        ),
    ])
}
