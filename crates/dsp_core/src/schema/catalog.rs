//! Record layouts for Dyson Sphere Program saves.

use std::sync::OnceLock;

use super::version::{DRONE_UPGRADE, EARLIEST_SUPPORTED, VEIN_RELOCATION, VersionSelector};
use super::{Gate, Layout, RecordType, SchemaNode};
use crate::primitive::{ScalarKind, StrPrefix};

const I16: ScalarKind = ScalarKind::I16;
const I32: ScalarKind = ScalarKind::I32;
const I64: ScalarKind = ScalarKind::I64;
const F32: ScalarKind = ScalarKind::F32;
const F64: ScalarKind = ScalarKind::F64;

fn counted_records(kind: RecordType, count_field: &'static str) -> SchemaNode {
    SchemaNode::counted(SchemaNode::Record(kind), count_field)
}

fn vec3() -> SchemaNode {
    SchemaNode::fixed(SchemaNode::Scalar(F32), 3)
}

/// Every layout known to this crate, in no particular order.
pub fn layouts() -> Vec<Layout> {
    use RecordType::*;

    let factory_head = |since| {
        Layout::new(PlanetFactory, since)
            .scalar("planet_id", I32)
            .scalar("planet_theme", I32)
            .record("planet", PlanetData)
            .scalar("entity_cursor", I32)
            .scalar("entity_count", I32)
            .field("entities", counted_records(EntityData, "entity_count"))
    };
    let factory_tail = |layout: Layout| {
        layout
            .scalar("belt_count", I32)
            .field("belts", counted_records(Belt, "belt_count"))
            .scalar("has_digital_system", ScalarKind::U8)
            .field(
                "digital_system",
                SchemaNode::optional(
                    Gate::equals("has_digital_system", 1),
                    SchemaNode::Record(DigitalSystem),
                ),
            )
    };
    let mecha = |since| {
        Layout::new(Mecha, since)
            .scalar("core_energy", F64)
            .scalar("core_energy_cap", F64)
            .scalar("walk_speed", F32)
    };

    vec![
        Layout::new(Account, EARLIEST_SUPPORTED)
            .scalar("user_name", ScalarKind::Str(StrPrefix::I32))
            .scalar("user_id", I32),
        Layout::new(GameData, EARLIEST_SUPPORTED)
            .scalar("game_name", ScalarKind::Str(StrPrefix::VarInt))
            .record("game_desc", GameDesc)
            .scalar("game_tick", I64)
            .record("history", GameHistory)
            .record("player", Player)
            .scalar("factory_count", I32)
            .field("factories", counted_records(PlanetFactory, "factory_count")),
        Layout::new(GameDesc, EARLIEST_SUPPORTED)
            .scalar("galaxy_algo", I32)
            .scalar("galaxy_seed", I32)
            .scalar("star_count", I32)
            .scalar("player_proto", I32)
            .scalar("resource_multiplier", F32)
            .scalar("theme_count", I32)
            .field(
                "theme_ids",
                SchemaNode::counted(SchemaNode::Scalar(I32), "theme_count"),
            ),
        Layout::new(GameHistory, EARLIEST_SUPPORTED)
            .scalar("tech_count", I32)
            .field("techs", counted_records(TechState, "tech_count"))
            .scalar("auto_manage_lab", ScalarKind::Bool)
            .scalar("universe_observe_level", I32),
        Layout::new(TechState, EARLIEST_SUPPORTED)
            .scalar("id", I32)
            .scalar("unlocked", ScalarKind::Bool)
            .scalar("cur_level", I32)
            .scalar("max_level", I32)
            .scalar("hash_uploaded", I64)
            .scalar("hash_needed", I64),
        Layout::new(Player, EARLIEST_SUPPORTED)
            .scalar("planet_id", I32)
            .field("position", vec3())
            .scalar("sand_count", I64)
            .record("mecha", Mecha),
        mecha(EARLIEST_SUPPORTED),
        mecha(DRONE_UPGRADE)
            .scalar("reactor_power_gen", F64)
            .scalar("drone_count", I32),
        factory_tail(factory_head(EARLIEST_SUPPORTED)),
        factory_tail(
            factory_head(VEIN_RELOCATION)
                .scalar("vein_count", I32)
                .field("veins", counted_records(VeinData, "vein_count")),
        ),
        Layout::new(PlanetData, EARLIEST_SUPPORTED)
            .scalar("id", I32)
            .scalar("radius", F32)
            .scalar("vein_count", I32)
            .field("veins", counted_records(VeinData, "vein_count")),
        Layout::new(PlanetData, VEIN_RELOCATION)
            .scalar("id", I32)
            .scalar("radius", F32),
        Layout::new(VeinData, EARLIEST_SUPPORTED)
            .scalar("id", I32)
            .scalar("vein_type", I16)
            .scalar("group_index", I16)
            .scalar("amount", I32)
            .field("pos", vec3()),
        Layout::new(EntityData, EARLIEST_SUPPORTED)
            .scalar("id", I32)
            .scalar("proto_id", I16)
            .scalar("model_index", I16)
            .field("pos", vec3())
            .field("rot", SchemaNode::fixed(SchemaNode::Scalar(F32), 4)),
        Layout::new(Belt, EARLIEST_SUPPORTED)
            .scalar("id", I32)
            .scalar("entity_id", I32)
            .scalar("speed", I32)
            .scalar("output_id", I32),
        Layout::new(DigitalSystem, EARLIEST_SUPPORTED)
            .constant("version", I32, 0)
            .scalar("tick", I64),
    ]
}

/// The shared selector over [`layouts`], built on first use.
pub fn standard() -> &'static VersionSelector {
    static STANDARD: OnceLock<VersionSelector> = OnceLock::new();
    STANDARD.get_or_init(|| VersionSelector::new(layouts()))
}
