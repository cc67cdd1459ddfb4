use strata17_types::{Dimension, Difficulty, EntityKind, GameMode, ItemStack};

/// Version-independent internal packet representation. The v17 adapter converts
/// between wire format and these; the session driver only ever sees this enum.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    // === Shared (0x00-0x03) ===
    KeepAlive {
        id: i32,
    },
    LoginRequest {
        protocol_version_or_entity_id: i32,
        username_or_level_type: String,
        map_seed: i64,
        dimension: Dimension,
        difficulty: Difficulty,
        world_height: u8,
        max_players: u8,
    },
    Handshake {
        username_or_token: String,
    },
    Chat {
        message: String,
    },

    // === Server -> client world/player state ===
    TimeUpdate {
        ticks: i64,
    },
    EntityEquipment {
        eid: i32,
        slot: i16,
        item: ItemStack,
    },
    SpawnPosition {
        x: i32,
        y: i32,
        z: i32,
    },
    UseEntity {
        target_eid: i32,
        mouse_button: Option<bool>,
    },
    UpdateHealth {
        health: i16,
        food: i16,
        saturation: f32,
    },
    Respawn {
        dimension: Dimension,
        difficulty: Difficulty,
        game_mode: GameMode,
        world_height: i16,
    },

    // === Client -> server movement ===
    PlayerOnGround {
        on_ground: bool,
    },
    PlayerPosition {
        x: f64,
        y: f64,
        stance: f64,
        z: f64,
        on_ground: bool,
    },
    PlayerLook {
        yaw: f32,
        pitch: f32,
        on_ground: bool,
    },
    PlayerPositionLook {
        x: f64,
        y: f64,
        stance: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
        on_ground: bool,
    },
    PlayerDig {
        status: i8,
        x: i32,
        y: i8,
        z: i32,
        face: i8,
    },
    PlayerPlace {
        x: i32,
        y: i8,
        z: i32,
        direction: i8,
        held_item: Option<ItemStack>,
    },
    HoldingChange {
        slot: i16,
    },
    UseBed {
        eid: i32,
        x: i32,
        y: i8,
        z: i32,
    },
    EntityAnimation {
        eid: i32,
        animation: i8,
    },
    EntityAction {
        eid: i32,
        action: i8,
    },

    // === Server -> client entity spawn/update ===
    SpawnNamedEntity {
        eid: i32,
        name: String,
        x: i32,
        y: i32,
        z: i32,
        yaw: i8,
        pitch: i8,
        held_item: i16,
    },
    SpawnPickupEntity {
        eid: i32,
        item: ItemStack,
        x: i32,
        y: i32,
        z: i32,
        rotation: i8,
        pitch: i8,
        roll: i8,
    },
    CollectItem {
        collected_eid: i32,
        collector_eid: i32,
    },
    AddObject {
        eid: i32,
        kind: i8,
        x: i32,
        y: i32,
        z: i32,
        thrower_data: Option<(i16, i16, i16)>,
    },
    SpawnMob {
        eid: i32,
        kind: i8,
        x: i32,
        y: i32,
        z: i32,
        yaw: i8,
        pitch: i8,
    },
    SpawnPainting {
        eid: i32,
        title: String,
        x: i32,
        y: i32,
        z: i32,
        direction: i32,
    },
    SpawnExperienceOrb {
        eid: i32,
        x: i32,
        y: i32,
        z: i32,
        count: i16,
    },
    EntityVelocity {
        eid: i32,
        vx: i16,
        vy: i16,
        vz: i16,
    },
    DestroyEntity {
        eid: i32,
    },
    EnsureEntitySpawn {
        eid: i32,
    },
    EntityRelativeMove {
        eid: i32,
        dx: i8,
        dy: i8,
        dz: i8,
    },
    EntityLook {
        eid: i32,
        yaw: i8,
        pitch: i8,
    },
    EntityLookRelativeMove {
        eid: i32,
        dx: i8,
        dy: i8,
        dz: i8,
        yaw: i8,
        pitch: i8,
    },
    EntityTeleport {
        eid: i32,
        x: i32,
        y: i32,
        z: i32,
        yaw: i8,
        pitch: i8,
    },
    EntityStatus {
        eid: i32,
        status: i8,
    },
    AttachEntity {
        eid: i32,
        vehicle_eid: i32,
    },
    EntityMetadata {
        eid: i32,
        entries: Vec<MetadataEntry>,
    },
    EntityEffect {
        eid: i32,
        effect: i8,
        amplifier: i8,
        duration: i16,
    },
    RemoveEntityEffect {
        eid: i32,
        effect: i8,
    },
    SetExperience {
        bar: f32,
        level: i16,
        total: i16,
    },

    // === World data ===
    ChunkCache {
        chunk_x: i32,
        chunk_z: i32,
        mode: bool,
    },
    ChunkMap {
        x: i32,
        y: i16,
        z: i32,
        size_x: u8,
        size_y: u8,
        size_z: u8,
        compressed: Vec<u8>,
    },
    MultiBlockChange {
        chunk_x: i32,
        chunk_z: i32,
        changes: Vec<BlockChangeRecord>,
    },
    BlockChange {
        x: i32,
        y: i8,
        z: i32,
        block_id: u8,
        metadata: u8,
    },
    BlockAction {
        x: i32,
        y: i16,
        z: i32,
        byte1: i8,
        byte2: i8,
    },
    Explosion {
        x: f64,
        y: f64,
        z: f64,
        radius: f32,
        affected: Vec<(i8, i8, i8)>,
    },
    SoundEffect {
        effect_id: i32,
        x: i32,
        y: i8,
        z: i32,
        data: i32,
    },
    NewState {
        reason: i8,
        game_mode: Option<GameMode>,
    },
    Thunderbolt {
        eid: i32,
        x: i32,
        y: i32,
        z: i32,
    },

    // === Inventory ===
    WindowOpen {
        window_id: u8,
        inventory_type: i8,
        title: String,
        slot_count: u8,
    },
    WindowClose {
        window_id: u8,
    },
    WindowClick {
        window_id: u8,
        slot: i16,
        button: i8,
        action_number: i16,
        shift: bool,
        clicked_item: Option<ItemStack>,
    },
    WindowSetSlot {
        window_id: u8,
        slot: i16,
        item: Option<ItemStack>,
    },
    WindowSetItems {
        window_id: u8,
        items: Vec<Option<ItemStack>>,
    },
    WindowProgress {
        window_id: u8,
        bar: i16,
        value: i16,
    },
    WindowTransaction {
        window_id: u8,
        action_number: i16,
        accepted: bool,
    },
    CreativeInventoryAction {
        slot: i16,
        item: Option<ItemStack>,
    },

    // === Misc ===
    UpdateSign {
        x: i32,
        y: i16,
        z: i32,
        lines: [String; 4],
    },
    ItemData {
        item_type: i16,
        item_damage: i16,
        data: Vec<u8>,
    },
    IncrementStatistic {
        statistic_id: i32,
        amount: i8,
    },
    PlayerListItem {
        name: String,
        online: bool,
        ping_ms: i16,
    },
    ServerListPing,
    Kick {
        reason: String,
    },

    /// Used only in tests and diagnostics: a well-formed but otherwise uninterpreted
    /// packet, for round-trip and framing tests that don't need full semantics.
    Unknown {
        id: u8,
        data: Vec<u8>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockChangeRecord {
    pub rel_x: i8,
    pub y: u8,
    pub rel_z: i8,
    pub block_id: u8,
    pub metadata: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataEntry {
    Byte(u8, i8),
    Short(u8, i16),
    Int(u8, i32),
    Float(u8, f32),
    String(u8, String),
    /// `None` is the empty-slot sentinel, same as a window slot with item id -1.
    ItemStack(u8, Option<ItemStack>),
    /// A block position triple, e.g. a sleeping mob's bed location.
    BlockTriple(u8, i32, i32, i32),
}

/// Maps a tracked [`EntityKind`] to the `kind` byte used by spawn-mob, so the session
/// driver does not need to remember the raw wire value.
pub fn entity_kind_to_mob_id(kind: EntityKind) -> i8 {
    match kind {
        EntityKind::Mob => 90,
        EntityKind::Player => 0,
        EntityKind::Object => 1,
        EntityKind::Pickup => 2,
        EntityKind::Painting => 3,
        EntityKind::ExperienceOrb => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mob_id_mapping_is_distinct_per_kind() {
        let ids = [
            entity_kind_to_mob_id(EntityKind::Mob),
            entity_kind_to_mob_id(EntityKind::Player),
            entity_kind_to_mob_id(EntityKind::Object),
            entity_kind_to_mob_id(EntityKind::Pickup),
            entity_kind_to_mob_id(EntityKind::Painting),
            entity_kind_to_mob_id(EntityKind::ExperienceOrb),
        ];
        for (i, a) in ids.iter().enumerate() {
            for (j, b) in ids.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "kind ids {i} and {j} collide");
                }
            }
        }
    }

    #[test]
    fn unknown_packet_carries_raw_bytes_for_diagnostics() {
        let packet = Packet::Unknown {
            id: 0x71,
            data: vec![1, 2, 3],
        };
        match packet {
            Packet::Unknown { id, data } => {
                assert_eq!(id, 0x71);
                assert_eq!(data, vec![1, 2, 3]);
            }
            _ => unreachable!(),
        }
    }
}
