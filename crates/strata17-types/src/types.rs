use serde::{Deserialize, Serialize};

/// An absolute block position in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i8,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i8, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn chunk_pos(&self) -> ChunkPos {
        ChunkPos {
            x: self.x >> 4,
            z: self.z >> 4,
        }
    }
}

/// A chunk column position (x, z), in chunk units (1 chunk = 16 blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// A 3D position with double precision, as carried by player/entity position packets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3d {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn chunk_pos(&self) -> ChunkPos {
        ChunkPos {
            x: (self.x.floor() as i32) >> 4,
            z: (self.z.floor() as i32) >> 4,
        }
    }
}

/// The world dimension. The wire encoding is -1 (nether) or 0 (overworld).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i8)]
pub enum Dimension {
    Nether = -1,
    Overworld = 0,
}

impl Dimension {
    pub fn id(self) -> i8 {
        self as i8
    }

    pub fn from_id(id: i8) -> Option<Self> {
        match id {
            -1 => Some(Dimension::Nether),
            0 => Some(Dimension::Overworld),
            _ => None,
        }
    }
}

/// Server difficulty, carried in the login-request packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Difficulty {
    Peaceful = 0,
    Easy = 1,
    Normal = 2,
    Hard = 3,
}

impl Difficulty {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Difficulty::Peaceful),
            1 => Some(Difficulty::Easy),
            2 => Some(Difficulty::Normal),
            3 => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Game mode enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameMode {
    Survival = 0,
    Creative = 1,
    Adventure = 2,
    Spectator = 3,
}

impl GameMode {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id & 0x03 {
            0 => Some(GameMode::Survival),
            1 => Some(GameMode::Creative),
            2 => Some(GameMode::Adventure),
            3 => Some(GameMode::Spectator),
            _ => None,
        }
    }
}

/// Which hand an action (dig/place/use) applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Hand {
    Main = 0,
    Off = 1,
}

/// An item stack in an inventory slot. A count of 0 (or an item id of -1) means empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemStack {
    pub item_id: i16,
    pub count: i8,
    pub damage: i16,
}

impl ItemStack {
    pub fn new(item_id: i16, count: i8, damage: i16) -> Self {
        Self {
            item_id,
            count,
            damage,
        }
    }

    pub fn empty() -> Self {
        Self {
            item_id: -1,
            count: 0,
            damage: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item_id < 0 || self.count <= 0
    }
}

/// A lightweight entity record tracked by the session driver. Positions are the
/// client's own floating-point view, converted from the wire's 1/32-block fixed point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub eid: i32,
    pub kind: EntityKind,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
    pub vx: i16,
    pub vy: i16,
    pub vz: i16,
}

impl Entity {
    pub fn new(eid: i32, kind: EntityKind, x: f64, y: f64, z: f64) -> Self {
        Self {
            eid,
            kind,
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
            vx: 0,
            vy: 0,
            vz: 0,
        }
    }

    /// Applies a 1/32-block fixed-point relative move, as carried by move-rel and
    /// look-move-rel packets.
    pub fn apply_rel_move(&mut self, dx: i8, dy: i8, dz: i8) {
        self.x += dx as f64 / 32.0;
        self.y += dy as f64 / 32.0;
        self.z += dz as f64 / 32.0;
    }
}

/// Coarse classification of a tracked entity; the driver does not need full
/// per-mob-type fidelity, only enough to know how to apply subsequent packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Mob,
    Object,
    Pickup,
    Painting,
    ExperienceOrb,
}

/// A plain-text chat message. Protocol 17 predates JSON text components; chat is a
/// single UCS-2 string, optionally carrying legacy `§`-prefixed formatting codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage(pub String);

impl ChatMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl std::fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_pos_chunk_pos() {
        let pos = BlockPos::new(31, 64, -1);
        let cp = pos.chunk_pos();
        assert_eq!(cp, ChunkPos::new(1, -1));
    }

    #[test]
    fn dimension_round_trip() {
        assert_eq!(Dimension::from_id(Dimension::Overworld.id()), Some(Dimension::Overworld));
        assert_eq!(Dimension::from_id(Dimension::Nether.id()), Some(Dimension::Nether));
        assert_eq!(Dimension::from_id(5), None);
    }

    #[test]
    fn item_stack_empty() {
        assert!(ItemStack::empty().is_empty());
        assert!(!ItemStack::new(1, 1, 0).is_empty());
    }

    #[test]
    fn entity_rel_move_is_1_32_block() {
        let mut e = Entity::new(1, EntityKind::Player, 0.0, 0.0, 0.0);
        e.apply_rel_move(32, -64, 0);
        assert_eq!(e.x, 1.0);
        assert_eq!(e.y, -2.0);
        assert_eq!(e.z, 0.0);
    }
}
