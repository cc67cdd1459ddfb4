use bytes::{Buf, BufMut, BytesMut};
use strata17_protocol_core::codec::{
    read_bool, read_f32, read_f64, read_i16, read_i32, read_i64, read_i8, read_string, read_u8,
    write_bool, write_f32, write_f64, write_i16, write_i32, write_i64, write_i8, write_string,
    write_u8, CodecError, CodecResult,
};
use strata17_protocol_core::packets::{BlockChangeRecord, MetadataEntry, Packet};
use strata17_protocol_core::state::{ConnectionState, Direction};
use strata17_protocol_core::ProtocolAdapter;
use strata17_types::{Difficulty, Dimension, GameMode, ItemStack};

pub const PROTOCOL_VERSION: i32 = 17;

pub struct V17Adapter;

impl V17Adapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for V17Adapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolAdapter for V17Adapter {
    fn protocol_version(&self) -> i32 {
        PROTOCOL_VERSION
    }

    fn try_decode(
        &self,
        state: ConnectionState,
        direction: Direction,
        buf: &mut BytesMut,
    ) -> CodecResult<Option<Packet>> {
        // Attempt the decode against a scratch copy first: on "not enough data"
        // nothing in `buf` should move, and a clone is the simplest way to get that
        // without hand-rolling a rollback for every variable-length field.
        let mut scratch = buf.clone();
        match decode_one(state, direction, &mut scratch) {
            Ok(packet) => {
                let consumed = buf.len() - scratch.len();
                buf.advance(consumed);
                Ok(Some(packet))
            }
            Err(CodecError::NotEnoughData { .. }) => Ok(None),
            Err(other) => Err(other),
        }
    }

    fn encode(&self, _state: ConnectionState, packet: &Packet, buf: &mut BytesMut) -> CodecResult<()> {
        encode_one(packet, buf)
    }
}

fn require_remaining(buf: &BytesMut, n: usize) -> CodecResult<()> {
    if buf.remaining() < n {
        return Err(CodecError::NotEnoughData {
            need: n,
            have: buf.remaining(),
        });
    }
    Ok(())
}

fn item_stack_read(buf: &mut BytesMut) -> CodecResult<Option<ItemStack>> {
    let item_id = read_i16(buf)?;
    if item_id < 0 {
        return Ok(None);
    }
    let count = read_i8(buf)?;
    let damage = read_i16(buf)?;
    Ok(Some(ItemStack {
        item_id,
        count,
        damage,
    }))
}

fn item_stack_write(buf: &mut BytesMut, item: Option<&ItemStack>) {
    match item {
        None => write_i16(buf, -1),
        Some(stack) => {
            write_i16(buf, stack.item_id);
            write_i8(buf, stack.count);
            write_i16(buf, stack.damage);
        }
    }
}

/// Reads the type-tagged entity metadata stream: a run of `(type << 5 | index)` key
/// bytes, each followed by a type-specific value, terminated by `0x7F`.
fn metadata_read(buf: &mut BytesMut) -> CodecResult<Vec<MetadataEntry>> {
    let mut entries = Vec::new();
    loop {
        let tag = read_u8(buf)?;
        if tag == 0x7F {
            return Ok(entries);
        }
        let kind = tag >> 5;
        let index = tag & 0x1F;
        let entry = match kind {
            0 => MetadataEntry::Byte(index, read_i8(buf)?),
            1 => MetadataEntry::Short(index, read_i16(buf)?),
            2 => MetadataEntry::Int(index, read_i32(buf)?),
            3 => MetadataEntry::Float(index, read_f32(buf)?),
            4 => MetadataEntry::String(index, read_string(buf, 64)?),
            5 => MetadataEntry::ItemStack(index, item_stack_read(buf)?),
            6 => MetadataEntry::BlockTriple(index, read_i32(buf)?, read_i32(buf)?, read_i32(buf)?),
            _ => return Err(CodecError::UnknownPacketId(tag)),
        };
        entries.push(entry);
    }
}

fn metadata_write(buf: &mut BytesMut, entries: &[MetadataEntry]) -> CodecResult<()> {
    for entry in entries {
        match entry {
            MetadataEntry::Byte(i, v) => {
                buf.put_u8((i & 0x1F) | (0 << 5));
                write_i8(buf, *v);
            }
            MetadataEntry::Short(i, v) => {
                buf.put_u8((i & 0x1F) | (1 << 5));
                write_i16(buf, *v);
            }
            MetadataEntry::Int(i, v) => {
                buf.put_u8((i & 0x1F) | (2 << 5));
                write_i32(buf, *v);
            }
            MetadataEntry::Float(i, v) => {
                buf.put_u8((i & 0x1F) | (3 << 5));
                write_f32(buf, *v);
            }
            MetadataEntry::String(i, v) => {
                buf.put_u8((i & 0x1F) | (4 << 5));
                write_string(buf, v)?;
            }
            MetadataEntry::ItemStack(i, v) => {
                buf.put_u8((i & 0x1F) | (5 << 5));
                item_stack_write(buf, v.as_ref());
            }
            MetadataEntry::BlockTriple(i, x, y, z) => {
                buf.put_u8((i & 0x1F) | (6 << 5));
                write_i32(buf, *x);
                write_i32(buf, *y);
                write_i32(buf, *z);
            }
        }
    }
    buf.put_u8(0x7F);
    Ok(())
}

fn decode_one(state: ConnectionState, direction: Direction, buf: &mut BytesMut) -> CodecResult<Packet> {
    let id = read_u8(buf)?;
    match id {
        0x00 => Ok(Packet::KeepAlive { id: read_i32(buf)? }),
        0x01 => decode_login_request(direction, buf),
        0x02 => Ok(Packet::Handshake {
            username_or_token: read_string(buf, 16)?,
        }),
        0x03 => Ok(Packet::Chat {
            message: read_string(buf, 100)?,
        }),
        0x04 => Ok(Packet::TimeUpdate { ticks: read_i64(buf)? }),
        0x05 => Ok(Packet::EntityEquipment {
            eid: read_i32(buf)?,
            slot: read_i16(buf)?,
            item: item_stack_read(buf)?.unwrap_or(ItemStack::empty()),
        }),
        0x06 => Ok(Packet::SpawnPosition {
            x: read_i32(buf)?,
            y: read_i32(buf)?,
            z: read_i32(buf)?,
        }),
        0x07 => {
            let target_eid = read_i32(buf)?;
            let has_button = read_bool(buf)?;
            let mouse_button = if has_button { Some(read_bool(buf)?) } else { None };
            Ok(Packet::UseEntity {
                target_eid,
                mouse_button,
            })
        }
        0x08 => Ok(Packet::UpdateHealth {
            health: read_i16(buf)?,
            food: read_i16(buf)?,
            saturation: read_f32(buf)?,
        }),
        0x09 => Ok(Packet::Respawn {
            dimension: dimension_from_i8(read_i8(buf)?)?,
            difficulty: difficulty_from_u8(read_u8(buf)?)?,
            game_mode: game_mode_from_u8(read_u8(buf)?)?,
            world_height: read_i16(buf)?,
        }),
        0x0a => Ok(Packet::PlayerOnGround {
            on_ground: read_bool(buf)?,
        }),
        0x0b => Ok(Packet::PlayerPosition {
            x: read_f64(buf)?,
            y: read_f64(buf)?,
            stance: read_f64(buf)?,
            z: read_f64(buf)?,
            on_ground: read_bool(buf)?,
        }),
        0x0c => Ok(Packet::PlayerLook {
            yaw: read_f32(buf)?,
            pitch: read_f32(buf)?,
            on_ground: read_bool(buf)?,
        }),
        0x0d => Ok(Packet::PlayerPositionLook {
            x: read_f64(buf)?,
            y: read_f64(buf)?,
            stance: read_f64(buf)?,
            z: read_f64(buf)?,
            yaw: read_f32(buf)?,
            pitch: read_f32(buf)?,
            on_ground: read_bool(buf)?,
        }),
        0x0e => Ok(Packet::PlayerDig {
            status: read_i8(buf)?,
            x: read_i32(buf)?,
            y: read_i8(buf)?,
            z: read_i32(buf)?,
            face: read_i8(buf)?,
        }),
        0x0f => {
            let x = read_i32(buf)?;
            let y = read_i8(buf)?;
            let z = read_i32(buf)?;
            let direction_byte = read_i8(buf)?;
            let item_id = read_i16(buf)?;
            let held_item = if item_id >= 0 {
                let count = read_i8(buf)?;
                let damage = read_i16(buf)?;
                Some(ItemStack {
                    item_id,
                    count,
                    damage,
                })
            } else {
                None
            };
            Ok(Packet::PlayerPlace {
                x,
                y,
                z,
                direction: direction_byte,
                held_item,
            })
        }
        0x10 => Ok(Packet::HoldingChange { slot: read_i16(buf)? }),
        0x11 => Ok(Packet::UseBed {
            eid: read_i32(buf)?,
            x: read_i32(buf)?,
            y: read_i8(buf)?,
            z: read_i32(buf)?,
        }),
        0x12 => Ok(Packet::EntityAnimation {
            eid: read_i32(buf)?,
            animation: read_i8(buf)?,
        }),
        0x13 => Ok(Packet::EntityAction {
            eid: read_i32(buf)?,
            action: read_i8(buf)?,
        }),
        0x14 => Ok(Packet::SpawnNamedEntity {
            eid: read_i32(buf)?,
            name: read_string(buf, 16)?,
            x: read_i32(buf)?,
            y: read_i32(buf)?,
            z: read_i32(buf)?,
            yaw: read_i8(buf)?,
            pitch: read_i8(buf)?,
            held_item: read_i16(buf)?,
        }),
        0x15 => Ok(Packet::SpawnPickupEntity {
            eid: read_i32(buf)?,
            item: item_stack_read(buf)?.unwrap_or(ItemStack::empty()),
            x: read_i32(buf)?,
            y: read_i32(buf)?,
            z: read_i32(buf)?,
            rotation: read_i8(buf)?,
            pitch: read_i8(buf)?,
            roll: read_i8(buf)?,
        }),
        0x16 => Ok(Packet::CollectItem {
            collected_eid: read_i32(buf)?,
            collector_eid: read_i32(buf)?,
        }),
        0x17 => {
            let eid = read_i32(buf)?;
            let kind = read_i8(buf)?;
            let x = read_i32(buf)?;
            let y = read_i32(buf)?;
            let z = read_i32(buf)?;
            let thrower_flag = read_i32(buf)?;
            let thrower_data = if thrower_flag > 0 {
                Some((read_i16(buf)?, read_i16(buf)?, read_i16(buf)?))
            } else {
                None
            };
            Ok(Packet::AddObject {
                eid,
                kind,
                x,
                y,
                z,
                thrower_data,
            })
        }
        0x18 => Ok(Packet::SpawnMob {
            eid: read_i32(buf)?,
            kind: read_i8(buf)?,
            x: read_i32(buf)?,
            y: read_i32(buf)?,
            z: read_i32(buf)?,
            yaw: read_i8(buf)?,
            pitch: read_i8(buf)?,
        }),
        0x19 => Ok(Packet::SpawnPainting {
            eid: read_i32(buf)?,
            title: read_string(buf, 13)?,
            x: read_i32(buf)?,
            y: read_i32(buf)?,
            z: read_i32(buf)?,
            direction: read_i32(buf)?,
        }),
        0x1a => Ok(Packet::SpawnExperienceOrb {
            eid: read_i32(buf)?,
            x: read_i32(buf)?,
            y: read_i32(buf)?,
            z: read_i32(buf)?,
            count: read_i16(buf)?,
        }),
        0x1c => Ok(Packet::EntityVelocity {
            eid: read_i32(buf)?,
            vx: read_i16(buf)?,
            vy: read_i16(buf)?,
            vz: read_i16(buf)?,
        }),
        0x1d => Ok(Packet::DestroyEntity { eid: read_i32(buf)? }),
        0x1e => Ok(Packet::EnsureEntitySpawn { eid: read_i32(buf)? }),
        0x1f => Ok(Packet::EntityRelativeMove {
            eid: read_i32(buf)?,
            dx: read_i8(buf)?,
            dy: read_i8(buf)?,
            dz: read_i8(buf)?,
        }),
        0x20 => Ok(Packet::EntityLook {
            eid: read_i32(buf)?,
            yaw: read_i8(buf)?,
            pitch: read_i8(buf)?,
        }),
        0x21 => Ok(Packet::EntityLookRelativeMove {
            eid: read_i32(buf)?,
            dx: read_i8(buf)?,
            dy: read_i8(buf)?,
            dz: read_i8(buf)?,
            yaw: read_i8(buf)?,
            pitch: read_i8(buf)?,
        }),
        0x22 => Ok(Packet::EntityTeleport {
            eid: read_i32(buf)?,
            x: read_i32(buf)?,
            y: read_i32(buf)?,
            z: read_i32(buf)?,
            yaw: read_i8(buf)?,
            pitch: read_i8(buf)?,
        }),
        0x26 => Ok(Packet::EntityStatus {
            eid: read_i32(buf)?,
            status: read_i8(buf)?,
        }),
        0x27 => Ok(Packet::AttachEntity {
            eid: read_i32(buf)?,
            vehicle_eid: read_i32(buf)?,
        }),
        0x28 => Ok(Packet::EntityMetadata {
            eid: read_i32(buf)?,
            entries: metadata_read(buf)?,
        }),
        0x29 => Ok(Packet::EntityEffect {
            eid: read_i32(buf)?,
            effect: read_i8(buf)?,
            amplifier: read_i8(buf)?,
            duration: read_i16(buf)?,
        }),
        0x2a => Ok(Packet::RemoveEntityEffect {
            eid: read_i32(buf)?,
            effect: read_i8(buf)?,
        }),
        0x2b => Ok(Packet::SetExperience {
            bar: read_f32(buf)?,
            level: read_i16(buf)?,
            total: read_i16(buf)?,
        }),
        0x32 => Ok(Packet::ChunkCache {
            chunk_x: read_i32(buf)?,
            chunk_z: read_i32(buf)?,
            mode: read_bool(buf)?,
        }),
        0x33 => {
            let x = read_i32(buf)?;
            let y = read_i16(buf)?;
            let z = read_i32(buf)?;
            let size_x = read_i8(buf)? as u8;
            let size_y = read_i8(buf)? as u8;
            let size_z = read_i8(buf)? as u8;
            let len = read_i32(buf)? as usize;
            require_remaining(buf, len)?;
            let compressed = buf.split_to(len).to_vec();
            Ok(Packet::ChunkMap {
                x,
                y,
                z,
                size_x,
                size_y,
                size_z,
                compressed,
            })
        }
        0x34 => {
            let chunk_x = read_i32(buf)?;
            let chunk_z = read_i32(buf)?;
            let n = read_i16(buf)? as usize;
            let mut coords = Vec::with_capacity(n);
            for _ in 0..n {
                coords.push(read_i16(buf)?);
            }
            let mut block_ids = Vec::with_capacity(n);
            for _ in 0..n {
                block_ids.push(read_i8(buf)? as u8);
            }
            let mut metas = Vec::with_capacity(n);
            for _ in 0..n {
                metas.push(read_i8(buf)? as u8);
            }
            let changes = coords
                .into_iter()
                .zip(block_ids)
                .zip(metas)
                .map(|((coord, block_id), metadata)| BlockChangeRecord {
                    rel_x: ((coord >> 12) & 0xF) as i8,
                    y: (coord & 0xFF) as u8,
                    rel_z: ((coord >> 8) & 0xF) as i8,
                    block_id,
                    metadata,
                })
                .collect();
            Ok(Packet::MultiBlockChange {
                chunk_x,
                chunk_z,
                changes,
            })
        }
        0x35 => Ok(Packet::BlockChange {
            x: read_i32(buf)?,
            y: read_i8(buf)?,
            z: read_i32(buf)?,
            block_id: read_i8(buf)? as u8,
            metadata: read_i8(buf)? as u8,
        }),
        0x36 => Ok(Packet::BlockAction {
            x: read_i32(buf)?,
            y: read_i16(buf)?,
            z: read_i32(buf)?,
            byte1: read_i8(buf)?,
            byte2: read_i8(buf)?,
        }),
        0x3c => {
            let x = read_f64(buf)?;
            let y = read_f64(buf)?;
            let z = read_f64(buf)?;
            let radius = read_f32(buf)?;
            let n = read_i32(buf)? as usize;
            let mut affected = Vec::with_capacity(n);
            for _ in 0..n {
                affected.push((read_i8(buf)?, read_i8(buf)?, read_i8(buf)?));
            }
            Ok(Packet::Explosion {
                x,
                y,
                z,
                radius,
                affected,
            })
        }
        0x3d => Ok(Packet::SoundEffect {
            effect_id: read_i32(buf)?,
            x: read_i32(buf)?,
            y: read_i8(buf)?,
            z: read_i32(buf)?,
            data: read_i32(buf)?,
        }),
        0x46 => {
            let reason = read_i8(buf)?;
            let game_mode = if reason == 3 {
                Some(game_mode_from_u8(read_u8(buf)?)?)
            } else {
                let _ = read_u8(buf)?;
                None
            };
            Ok(Packet::NewState { reason, game_mode })
        }
        0x47 => Ok(Packet::Thunderbolt {
            eid: read_i32(buf)?,
            x: read_i32(buf)?,
            y: read_i32(buf)?,
            z: read_i32(buf)?,
        }),
        0x64 => Ok(Packet::WindowOpen {
            window_id: read_u8(buf)?,
            inventory_type: read_i8(buf)?,
            title: read_string(buf, 32)?,
            slot_count: read_u8(buf)?,
        }),
        0x65 => Ok(Packet::WindowClose {
            window_id: read_u8(buf)?,
        }),
        0x66 => {
            let window_id = read_u8(buf)?;
            let slot = read_i16(buf)?;
            let button = read_i8(buf)?;
            let action_number = read_i16(buf)?;
            let shift = read_bool(buf)?;
            let clicked_item = item_stack_read(buf)?;
            Ok(Packet::WindowClick {
                window_id,
                slot,
                button,
                action_number,
                shift,
                clicked_item,
            })
        }
        0x67 => Ok(Packet::WindowSetSlot {
            window_id: read_u8(buf)?,
            slot: read_i16(buf)?,
            item: item_stack_read(buf)?,
        }),
        0x68 => {
            let window_id = read_u8(buf)?;
            let count = read_i16(buf)? as usize;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(item_stack_read(buf)?);
            }
            Ok(Packet::WindowSetItems { window_id, items })
        }
        0x69 => Ok(Packet::WindowProgress {
            window_id: read_u8(buf)?,
            bar: read_i16(buf)?,
            value: read_i16(buf)?,
        }),
        0x6a => Ok(Packet::WindowTransaction {
            window_id: read_u8(buf)?,
            action_number: read_i16(buf)?,
            accepted: read_bool(buf)?,
        }),
        0x6b => Ok(Packet::CreativeInventoryAction {
            slot: read_i16(buf)?,
            item: item_stack_read(buf)?,
        }),
        0x82 => {
            let x = read_i32(buf)?;
            let y = read_i16(buf)?;
            let z = read_i32(buf)?;
            let lines = [
                read_string(buf, 15)?,
                read_string(buf, 15)?,
                read_string(buf, 15)?,
                read_string(buf, 15)?,
            ];
            Ok(Packet::UpdateSign { x, y, z, lines })
        }
        0x83 => {
            let item_type = read_i16(buf)?;
            let item_damage = read_i16(buf)?;
            let len = read_i16(buf)? as usize;
            require_remaining(buf, len)?;
            let data = buf.split_to(len).to_vec();
            Ok(Packet::ItemData {
                item_type,
                item_damage,
                data,
            })
        }
        0xc8 => Ok(Packet::IncrementStatistic {
            statistic_id: read_i32(buf)?,
            amount: read_i8(buf)?,
        }),
        0xc9 => Ok(Packet::PlayerListItem {
            name: read_string(buf, 16)?,
            online: read_bool(buf)?,
            ping_ms: read_i16(buf)?,
        }),
        0xfe => Ok(Packet::ServerListPing),
        0xff => Ok(Packet::Kick {
            reason: read_string(buf, 100)?,
        }),
        other => Err(CodecError::WrongState {
            id: other,
            state: state_name(state),
            direction: direction_name(direction),
        }),
    }
}

fn decode_login_request(direction: Direction, buf: &mut BytesMut) -> CodecResult<Packet> {
    match direction {
        Direction::Serverbound => {
            let protocol_version = read_i32(buf)?;
            let username = read_string(buf, 16)?;
            Ok(Packet::LoginRequest {
                protocol_version_or_entity_id: protocol_version,
                username_or_level_type: username,
                map_seed: 0,
                dimension: Dimension::Overworld,
                difficulty: Difficulty::Peaceful,
                world_height: 0,
                max_players: 0,
            })
        }
        Direction::Clientbound => {
            let entity_id = read_i32(buf)?;
            let level_type = read_string(buf, 16)?;
            let map_seed = read_i64(buf)?;
            let dimension = dimension_from_i8(read_i8(buf)?)?;
            let difficulty = difficulty_from_u8(read_u8(buf)?)?;
            let world_height = read_u8(buf)?;
            let max_players = read_u8(buf)?;
            Ok(Packet::LoginRequest {
                protocol_version_or_entity_id: entity_id,
                username_or_level_type: level_type,
                map_seed,
                dimension,
                difficulty,
                world_height,
                max_players,
            })
        }
    }
}

fn dimension_from_i8(v: i8) -> CodecResult<Dimension> {
    Dimension::from_id(v).ok_or(CodecError::UnknownPacketId(v as u8))
}

fn difficulty_from_u8(v: u8) -> CodecResult<Difficulty> {
    Difficulty::from_id(v).ok_or(CodecError::UnknownPacketId(v))
}

fn game_mode_from_u8(v: u8) -> CodecResult<GameMode> {
    GameMode::from_id(v).ok_or(CodecError::UnknownPacketId(v))
}

fn state_name(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Handshaking => "handshaking",
        ConnectionState::LoggingIn => "logging_in",
        ConnectionState::Play => "play",
        ConnectionState::Terminated => "terminated",
    }
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Serverbound => "serverbound",
        Direction::Clientbound => "clientbound",
    }
}

fn encode_one(packet: &Packet, buf: &mut BytesMut) -> CodecResult<()> {
    match packet {
        Packet::KeepAlive { id } => {
            buf.put_u8(0x00);
            write_i32(buf, *id);
        }
        Packet::LoginRequest {
            protocol_version_or_entity_id,
            username_or_level_type,
            map_seed,
            dimension,
            difficulty,
            world_height,
            max_players,
        } => {
            buf.put_u8(0x01);
            write_i32(buf, *protocol_version_or_entity_id);
            write_string(buf, username_or_level_type)?;
            write_i64(buf, *map_seed);
            write_i8(buf, dimension.id());
            write_u8(buf, difficulty.id());
            write_u8(buf, *world_height);
            write_u8(buf, *max_players);
        }
        Packet::Handshake { username_or_token } => {
            buf.put_u8(0x02);
            write_string(buf, username_or_token)?;
        }
        Packet::Chat { message } => {
            buf.put_u8(0x03);
            write_string(buf, message)?;
        }
        Packet::TimeUpdate { ticks } => {
            buf.put_u8(0x04);
            write_i64(buf, *ticks);
        }
        Packet::EntityEquipment { eid, slot, item } => {
            buf.put_u8(0x05);
            write_i32(buf, *eid);
            write_i16(buf, *slot);
            item_stack_write(buf, if item.is_empty() { None } else { Some(item) });
        }
        Packet::SpawnPosition { x, y, z } => {
            buf.put_u8(0x06);
            write_i32(buf, *x);
            write_i32(buf, *y);
            write_i32(buf, *z);
        }
        Packet::UseEntity {
            target_eid,
            mouse_button,
        } => {
            buf.put_u8(0x07);
            write_i32(buf, *target_eid);
            write_bool(buf, mouse_button.is_some());
            if let Some(button) = mouse_button {
                write_bool(buf, *button);
            }
        }
        Packet::UpdateHealth {
            health,
            food,
            saturation,
        } => {
            buf.put_u8(0x08);
            write_i16(buf, *health);
            write_i16(buf, *food);
            write_f32(buf, *saturation);
        }
        Packet::Respawn {
            dimension,
            difficulty,
            game_mode,
            world_height,
        } => {
            buf.put_u8(0x09);
            write_i8(buf, dimension.id());
            write_u8(buf, difficulty.id());
            write_u8(buf, game_mode.id());
            write_i16(buf, *world_height);
        }
        Packet::PlayerOnGround { on_ground } => {
            buf.put_u8(0x0a);
            write_bool(buf, *on_ground);
        }
        Packet::PlayerPosition {
            x,
            y,
            stance,
            z,
            on_ground,
        } => {
            buf.put_u8(0x0b);
            write_f64(buf, *x);
            write_f64(buf, *y);
            write_f64(buf, *stance);
            write_f64(buf, *z);
            write_bool(buf, *on_ground);
        }
        Packet::PlayerLook {
            yaw,
            pitch,
            on_ground,
        } => {
            buf.put_u8(0x0c);
            write_f32(buf, *yaw);
            write_f32(buf, *pitch);
            write_bool(buf, *on_ground);
        }
        Packet::PlayerPositionLook {
            x,
            y,
            stance,
            z,
            yaw,
            pitch,
            on_ground,
        } => {
            buf.put_u8(0x0d);
            write_f64(buf, *x);
            write_f64(buf, *y);
            write_f64(buf, *stance);
            write_f64(buf, *z);
            write_f32(buf, *yaw);
            write_f32(buf, *pitch);
            write_bool(buf, *on_ground);
        }
        Packet::PlayerDig {
            status,
            x,
            y,
            z,
            face,
        } => {
            buf.put_u8(0x0e);
            write_i8(buf, *status);
            write_i32(buf, *x);
            write_i8(buf, *y);
            write_i32(buf, *z);
            write_i8(buf, *face);
        }
        Packet::PlayerPlace {
            x,
            y,
            z,
            direction,
            held_item,
        } => {
            buf.put_u8(0x0f);
            write_i32(buf, *x);
            write_i8(buf, *y);
            write_i32(buf, *z);
            write_i8(buf, *direction);
            item_stack_write(buf, held_item.as_ref());
        }
        Packet::HoldingChange { slot } => {
            buf.put_u8(0x10);
            write_i16(buf, *slot);
        }
        Packet::UseBed { eid, x, y, z } => {
            buf.put_u8(0x11);
            write_i32(buf, *eid);
            write_i32(buf, *x);
            write_i8(buf, *y);
            write_i32(buf, *z);
        }
        Packet::EntityAnimation { eid, animation } => {
            buf.put_u8(0x12);
            write_i32(buf, *eid);
            write_i8(buf, *animation);
        }
        Packet::EntityAction { eid, action } => {
            buf.put_u8(0x13);
            write_i32(buf, *eid);
            write_i8(buf, *action);
        }
        Packet::SpawnNamedEntity {
            eid,
            name,
            x,
            y,
            z,
            yaw,
            pitch,
            held_item,
        } => {
            buf.put_u8(0x14);
            write_i32(buf, *eid);
            write_string(buf, name)?;
            write_i32(buf, *x);
            write_i32(buf, *y);
            write_i32(buf, *z);
            write_i8(buf, *yaw);
            write_i8(buf, *pitch);
            write_i16(buf, *held_item);
        }
        Packet::SpawnPickupEntity {
            eid,
            item,
            x,
            y,
            z,
            rotation,
            pitch,
            roll,
        } => {
            buf.put_u8(0x15);
            write_i32(buf, *eid);
            item_stack_write(buf, Some(item));
            write_i32(buf, *x);
            write_i32(buf, *y);
            write_i32(buf, *z);
            write_i8(buf, *rotation);
            write_i8(buf, *pitch);
            write_i8(buf, *roll);
        }
        Packet::CollectItem {
            collected_eid,
            collector_eid,
        } => {
            buf.put_u8(0x16);
            write_i32(buf, *collected_eid);
            write_i32(buf, *collector_eid);
        }
        Packet::AddObject {
            eid,
            kind,
            x,
            y,
            z,
            thrower_data,
        } => {
            buf.put_u8(0x17);
            write_i32(buf, *eid);
            write_i8(buf, *kind);
            write_i32(buf, *x);
            write_i32(buf, *y);
            write_i32(buf, *z);
            match thrower_data {
                Some((vx, vy, vz)) => {
                    write_i32(buf, 1);
                    write_i16(buf, *vx);
                    write_i16(buf, *vy);
                    write_i16(buf, *vz);
                }
                None => write_i32(buf, 0),
            }
        }
        Packet::SpawnMob {
            eid,
            kind,
            x,
            y,
            z,
            yaw,
            pitch,
        } => {
            buf.put_u8(0x18);
            write_i32(buf, *eid);
            write_i8(buf, *kind);
            write_i32(buf, *x);
            write_i32(buf, *y);
            write_i32(buf, *z);
            write_i8(buf, *yaw);
            write_i8(buf, *pitch);
        }
        Packet::SpawnPainting {
            eid,
            title,
            x,
            y,
            z,
            direction,
        } => {
            buf.put_u8(0x19);
            write_i32(buf, *eid);
            write_string(buf, title)?;
            write_i32(buf, *x);
            write_i32(buf, *y);
            write_i32(buf, *z);
            write_i32(buf, *direction);
        }
        Packet::SpawnExperienceOrb { eid, x, y, z, count } => {
            buf.put_u8(0x1a);
            write_i32(buf, *eid);
            write_i32(buf, *x);
            write_i32(buf, *y);
            write_i32(buf, *z);
            write_i16(buf, *count);
        }
        Packet::EntityVelocity { eid, vx, vy, vz } => {
            buf.put_u8(0x1c);
            write_i32(buf, *eid);
            write_i16(buf, *vx);
            write_i16(buf, *vy);
            write_i16(buf, *vz);
        }
        Packet::DestroyEntity { eid } => {
            buf.put_u8(0x1d);
            write_i32(buf, *eid);
        }
        Packet::EnsureEntitySpawn { eid } => {
            buf.put_u8(0x1e);
            write_i32(buf, *eid);
        }
        Packet::EntityRelativeMove { eid, dx, dy, dz } => {
            buf.put_u8(0x1f);
            write_i32(buf, *eid);
            write_i8(buf, *dx);
            write_i8(buf, *dy);
            write_i8(buf, *dz);
        }
        Packet::EntityLook { eid, yaw, pitch } => {
            buf.put_u8(0x20);
            write_i32(buf, *eid);
            write_i8(buf, *yaw);
            write_i8(buf, *pitch);
        }
        Packet::EntityLookRelativeMove {
            eid,
            dx,
            dy,
            dz,
            yaw,
            pitch,
        } => {
            buf.put_u8(0x21);
            write_i32(buf, *eid);
            write_i8(buf, *dx);
            write_i8(buf, *dy);
            write_i8(buf, *dz);
            write_i8(buf, *yaw);
            write_i8(buf, *pitch);
        }
        Packet::EntityTeleport {
            eid,
            x,
            y,
            z,
            yaw,
            pitch,
        } => {
            buf.put_u8(0x22);
            write_i32(buf, *eid);
            write_i32(buf, *x);
            write_i32(buf, *y);
            write_i32(buf, *z);
            write_i8(buf, *yaw);
            write_i8(buf, *pitch);
        }
        Packet::EntityStatus { eid, status } => {
            buf.put_u8(0x26);
            write_i32(buf, *eid);
            write_i8(buf, *status);
        }
        Packet::AttachEntity { eid, vehicle_eid } => {
            buf.put_u8(0x27);
            write_i32(buf, *eid);
            write_i32(buf, *vehicle_eid);
        }
        Packet::EntityMetadata { eid, entries } => {
            buf.put_u8(0x28);
            write_i32(buf, *eid);
            metadata_write(buf, entries)?;
        }
        Packet::EntityEffect {
            eid,
            effect,
            amplifier,
            duration,
        } => {
            buf.put_u8(0x29);
            write_i32(buf, *eid);
            write_i8(buf, *effect);
            write_i8(buf, *amplifier);
            write_i16(buf, *duration);
        }
        Packet::RemoveEntityEffect { eid, effect } => {
            buf.put_u8(0x2a);
            write_i32(buf, *eid);
            write_i8(buf, *effect);
        }
        Packet::SetExperience { bar, level, total } => {
            buf.put_u8(0x2b);
            write_f32(buf, *bar);
            write_i16(buf, *level);
            write_i16(buf, *total);
        }
        Packet::ChunkCache {
            chunk_x,
            chunk_z,
            mode,
        } => {
            buf.put_u8(0x32);
            write_i32(buf, *chunk_x);
            write_i32(buf, *chunk_z);
            write_bool(buf, *mode);
        }
        Packet::ChunkMap {
            x,
            y,
            z,
            size_x,
            size_y,
            size_z,
            compressed,
        } => {
            buf.put_u8(0x33);
            write_i32(buf, *x);
            write_i16(buf, *y);
            write_i32(buf, *z);
            write_i8(buf, *size_x as i8);
            write_i8(buf, *size_y as i8);
            write_i8(buf, *size_z as i8);
            write_i32(buf, compressed.len() as i32);
            buf.put_slice(compressed);
        }
        Packet::MultiBlockChange {
            chunk_x,
            chunk_z,
            changes,
        } => {
            buf.put_u8(0x34);
            write_i32(buf, *chunk_x);
            write_i32(buf, *chunk_z);
            write_i16(buf, changes.len() as i16);
            for c in changes {
                let coord = ((c.rel_x as i16 & 0xF) << 12) | ((c.rel_z as i16 & 0xF) << 8) | (c.y as i16 & 0xFF);
                write_i16(buf, coord);
            }
            for c in changes {
                write_i8(buf, c.block_id as i8);
            }
            for c in changes {
                write_i8(buf, c.metadata as i8);
            }
        }
        Packet::BlockChange {
            x,
            y,
            z,
            block_id,
            metadata,
        } => {
            buf.put_u8(0x35);
            write_i32(buf, *x);
            write_i8(buf, *y);
            write_i32(buf, *z);
            write_i8(buf, *block_id as i8);
            write_i8(buf, *metadata as i8);
        }
        Packet::BlockAction {
            x,
            y,
            z,
            byte1,
            byte2,
        } => {
            buf.put_u8(0x36);
            write_i32(buf, *x);
            write_i16(buf, *y);
            write_i32(buf, *z);
            write_i8(buf, *byte1);
            write_i8(buf, *byte2);
        }
        Packet::Explosion {
            x,
            y,
            z,
            radius,
            affected,
        } => {
            buf.put_u8(0x3c);
            write_f64(buf, *x);
            write_f64(buf, *y);
            write_f64(buf, *z);
            write_f32(buf, *radius);
            write_i32(buf, affected.len() as i32);
            for (dx, dy, dz) in affected {
                write_i8(buf, *dx);
                write_i8(buf, *dy);
                write_i8(buf, *dz);
            }
        }
        Packet::SoundEffect {
            effect_id,
            x,
            y,
            z,
            data,
        } => {
            buf.put_u8(0x3d);
            write_i32(buf, *effect_id);
            write_i32(buf, *x);
            write_i8(buf, *y);
            write_i32(buf, *z);
            write_i32(buf, *data);
        }
        Packet::NewState { reason, game_mode } => {
            buf.put_u8(0x46);
            write_i8(buf, *reason);
            write_u8(buf, game_mode.map(|m| m.id()).unwrap_or(0));
        }
        Packet::Thunderbolt { eid, x, y, z } => {
            buf.put_u8(0x47);
            write_i32(buf, *eid);
            write_i32(buf, *x);
            write_i32(buf, *y);
            write_i32(buf, *z);
        }
        Packet::WindowOpen {
            window_id,
            inventory_type,
            title,
            slot_count,
        } => {
            buf.put_u8(0x64);
            write_u8(buf, *window_id);
            write_i8(buf, *inventory_type);
            write_string(buf, title)?;
            write_u8(buf, *slot_count);
        }
        Packet::WindowClose { window_id } => {
            buf.put_u8(0x65);
            write_u8(buf, *window_id);
        }
        Packet::WindowClick {
            window_id,
            slot,
            button,
            action_number,
            shift,
            clicked_item,
        } => {
            buf.put_u8(0x66);
            write_u8(buf, *window_id);
            write_i16(buf, *slot);
            write_i8(buf, *button);
            write_i16(buf, *action_number);
            write_bool(buf, *shift);
            item_stack_write(buf, clicked_item.as_ref());
        }
        Packet::WindowSetSlot {
            window_id,
            slot,
            item,
        } => {
            buf.put_u8(0x67);
            write_u8(buf, *window_id);
            write_i16(buf, *slot);
            item_stack_write(buf, item.as_ref());
        }
        Packet::WindowSetItems { window_id, items } => {
            buf.put_u8(0x68);
            write_u8(buf, *window_id);
            write_i16(buf, items.len() as i16);
            for item in items {
                item_stack_write(buf, item.as_ref());
            }
        }
        Packet::WindowProgress {
            window_id,
            bar,
            value,
        } => {
            buf.put_u8(0x69);
            write_u8(buf, *window_id);
            write_i16(buf, *bar);
            write_i16(buf, *value);
        }
        Packet::WindowTransaction {
            window_id,
            action_number,
            accepted,
        } => {
            buf.put_u8(0x6a);
            write_u8(buf, *window_id);
            write_i16(buf, *action_number);
            write_bool(buf, *accepted);
        }
        Packet::CreativeInventoryAction { slot, item } => {
            buf.put_u8(0x6b);
            write_i16(buf, *slot);
            item_stack_write(buf, item.as_ref());
        }
        Packet::UpdateSign { x, y, z, lines } => {
            buf.put_u8(0x82);
            write_i32(buf, *x);
            write_i16(buf, *y);
            write_i32(buf, *z);
            for line in lines {
                write_string(buf, line)?;
            }
        }
        Packet::ItemData {
            item_type,
            item_damage,
            data,
        } => {
            buf.put_u8(0x83);
            write_i16(buf, *item_type);
            write_i16(buf, *item_damage);
            write_i16(buf, data.len() as i16);
            buf.put_slice(data);
        }
        Packet::IncrementStatistic {
            statistic_id,
            amount,
        } => {
            buf.put_u8(0xc8);
            write_i32(buf, *statistic_id);
            write_i8(buf, *amount);
        }
        Packet::PlayerListItem {
            name,
            online,
            ping_ms,
        } => {
            buf.put_u8(0xc9);
            write_string(buf, name)?;
            write_bool(buf, *online);
            write_i16(buf, *ping_ms);
        }
        Packet::ServerListPing => {
            buf.put_u8(0xfe);
        }
        Packet::Kick { reason } => {
            buf.put_u8(0xff);
            write_string(buf, reason)?;
        }
        Packet::Unknown { id, data } => {
            buf.put_u8(*id);
            buf.put_slice(data);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(state: ConnectionState, direction: Direction, bytes: &[u8]) -> CodecResult<Option<Packet>> {
        let adapter = V17Adapter::new();
        let mut buf = BytesMut::from(bytes);
        adapter.try_decode(state, direction, &mut buf)
    }

    #[test]
    fn handshake_decodes_from_exact_bytes() {
        // 0x02, then the UCS-2 "Play" string from the codec's own known-good bytes.
        let bytes = [0x02, 0x00, 0x04, 0x00, 0x50, 0x00, 0x6C, 0x00, 0x61, 0x00, 0x79];
        let packet = decode(ConnectionState::Handshaking, Direction::Serverbound, &bytes)
            .unwrap()
            .unwrap();
        match packet {
            Packet::Handshake { username_or_token } => assert_eq!(username_or_token, "Play"),
            other => panic!("expected Handshake, got {other:?}"),
        }
    }

    #[test]
    fn keep_alive_round_trips_byte_for_byte() {
        let bytes = [0x00, 0x00, 0x00, 0x00, 0x2A];
        let packet = decode(ConnectionState::Play, Direction::Clientbound, &bytes)
            .unwrap()
            .unwrap();
        assert!(matches!(packet, Packet::KeepAlive { id: 42 }));

        let adapter = V17Adapter::new();
        let mut out = BytesMut::new();
        adapter
            .encode(ConnectionState::Play, &packet, &mut out)
            .unwrap();
        assert_eq!(out.to_vec(), bytes);
    }

    #[test]
    fn try_decode_reports_not_enough_data_without_consuming() {
        let adapter = V17Adapter::new();
        let mut buf = BytesMut::from(&[0x00, 0x00, 0x00][..]); // keep-alive id truncated
        let before = buf.len();
        let result = adapter
            .try_decode(ConnectionState::Play, Direction::Clientbound, &mut buf)
            .unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), before);
    }

    #[test]
    fn login_request_is_field_reinterpreted_by_direction() {
        let mut serverbound = BytesMut::new();
        write_i32(&mut serverbound, 17);
        write_string(&mut serverbound, "Notch").unwrap();
        let mut full = BytesMut::new();
        full.put_u8(0x01);
        full.extend_from_slice(&serverbound);
        let packet = V17Adapter::new()
            .try_decode(ConnectionState::LoggingIn, Direction::Serverbound, &mut full)
            .unwrap()
            .unwrap();
        match packet {
            Packet::LoginRequest {
                protocol_version_or_entity_id,
                username_or_level_type,
                ..
            } => {
                assert_eq!(protocol_version_or_entity_id, 17);
                assert_eq!(username_or_level_type, "Notch");
            }
            other => panic!("expected LoginRequest, got {other:?}"),
        }

        let mut clientbound = BytesMut::new();
        clientbound.put_u8(0x01);
        write_i32(&mut clientbound, 1001);
        write_string(&mut clientbound, "default").unwrap();
        write_i64(&mut clientbound, -7);
        write_i8(&mut clientbound, Dimension::Nether.id());
        write_u8(&mut clientbound, Difficulty::Hard.id());
        write_u8(&mut clientbound, 128);
        write_u8(&mut clientbound, 20);
        let packet = V17Adapter::new()
            .try_decode(ConnectionState::LoggingIn, Direction::Clientbound, &mut clientbound)
            .unwrap()
            .unwrap();
        match packet {
            Packet::LoginRequest {
                protocol_version_or_entity_id,
                map_seed,
                dimension,
                difficulty,
                world_height,
                max_players,
                ..
            } => {
                assert_eq!(protocol_version_or_entity_id, 1001);
                assert_eq!(map_seed, -7);
                assert_eq!(dimension, Dimension::Nether);
                assert_eq!(difficulty, Difficulty::Hard);
                assert_eq!(world_height, 128);
                assert_eq!(max_players, 20);
            }
            other => panic!("expected LoginRequest, got {other:?}"),
        }
    }

    #[test]
    fn chunk_map_round_trips_compressed_payload() {
        let packet = Packet::ChunkMap {
            x: 16,
            y: -64,
            z: -32,
            size_x: 15,
            size_y: 127,
            size_z: 15,
            compressed: vec![1, 2, 3, 4, 5, 6, 7, 8],
        };
        let mut buf = BytesMut::new();
        encode_one(&packet, &mut buf).unwrap();

        // Splitting the frame mid-payload must report "not enough data" rather than panic.
        let mut short = buf.clone();
        short.truncate(buf.len() - 1);
        let adapter = V17Adapter::new();
        assert!(adapter
            .try_decode(ConnectionState::Play, Direction::Clientbound, &mut short)
            .unwrap()
            .is_none());

        let decoded = adapter
            .try_decode(ConnectionState::Play, Direction::Clientbound, &mut buf)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, packet);
        assert!(buf.is_empty());
    }

    #[test]
    fn multi_block_change_packs_and_unpacks_coordinates() {
        let packet = Packet::MultiBlockChange {
            chunk_x: 3,
            chunk_z: -3,
            changes: vec![
                BlockChangeRecord {
                    rel_x: 15,
                    y: 255,
                    rel_z: 0,
                    block_id: 1,
                    metadata: 0,
                },
                BlockChangeRecord {
                    rel_x: 0,
                    y: 0,
                    rel_z: 15,
                    block_id: 7,
                    metadata: 3,
                },
            ],
        };
        let mut buf = BytesMut::new();
        encode_one(&packet, &mut buf).unwrap();
        let decoded = V17Adapter::new()
            .try_decode(ConnectionState::Play, Direction::Clientbound, &mut buf)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn entity_metadata_stream_is_tag_terminated() {
        let packet = Packet::EntityMetadata {
            eid: 99,
            entries: vec![
                MetadataEntry::Byte(0, -1),
                MetadataEntry::Short(1, 300),
                MetadataEntry::Int(2, -100_000),
                MetadataEntry::Float(3, 1.25),
            ],
        };
        let mut buf = BytesMut::new();
        encode_one(&packet, &mut buf).unwrap();
        assert_eq!(*buf.last().unwrap(), 0x7F);
        let decoded = V17Adapter::new()
            .try_decode(ConnectionState::Play, Direction::Clientbound, &mut buf)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, packet);
    }

    /// A named, equipped, sleeping mob exercises the three metadata kinds that
    /// `metadata_read` used to reject outright (string, item-stack, block-triple).
    #[test]
    fn entity_metadata_stream_round_trips_string_item_and_block_triple() {
        let packet = Packet::EntityMetadata {
            eid: 7,
            entries: vec![
                MetadataEntry::String(2, "Bessie".to_string()),
                MetadataEntry::ItemStack(5, Some(ItemStack::new(280, 1, 0))),
                MetadataEntry::ItemStack(6, None),
                MetadataEntry::BlockTriple(7, 10, 64, -20),
            ],
        };
        let mut buf = BytesMut::new();
        encode_one(&packet, &mut buf).unwrap();
        let decoded = V17Adapter::new()
            .try_decode(ConnectionState::Play, Direction::Clientbound, &mut buf)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn unknown_packet_id_is_fatal_not_a_resync() {
        let result = decode(ConnectionState::Play, Direction::Clientbound, &[0x71, 0x00]);
        assert!(matches!(result, Err(CodecError::WrongState { id: 0x71, .. })));
    }

    #[test]
    fn kick_round_trips() {
        let packet = Packet::Kick {
            reason: "connection lost".to_string(),
        };
        let mut buf = BytesMut::new();
        encode_one(&packet, &mut buf).unwrap();
        let decoded = V17Adapter::new()
            .try_decode(ConnectionState::Play, Direction::Clientbound, &mut buf)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, packet);
    }
}
