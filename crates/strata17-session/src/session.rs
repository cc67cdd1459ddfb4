use crate::entities::EntityTable;
use crate::tentative::TentativeList;
use bytes::BytesMut;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use strata17_protocol_core::codec::CodecError;
use strata17_protocol_core::packets::{BlockChangeRecord, Packet};
use strata17_protocol_core::state::{ConnectionState, Direction};
use strata17_protocol_core::ProtocolAdapter;
use strata17_protocol_v17::V17Adapter;
use strata17_types::{BlockPos, ChunkPos, Difficulty, Dimension, Entity, EntityKind, GameMode};
use strata17_world::Chunk;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

const IN_WORLD_BUDGET: Duration = Duration::from_millis(25);
const LOADING_BUDGET: Duration = Duration::from_millis(150);
const KEEP_ALIVE_TIMEOUT: Duration = Duration::from_secs(30);
const OUTBOUND_POS_LOOK_PERIOD: Duration = Duration::from_millis(50);
/// Chunk columns kept resident client-side; the oldest is evicted on overflow.
const CHUNK_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
}

/// The connection state machine driving a single client session. `step()` is
/// called once per tick and advances at most one phase edge; nothing in this type
/// blocks the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    Resolving,
    Connecting { addr: SocketAddr },
    Active { in_world: bool },
    Terminated { reason: String },
    Failed { reason: String },
}

pub struct Session {
    pub phase: SessionPhase,
    config: SessionConfig,
    resolve_rx: Option<oneshot::Receiver<std::io::Result<SocketAddr>>>,
    socket: Option<TcpStream>,
    adapter: V17Adapter,
    read_buf: BytesMut,

    pub player_eid: i32,
    pub dimension: Dimension,
    pub difficulty: Difficulty,
    pub game_mode: GameMode,
    pub world_height: i16,
    pub world_time: i64,
    pub position: (f64, f64, f64, f64),
    pub yaw: f32,
    pub pitch: f32,

    pub entities: EntityTable,
    pub tentative: TentativeList,
    chunks: HashMap<ChunkPos, Chunk>,
    chunk_order: Vec<ChunkPos>,

    last_activity: Instant,
    last_keep_alive_seen: Instant,
    last_outbound_pos_look: Instant,
    outbound: Vec<Packet>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let now = Instant::now();
        let (tx, rx) = oneshot::channel();
        let host = config.host.clone();
        let port = config.port;
        tokio::spawn(async move {
            let result = tokio::net::lookup_host((host.as_str(), port))
                .await
                .and_then(|mut addrs| {
                    addrs.next().ok_or_else(|| {
                        std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved")
                    })
                });
            let _ = tx.send(result);
        });

        Self {
            phase: SessionPhase::Resolving,
            config,
            resolve_rx: Some(rx),
            socket: None,
            adapter: V17Adapter::new(),
            read_buf: BytesMut::with_capacity(8192),
            player_eid: 0,
            dimension: Dimension::Overworld,
            difficulty: Difficulty::Peaceful,
            game_mode: GameMode::Survival,
            world_height: 128,
            world_time: 0,
            position: (0.0, 0.0, 0.0, 0.0),
            yaw: 0.0,
            pitch: 0.0,
            entities: EntityTable::new(),
            tentative: TentativeList::new(),
            chunks: HashMap::new(),
            chunk_order: Vec::new(),
            last_activity: now,
            last_keep_alive_seen: now,
            last_outbound_pos_look: now,
            outbound: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Terminated { .. } | SessionPhase::Failed { .. }
        )
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    /// Advances the session by at most one phase edge and, while active, drains
    /// up to one tick's worth of inbound packets. Never blocks.
    pub fn step(&mut self) -> anyhow::Result<()> {
        match self.phase.clone() {
            SessionPhase::Resolving => self.poll_resolve(),
            SessionPhase::Connecting { addr } => self.poll_connect(addr),
            SessionPhase::Active { in_world } => self.step_active(in_world),
            SessionPhase::Terminated { .. } | SessionPhase::Failed { .. } => Ok(()),
        }
    }

    fn poll_resolve(&mut self) -> anyhow::Result<()> {
        let Some(rx) = self.resolve_rx.as_mut() else {
            return Ok(());
        };
        match rx.try_recv() {
            Ok(Ok(addr)) => {
                info!(%addr, "resolved");
                self.resolve_rx = None;
                self.phase = SessionPhase::Connecting { addr };
                self.connect(addr)?;
            }
            Ok(Err(e)) => {
                self.phase = SessionPhase::Failed {
                    reason: format!("dns resolution failed: {e}"),
                };
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                self.phase = SessionPhase::Failed {
                    reason: "resolver task dropped".into(),
                };
            }
        }
        Ok(())
    }

    fn connect(&mut self, addr: SocketAddr) -> anyhow::Result<()> {
        let std_stream = std::net::TcpStream::connect_timeout(&addr, Duration::from_secs(5))?;
        std_stream.set_nonblocking(true)?;
        self.socket = Some(TcpStream::from_std(std_stream)?);
        Ok(())
    }

    fn poll_connect(&mut self, _addr: SocketAddr) -> anyhow::Result<()> {
        // `connect()` above is synchronous-timeout today; once connected the socket
        // is immediately usable, so the edge fires on the next step.
        if self.socket.is_some() {
            info!("connected, sending handshake");
            self.send_now(&Packet::Handshake {
                username_or_token: self.config.username.clone(),
            })?;
            self.phase = SessionPhase::Active { in_world: false };
            self.last_activity = Instant::now();
            self.last_keep_alive_seen = Instant::now();
        }
        Ok(())
    }

    fn step_active(&mut self, in_world: bool) -> anyhow::Result<()> {
        self.pump_socket_reads()?;

        let budget = if in_world { IN_WORLD_BUDGET } else { LOADING_BUDGET };
        let started = Instant::now();
        let mut current_state = ConnectionState::LoggingIn;
        if in_world {
            current_state = ConnectionState::Play;
        }

        loop {
            if started.elapsed() >= budget {
                break;
            }
            match self
                .adapter
                .try_decode(current_state, Direction::Clientbound, &mut self.read_buf)
            {
                Ok(Some(packet)) => {
                    self.last_activity = Instant::now();
                    let became_in_world = self.dispatch(packet)?;
                    if became_in_world {
                        current_state = ConnectionState::Play;
                    }
                }
                Ok(None) => break,
                Err(CodecError::NotEnoughData { .. }) => break,
                Err(e) => {
                    self.phase = SessionPhase::Terminated {
                        reason: format!("protocol error: {e}"),
                    };
                    return Ok(());
                }
            }
        }

        let now = Instant::now();
        if now.duration_since(self.last_keep_alive_seen) > KEEP_ALIVE_TIMEOUT {
            warn!("no keep-alive from server within timeout");
        }

        for expired in self.tentative.drain_expired(now) {
            trace!(pos = ?expired.pos, "tentative edit expired, rolling back");
            let chunk_pos = expired.pos.chunk_pos();
            let chunk = self.ensure_chunk(chunk_pos);
            let (lx, lz) = ((expired.pos.x & 15) as usize, (expired.pos.z & 15) as usize);
            chunk.set_block(lx, expired.pos.y as usize, lz, expired.prior_block);
            chunk.set_metadata(lx, expired.pos.y as usize, lz, expired.prior_metadata);
        }

        let currently_in_world = matches!(self.phase, SessionPhase::Active { in_world: true });
        if currently_in_world && now.duration_since(self.last_outbound_pos_look) >= OUTBOUND_POS_LOOK_PERIOD {
            let (x, y, stance, z) = self.position;
            self.send_now(&Packet::PlayerPositionLook {
                x,
                y,
                stance,
                z,
                yaw: self.yaw,
                pitch: self.pitch,
                on_ground: true,
            })?;
            self.last_outbound_pos_look = now;
        }

        self.flush_outbound()?;
        Ok(())
    }

    fn pump_socket_reads(&mut self) -> anyhow::Result<()> {
        let Some(socket) = self.socket.as_ref() else {
            return Ok(());
        };
        let mut tmp = [0u8; 4096];
        loop {
            match socket.try_read(&mut tmp) {
                Ok(0) => {
                    self.phase = SessionPhase::Terminated {
                        reason: "connection closed by peer".into(),
                    };
                    return Ok(());
                }
                Ok(n) => self.read_buf.extend_from_slice(&tmp[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn send_now(&mut self, packet: &Packet) -> anyhow::Result<()> {
        self.outbound.push(packet.clone());
        Ok(())
    }

    fn flush_outbound(&mut self) -> anyhow::Result<()> {
        let Some(socket) = self.socket.as_ref() else {
            return Ok(());
        };
        let state = if matches!(self.phase, SessionPhase::Active { in_world: true }) {
            ConnectionState::Play
        } else {
            ConnectionState::LoggingIn
        };
        for packet in self.outbound.drain(..) {
            let mut buf = BytesMut::new();
            self.adapter.encode(state, &packet, &mut buf)?;
            let mut offset = 0;
            while offset < buf.len() {
                match socket.try_write(&buf[offset..]) {
                    Ok(n) => offset += n,
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }

    /// Applies one decoded packet to local state. Returns `true` if this packet
    /// transitions the session into in-world play.
    fn dispatch(&mut self, packet: Packet) -> anyhow::Result<bool> {
        let mut became_in_world = false;
        match packet {
            Packet::KeepAlive { id } => {
                self.last_keep_alive_seen = Instant::now();
                self.send_now(&Packet::KeepAlive { id })?;
            }
            Packet::Handshake { username_or_token } => {
                self.send_now(&Packet::LoginRequest {
                    protocol_version_or_entity_id: strata17_protocol_v17::PROTOCOL_VERSION,
                    username_or_level_type: self.config.username.clone(),
                    map_seed: 0,
                    dimension: Dimension::Overworld,
                    difficulty: Difficulty::Peaceful,
                    world_height: 0,
                    max_players: 0,
                })?;
                debug!(token = %username_or_token, "server accepted handshake");
            }
            Packet::LoginRequest {
                protocol_version_or_entity_id,
                dimension,
                difficulty,
                world_height,
                max_players,
                ..
            } => {
                self.player_eid = protocol_version_or_entity_id;
                self.dimension = dimension;
                self.difficulty = difficulty;
                self.world_height = world_height as i16;
                let _ = max_players;
                info!(eid = self.player_eid, ?dimension, "logged in");
            }
            Packet::NewState { reason, game_mode } => {
                if let Some(mode) = game_mode {
                    self.game_mode = mode;
                }
                trace!(reason, "new-state");
            }
            Packet::TimeUpdate { ticks } => {
                self.world_time = ticks;
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
                self.position = (x, y, stance, z);
                self.yaw = yaw;
                self.pitch = pitch;
                self.send_now(&Packet::PlayerPositionLook {
                    x,
                    y,
                    stance,
                    z,
                    yaw,
                    pitch,
                    on_ground,
                })?;
                if !matches!(self.phase, SessionPhase::Active { in_world: true }) {
                    self.phase = SessionPhase::Active { in_world: true };
                    became_in_world = true;
                }
            }
            Packet::ChunkCache {
                chunk_x,
                chunk_z,
                mode,
            } => {
                let pos = ChunkPos::new(chunk_x, chunk_z);
                if !mode {
                    self.chunks.remove(&pos);
                    self.chunk_order.retain(|p| *p != pos);
                } else {
                    self.ensure_chunk(pos);
                }
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
                let chunk_pos = BlockPos::new(x, 0, z).chunk_pos();
                let (sx, sy, sz) = (size_x as usize + 1, size_y as usize + 1, size_z as usize + 1);
                let chunk = self.ensure_chunk(chunk_pos);
                chunk.splat_cuboid((x & 15) as usize, y as usize, (z & 15) as usize, sx, sy, sz, &compressed)?;
                self.fulfill_box(x, y as i32, z, sx as i32, sy as i32, sz as i32);
            }
            Packet::BlockChange {
                x,
                y,
                z,
                block_id,
                metadata,
            } => {
                let chunk_pos = BlockPos::new(x, y, z).chunk_pos();
                let chunk = self.ensure_chunk(chunk_pos);
                chunk.set_block((x & 15) as usize, y as usize, (z & 15) as usize, block_id);
                chunk.set_metadata((x & 15) as usize, y as usize, (z & 15) as usize, metadata);
                self.tentative.fulfill(BlockPos::new(x, y, z));
            }
            Packet::MultiBlockChange {
                chunk_x,
                chunk_z,
                changes,
            } => {
                self.apply_multi_block_change(chunk_x, chunk_z, &changes);
            }
            Packet::SpawnNamedEntity { eid, x, y, z, .. } => {
                self.entities.insert(Entity::new(
                    eid,
                    EntityKind::Player,
                    x as f64 / 32.0,
                    y as f64 / 32.0,
                    z as f64 / 32.0,
                ));
            }
            Packet::SpawnPickupEntity { eid, x, y, z, .. } => {
                self.entities.insert(Entity::new(
                    eid,
                    EntityKind::Pickup,
                    x as f64 / 32.0,
                    y as f64 / 32.0,
                    z as f64 / 32.0,
                ));
            }
            Packet::SpawnMob { eid, x, y, z, .. } => {
                self.entities.insert(Entity::new(
                    eid,
                    EntityKind::Mob,
                    x as f64 / 32.0,
                    y as f64 / 32.0,
                    z as f64 / 32.0,
                ));
            }
            Packet::SpawnPainting { eid, x, y, z, .. } => {
                self.entities.insert(Entity::new(
                    eid,
                    EntityKind::Painting,
                    x as f64,
                    y as f64,
                    z as f64,
                ));
            }
            Packet::SpawnExperienceOrb { eid, x, y, z, .. } => {
                self.entities.insert(Entity::new(
                    eid,
                    EntityKind::ExperienceOrb,
                    x as f64 / 32.0,
                    y as f64 / 32.0,
                    z as f64 / 32.0,
                ));
            }
            Packet::AddObject { eid, x, y, z, .. } => {
                self.entities.insert(Entity::new(
                    eid,
                    EntityKind::Object,
                    x as f64 / 32.0,
                    y as f64 / 32.0,
                    z as f64 / 32.0,
                ));
            }
            Packet::EntityVelocity { eid, vx, vy, vz } => {
                if let Some(e) = self.entities.get_mut(eid) {
                    e.vx = vx;
                    e.vy = vy;
                    e.vz = vz;
                }
            }
            Packet::EntityRelativeMove { eid, dx, dy, dz } => {
                if let Some(e) = self.entities.get_mut(eid) {
                    e.apply_rel_move(dx, dy, dz);
                }
            }
            Packet::EntityLook { eid, yaw, pitch } => {
                if let Some(e) = self.entities.get_mut(eid) {
                    e.yaw = (yaw as f32) * 360.0 / 256.0;
                    e.pitch = (pitch as f32) * 360.0 / 256.0;
                }
            }
            Packet::EntityLookRelativeMove {
                eid,
                dx,
                dy,
                dz,
                yaw,
                pitch,
            } => {
                if let Some(e) = self.entities.get_mut(eid) {
                    e.apply_rel_move(dx, dy, dz);
                    e.yaw = (yaw as f32) * 360.0 / 256.0;
                    e.pitch = (pitch as f32) * 360.0 / 256.0;
                }
            }
            Packet::EntityTeleport {
                eid,
                x,
                y,
                z,
                yaw,
                pitch,
            } => {
                if let Some(e) = self.entities.get_mut(eid) {
                    e.x = x as f64 / 32.0;
                    e.y = y as f64 / 32.0;
                    e.z = z as f64 / 32.0;
                    e.yaw = (yaw as f32) * 360.0 / 256.0;
                    e.pitch = (pitch as f32) * 360.0 / 256.0;
                }
            }
            Packet::DestroyEntity { eid } => {
                self.entities.remove(eid);
            }
            Packet::EntityMetadata { eid: _, entries: _ } => {
                // No UI surface consumes metadata today; decoding it already kept
                // the codec in sync, nothing further to apply.
            }
            Packet::Kick { reason } => {
                self.phase = SessionPhase::Terminated { reason };
            }
            _ => {}
        }
        Ok(became_in_world)
    }

    fn ensure_chunk(&mut self, pos: ChunkPos) -> &mut Chunk {
        if !self.chunks.contains_key(&pos) {
            if self.chunk_order.len() >= CHUNK_CACHE_CAPACITY {
                if let Some(oldest) = self.chunk_order.first().copied() {
                    self.chunks.remove(&oldest);
                    self.chunk_order.remove(0);
                }
            }
            self.chunks.insert(pos, Chunk::default());
            self.chunk_order.push(pos);
        }
        self.chunks.get_mut(&pos).expect("just inserted")
    }

    fn fulfill_box(&mut self, x: i32, y: i32, z: i32, sx: i32, sy: i32, sz: i32) {
        let covered: Vec<BlockPos> = self
            .tentative
            .positions()
            .into_iter()
            .filter(|pos| {
                pos.x >= x
                    && pos.x < x + sx
                    && pos.y as i32 >= y
                    && (pos.y as i32) < y + sy
                    && pos.z >= z
                    && pos.z < z + sz
            })
            .collect();
        for pos in covered {
            self.tentative.fulfill(pos);
        }
    }

    fn apply_multi_block_change(&mut self, chunk_x: i32, chunk_z: i32, changes: &[BlockChangeRecord]) {
        let pos = ChunkPos::new(chunk_x, chunk_z);
        let chunk = self.ensure_chunk(pos);
        for c in changes {
            let lx = c.rel_x as usize;
            let lz = c.rel_z as usize;
            chunk.set_block(lx, c.y as usize, lz, c.block_id);
            chunk.set_metadata(lx, c.y as usize, lz, c.metadata);
            let world_x = chunk_x * 16 + c.rel_x as i32;
            let world_z = chunk_z * 16 + c.rel_z as i32;
            self.tentative
                .fulfill(BlockPos::new(world_x, c.y as i8, world_z));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> Session {
        Session::new(SessionConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            username: "Notch".to_string(),
        })
    }

    #[tokio::test]
    async fn keep_alive_dispatch_echoes_id_verbatim() {
        let mut session = test_session();
        session.dispatch(Packet::KeepAlive { id: 42 }).unwrap();
        assert_eq!(session.outbound, vec![Packet::KeepAlive { id: 42 }]);
    }

    #[tokio::test]
    async fn handshake_dispatch_replies_with_login_request() {
        let mut session = test_session();
        session
            .dispatch(Packet::Handshake {
                username_or_token: "-".to_string(),
            })
            .unwrap();
        match session.outbound.last() {
            Some(Packet::LoginRequest {
                username_or_level_type,
                protocol_version_or_entity_id,
                ..
            }) => {
                assert_eq!(username_or_level_type, "Notch");
                assert_eq!(*protocol_version_or_entity_id, strata17_protocol_v17::PROTOCOL_VERSION);
            }
            other => panic!("expected LoginRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_position_look_flips_session_into_world() {
        let mut session = test_session();
        session.phase = SessionPhase::Active { in_world: false };
        let became = session
            .dispatch(Packet::PlayerPositionLook {
                x: 1.0,
                y: 2.0,
                stance: 3.0,
                z: 4.0,
                yaw: 10.0,
                pitch: 20.0,
                on_ground: true,
            })
            .unwrap();
        assert!(became);
        assert_eq!(session.phase, SessionPhase::Active { in_world: true });
        assert_eq!(session.position, (1.0, 2.0, 3.0, 4.0));
    }

    #[tokio::test]
    async fn block_change_writes_through_to_the_chunk_and_fulfills_tentative() {
        let mut session = test_session();
        let pos = BlockPos::new(5, 10, 5);
        session.tentative.record(pos, 0, 0, Instant::now());
        session
            .dispatch(Packet::BlockChange {
                x: 5,
                y: 10,
                z: 5,
                block_id: 3,
                metadata: 1,
            })
            .unwrap();
        let chunk = session.chunk(pos.chunk_pos()).unwrap();
        assert_eq!(chunk.get_block(5, 10, 5), 3);
        assert_eq!(chunk.get_metadata(5, 10, 5), 1);
        assert!(session.tentative.is_empty());
    }

    #[tokio::test]
    async fn destroy_entity_removes_it_from_the_table() {
        let mut session = test_session();
        session.entities.insert(Entity::new(7, EntityKind::Mob, 1.0, 2.0, 3.0));
        session.dispatch(Packet::DestroyEntity { eid: 7 }).unwrap();
        assert!(session.entities.get(7).is_none());
    }

    #[tokio::test]
    async fn expired_tentative_block_is_rolled_back_on_step() {
        let mut session = test_session();
        let pos = BlockPos::new(1, 1, 1);
        session
            .tentative
            .record(pos, 7, 2, Instant::now() - Duration::from_secs(10));
        session.phase = SessionPhase::Active { in_world: true };
        session.step().unwrap();
        let chunk = session.chunk(pos.chunk_pos()).unwrap();
        assert_eq!(chunk.get_block(1, 1, 1), 7);
        assert_eq!(chunk.get_metadata(1, 1, 1), 2);
        assert!(session.tentative.is_empty());
    }

    #[tokio::test]
    async fn chunk_cache_evicts_the_oldest_entry_past_capacity() {
        let mut session = test_session();
        for i in 0..(CHUNK_CACHE_CAPACITY as i32 + 1) {
            session.ensure_chunk(ChunkPos::new(i, 0));
        }
        assert_eq!(session.chunks.len(), CHUNK_CACHE_CAPACITY);
        assert!(session.chunk(ChunkPos::new(0, 0)).is_none());
        assert!(session
            .chunk(ChunkPos::new(CHUNK_CACHE_CAPACITY as i32, 0))
            .is_some());
    }

    #[tokio::test]
    async fn resolver_failure_fails_the_session() {
        let mut session = test_session();
        let (tx, rx) = oneshot::channel();
        session.resolve_rx = Some(rx);
        tx.send(Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no addresses resolved",
        )))
        .ok();
        session.poll_resolve().unwrap();
        assert!(matches!(session.phase, SessionPhase::Failed { .. }));
    }
}
