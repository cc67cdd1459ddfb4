use crate::codec::CodecResult;
use crate::packets::Packet;
use crate::state::{ConnectionState, Direction};
use bytes::BytesMut;

/// Trait for version-specific protocol adapters. The rest of this crate is
/// version-agnostic; only one implementation exists today (protocol 17) but the
/// split keeps the framing/session layers from needing to know that.
pub trait ProtocolAdapter: Send + Sync {
    /// The protocol version number this adapter handles.
    fn protocol_version(&self) -> i32;

    /// Attempt to decode a single packet from the front of `buf`. Returns
    /// `Ok(None)` without consuming anything if `buf` does not yet hold a full
    /// packet. An id this adapter does not recognize for `state`/`direction` is a
    /// framing error: there is no outer length to skip past and resynchronize on.
    fn try_decode(
        &self,
        state: ConnectionState,
        direction: Direction,
        buf: &mut BytesMut,
    ) -> CodecResult<Option<Packet>>;

    /// Encode a packet into wire bytes, appended to `buf`.
    fn encode(&self, state: ConnectionState, packet: &Packet, buf: &mut BytesMut) -> CodecResult<()>;
}
