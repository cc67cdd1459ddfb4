use crate::adapter::ProtocolAdapter;
use crate::codec::CodecError;
use crate::packets::Packet;
use crate::state::{ConnectionState, Direction};
use bytes::BytesMut;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::trace;

/// A framed protocol 17 connection. There is no outer length prefix and no
/// compression or encryption at this layer — both postdate this dialect — so
/// framing is entirely schema-driven: the adapter knows, from the packet id alone,
/// how many more bytes (if any) follow the fixed header.
pub struct Connection {
    stream: Option<TcpStream>,
    read_buf: BytesMut,
    adapter: Arc<dyn ProtocolAdapter>,
    /// The direction of packets this side *sends*. Received packets travel the
    /// opposite direction.
    local_direction: Direction,
}

impl Connection {
    pub fn new(stream: TcpStream, adapter: Arc<dyn ProtocolAdapter>, local_direction: Direction) -> Self {
        Self {
            stream: Some(stream),
            read_buf: BytesMut::with_capacity(4096),
            adapter,
            local_direction,
        }
    }

    fn peer_direction(&self) -> Direction {
        match self.local_direction {
            Direction::Serverbound => Direction::Clientbound,
            Direction::Clientbound => Direction::Serverbound,
        }
    }

    /// Read and decode the next packet, blocking on more I/O as needed. A decode
    /// error other than "not enough data yet" is connection-fatal.
    pub async fn read_packet(&mut self, state: ConnectionState) -> anyhow::Result<Packet> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("connection has been split"))?;
        read_packet_loop(stream, &mut self.read_buf, &*self.adapter, state, self.peer_direction()).await
    }

    pub async fn write_packet(&mut self, state: ConnectionState, packet: &Packet) -> anyhow::Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("connection has been split"))?;
        write_packet_out(stream, &*self.adapter, state, packet).await
    }

    pub fn peer_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.stream
            .as_ref()
            .map(|s| s.peer_addr())
            .unwrap_or(Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "dummy connection",
            )))
    }

    pub fn into_split(mut self) -> (ConnectionReader, ConnectionWriter) {
        let stream = self.stream.take().expect("cannot split a dummy connection");
        let (read_half, write_half) = stream.into_split();
        (
            ConnectionReader {
                stream: read_half,
                read_buf: self.read_buf,
                adapter: self.adapter.clone(),
                peer_direction: self.peer_direction(),
            },
            ConnectionWriter {
                stream: write_half,
                adapter: self.adapter,
                local_direction: self.local_direction,
            },
        )
    }
}

pub struct ConnectionReader {
    stream: OwnedReadHalf,
    read_buf: BytesMut,
    adapter: Arc<dyn ProtocolAdapter>,
    peer_direction: Direction,
}

impl ConnectionReader {
    pub async fn read_packet(&mut self, state: ConnectionState) -> anyhow::Result<Packet> {
        read_packet_loop(
            &mut self.stream,
            &mut self.read_buf,
            &*self.adapter,
            state,
            self.peer_direction,
        )
        .await
    }
}

pub struct ConnectionWriter {
    stream: OwnedWriteHalf,
    adapter: Arc<dyn ProtocolAdapter>,
    local_direction: Direction,
}

impl ConnectionWriter {
    pub async fn write_packet(&mut self, state: ConnectionState, packet: &Packet) -> anyhow::Result<()> {
        let _ = self.local_direction;
        write_packet_out(&mut self.stream, &*self.adapter, state, packet).await
    }
}

async fn read_packet_loop(
    stream: &mut (impl AsyncReadExt + Unpin),
    read_buf: &mut BytesMut,
    adapter: &dyn ProtocolAdapter,
    state: ConnectionState,
    direction: Direction,
) -> anyhow::Result<Packet> {
    loop {
        match adapter.try_decode(state, direction, read_buf) {
            Ok(Some(packet)) => {
                trace!(?state, ?direction, "decoded packet");
                return Ok(packet);
            }
            Ok(None) => {}
            Err(CodecError::NotEnoughData { .. }) => {}
            Err(other) => return Err(other.into()),
        }
        let mut tmp = [0u8; 4096];
        let n = stream.read(&mut tmp).await?;
        if n == 0 {
            return Err(anyhow::anyhow!("connection closed"));
        }
        read_buf.extend_from_slice(&tmp[..n]);
    }
}

async fn write_packet_out(
    stream: &mut (impl AsyncWriteExt + Unpin),
    adapter: &dyn ProtocolAdapter,
    state: ConnectionState,
    packet: &Packet,
) -> anyhow::Result<()> {
    let mut buf = BytesMut::new();
    adapter.encode(state, packet, &mut buf)?;
    stream.write_all(&buf).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Buf;

    /// A single `KeepAlive{id: i32}` packet with a one-byte id and no framing beyond
    /// the scalar itself, enough to exercise the "read more, then decode" loop without
    /// needing the full v17 catalog in this crate.
    struct StubAdapter;

    impl ProtocolAdapter for StubAdapter {
        fn protocol_version(&self) -> i32 {
            0
        }

        fn try_decode(
            &self,
            _state: ConnectionState,
            _direction: Direction,
            buf: &mut BytesMut,
        ) -> crate::codec::CodecResult<Option<Packet>> {
            if buf.remaining() < 5 {
                return Ok(None);
            }
            let tag = buf[0];
            if tag != 0x00 {
                return Err(CodecError::UnknownPacketId(tag));
            }
            let id = i32::from_be_bytes(buf[1..5].try_into().unwrap());
            buf.advance(5);
            Ok(Some(Packet::KeepAlive { id }))
        }

        fn encode(&self, _state: ConnectionState, packet: &Packet, buf: &mut BytesMut) -> crate::codec::CodecResult<()> {
            match packet {
                Packet::KeepAlive { id } => {
                    buf.extend_from_slice(&[0x00]);
                    buf.extend_from_slice(&id.to_be_bytes());
                    Ok(())
                }
                _ => Err(CodecError::UnknownPacketId(0xff)),
            }
        }
    }

    #[tokio::test]
    async fn read_packet_loop_waits_for_a_full_frame_split_across_writes() {
        let (mut client, server) = tokio::io::duplex(64);
        let adapter = StubAdapter;
        let mut read_buf = BytesMut::new();

        let reader = tokio::spawn(async move {
            let mut server = server;
            read_packet_loop(
                &mut server,
                &mut read_buf,
                &adapter,
                ConnectionState::Play,
                Direction::Clientbound,
            )
            .await
        });

        // Write the frame in two pieces to force at least one "not enough data" spin.
        client.write_all(&[0x00, 0x00]).await.unwrap();
        tokio::task::yield_now().await;
        client.write_all(&[0x00, 0x00, 0x2A]).await.unwrap();

        let packet = reader.await.unwrap().unwrap();
        assert!(matches!(packet, Packet::KeepAlive { id: 42 }));
    }

    #[tokio::test]
    async fn write_packet_out_sends_exactly_the_encoded_bytes() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let adapter = StubAdapter;
        write_packet_out(
            &mut client,
            &adapter,
            ConnectionState::Play,
            &Packet::KeepAlive { id: 7 },
        )
        .await
        .unwrap();
        drop(client);

        let mut received = Vec::new();
        server.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, vec![0x00, 0x00, 0x00, 0x00, 0x07]);
    }

    #[tokio::test]
    async fn connection_split_round_trips_a_packet_over_loopback() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client_stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let (server_stream, _) = listener.accept().await.unwrap();

        let adapter: Arc<dyn ProtocolAdapter> = Arc::new(StubAdapter);
        let conn_a = Connection::new(client_stream, adapter.clone(), Direction::Clientbound);
        let conn_b = Connection::new(server_stream, adapter, Direction::Serverbound);

        let (_reader_a, mut writer_a) = conn_a.into_split();
        let (mut reader_b, _writer_b) = conn_b.into_split();

        writer_a
            .write_packet(ConnectionState::Play, &Packet::KeepAlive { id: 5 })
            .await
            .unwrap();
        let received = reader_b.read_packet(ConnectionState::Play).await.unwrap();
        assert!(matches!(received, Packet::KeepAlive { id: 5 }));
    }
}
