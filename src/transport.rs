use std::net::SocketAddr;
use std::sync::Mutex;

use dnsstub_proto::buffer::PacketBuffer;
use dnsstub_proto::message::{write_query, Header, Question};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

use crate::cancel::Cancellation;
use crate::error::ResolveError;

/// Rent/return pool of the two buffer shapes the transport needs (spec
/// section 4.3/9). A buffer is held by exactly one in-flight exchange at a
/// time; [`RentedBuffer::drop`] always returns it, on every exit path
/// (success, protocol error, cancellation, or a dropped future).
pub struct BufferPool {
    udp: Mutex<Vec<PacketBuffer>>,
    tcp: Mutex<Vec<PacketBuffer>>,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool {
    pub fn new() -> Self {
        Self {
            udp: Mutex::new(Vec::new()),
            tcp: Mutex::new(Vec::new()),
        }
    }

    pub fn rent_udp(&self) -> RentedBuffer<'_> {
        let buf = self
            .udp
            .lock()
            .expect("buffer pool mutex poisoned")
            .pop()
            .unwrap_or_else(PacketBuffer::udp_sized);
        RentedBuffer {
            pool: self,
            kind: Kind::Udp,
            inner: Some(buf),
        }
    }

    pub fn rent_tcp(&self) -> RentedBuffer<'_> {
        let buf = self
            .tcp
            .lock()
            .expect("buffer pool mutex poisoned")
            .pop()
            .unwrap_or_else(PacketBuffer::tcp_sized);
        RentedBuffer {
            pool: self,
            kind: Kind::Tcp,
            inner: Some(buf),
        }
    }

    fn give_back(&self, kind: Kind, mut buf: PacketBuffer) {
        buf.pos = 0;
        let pool = match kind {
            Kind::Udp => &self.udp,
            Kind::Tcp => &self.tcp,
        };
        pool.lock().expect("buffer pool mutex poisoned").push(buf);
    }
}

#[derive(Clone, Copy)]
enum Kind {
    Udp,
    Tcp,
}

/// A buffer on loan from a [`BufferPool`]. Returned automatically on drop.
pub struct RentedBuffer<'a> {
    pool: &'a BufferPool,
    kind: Kind,
    inner: Option<PacketBuffer>,
}

impl std::ops::Deref for RentedBuffer<'_> {
    type Target = PacketBuffer;

    fn deref(&self) -> &PacketBuffer {
        self.inner.as_ref().expect("buffer taken before drop")
    }
}

impl std::ops::DerefMut for RentedBuffer<'_> {
    fn deref_mut(&mut self) -> &mut PacketBuffer {
        self.inner.as_mut().expect("buffer taken before drop")
    }
}

impl Drop for RentedBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.inner.take() {
            self.pool.give_back(self.kind, buf);
        }
    }
}

/// Response validated enough to hand the reader to the query engine: header
/// parsed, transaction id matched, `is-response` set (spec section 4.3 step
/// 4). The buffer is positioned right after the 12-byte header.
pub struct ExchangeResult {
    pub buf: PacketBuffer,
    pub header: Header,
}

/// UDP exchange (spec section 4.3). Builds the query into the rented
/// buffer, sends it to `server`, and loops on `recv` until a frame with a
/// matching transaction id and `is-response` set arrives — a late reply
/// from a previous query on a reused port, or stray traffic, must not
/// satisfy this call.
pub async fn udp_exchange(
    mut buf: RentedBuffer<'_>,
    server: SocketAddr,
    id: u16,
    question: &Question,
    cancellation: &Cancellation,
) -> Result<ExchangeResult, ResolveError> {
    write_query(&mut buf, id, true, question)?;
    let query_len = buf.pos();

    let local_addr: SocketAddr = if server.is_ipv6() {
        "[::]:0".parse().unwrap()
    } else {
        "0.0.0.0:0".parse().unwrap()
    };

    let socket = race(UdpSocket::bind(local_addr), cancellation).await?;
    race(socket.connect(server), cancellation).await?;
    race(socket.send(&buf.buf[..query_len]), cancellation).await?;

    loop {
        let n = race(socket.recv(&mut buf.buf), cancellation).await?;
        if n < 12 {
            continue;
        }
        let mut cursor = PacketBuffer::from_bytes(buf.buf[..n].to_vec());
        let header = match Header::read(&mut cursor) {
            Ok(header) => header,
            Err(_) => continue,
        };
        if header.id != id || !header.flags.is_response {
            continue;
        }
        cursor.pos = 12;
        return Ok(ExchangeResult { buf: cursor, header });
    }
}

/// TCP exchange (spec section 4.3). The query is built starting at offset 2
/// so the rented buffer can carry the 2-byte length prefix without a second
/// allocation; the buffer grows in place if the server's announced length
/// exceeds it.
pub async fn tcp_exchange(
    mut buf: RentedBuffer<'_>,
    server: SocketAddr,
    id: u16,
    question: &Question,
    cancellation: &Cancellation,
) -> Result<ExchangeResult, ResolveError> {
    buf.pos = 2;
    write_query(&mut buf, id, true, question)?;
    let message_len = buf.pos() - 2;
    buf.set_u16(0, message_len as u16)?;
    let total_len = message_len + 2;

    let mut stream = race(TcpStream::connect(server), cancellation).await?;
    race(stream.write_all(&buf.buf[..total_len]), cancellation).await?;

    let mut have = 0usize;
    loop {
        if have >= 2 {
            let expected =
                u16::from_be_bytes([buf.buf[0], buf.buf[1]]) as usize + 2;
            if buf.len() < expected {
                buf.grow_to(expected);
            }
            if have >= expected {
                let mut cursor = PacketBuffer::from_bytes(buf.buf[2..expected].to_vec());
                let header = Header::read(&mut cursor).map_err(ResolveError::from)?;
                if header.id != id || !header.flags.is_response {
                    return Err(ResolveError::Protocol(
                        "tcp response transaction id or QR bit mismatch".into(),
                    ));
                }
                return Ok(ExchangeResult { buf: cursor, header });
            }
        }
        let n = race(stream.read(&mut buf.buf[have..]), cancellation).await?;
        if n == 0 {
            return Err(ResolveError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before the announced message length was read",
            )));
        }
        have += n;
    }
}

async fn race<T, E>(
    future: impl std::future::Future<Output = Result<T, E>>,
    cancellation: &Cancellation,
) -> Result<T, ResolveError>
where
    ResolveError: From<E>,
{
    tokio::select! {
        result = future => result.map_err(ResolveError::from),
        cause = cancellation.cancelled() => Err(cause.into()),
    }
}
