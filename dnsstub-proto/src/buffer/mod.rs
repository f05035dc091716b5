pub mod reader;
pub mod writer;

pub use reader::ReaderError;
pub use writer::WriterError;

/// Maximum textual length of a decoded name (RFC 1035 section 3.1).
pub const MAX_NAME_LEN: usize = 253;
/// Maximum length of a single label.
pub const MAX_LABEL_LEN: usize = 63;

/// A cursor over a DNS message buffer, shared by the reader and the writer.
///
/// Queries are small enough that renting a single growable buffer for the
/// whole exchange is simpler than juggling separate read/write types, the
/// same call `donos_proto::buffer::BytePacketBuffer` makes.
#[cfg_attr(feature = "fuzzing", derive(arbitrary::Arbitrary, Debug, Clone))]
pub struct PacketBuffer {
    pub buf: Vec<u8>,
    pub pos: usize,
}

impl PacketBuffer {
    /// A buffer sized for a single UDP datagram (spec section 4.3: always 512 bytes).
    pub fn udp_sized() -> Self {
        Self {
            buf: vec![0u8; 512],
            pos: 0,
        }
    }

    /// A buffer sized for the initial TCP read (spec section 4.3: 8 KiB, grown on demand).
    pub fn tcp_sized() -> Self {
        Self {
            buf: vec![0u8; 8 * 1024],
            pos: 0,
        }
    }

    pub fn from_bytes(buf: Vec<u8>) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current position within buffer
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Grow the backing buffer in place, preserving already-written bytes.
    /// Used by the TCP reader when the announced message length exceeds the
    /// buffer rented from the pool.
    pub fn grow_to(&mut self, new_len: usize) {
        if new_len > self.buf.len() {
            self.buf.resize(new_len, 0);
        }
    }
}
