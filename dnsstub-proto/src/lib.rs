//! Wire codec for the stub resolver: name/label handling, the message header,
//! and typed resource record bodies. No I/O and no async — everything here
//! operates on an in-memory [`buffer::PacketBuffer`].

pub mod buffer;
pub mod message;
