//! DNS message header, question, and resource record codec (RFC 1035 section 4,
//! SRV per RFC 2782). Builds on [`crate::buffer`] for the name codec.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::buffer::{PacketBuffer, ReaderError, WriterError};

/// Recognized response codes (spec section 3).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    Other(u8),
}

impl ResponseCode {
    fn from_nibble(value: u8) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::FormatError,
            2 => Self::ServerFailure,
            3 => Self::NameError,
            4 => Self::NotImplemented,
            5 => Self::Refused,
            other => Self::Other(other),
        }
    }

    fn into_nibble(self) -> u8 {
        match self {
            Self::NoError => 0,
            Self::FormatError => 1,
            Self::ServerFailure => 2,
            Self::NameError => 3,
            Self::NotImplemented => 4,
            Self::Refused => 5,
            Self::Other(v) => v & 0x0F,
        }
    }
}

/// The 16-bit flags word (spec section 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub is_response: bool,
    pub opcode: u8,
    pub is_authoritative: bool,
    pub is_truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub z: bool,
    pub authentic_data: bool,
    pub checking_disabled: bool,
    pub response_code: ResponseCode,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            is_response: false,
            opcode: 0,
            is_authoritative: false,
            is_truncated: false,
            recursion_desired: true,
            recursion_available: false,
            z: false,
            authentic_data: false,
            checking_disabled: false,
            response_code: ResponseCode::NoError,
        }
    }
}

/// The 12-byte message header (spec section 3).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub id: u16,
    pub flags: Flags,
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
}

impl Header {
    pub fn read(buf: &mut PacketBuffer) -> Result<Self, ReaderError> {
        let id = buf.read_u16()?;
        let head = buf.read_u8()?;
        let tail = buf.read_u8()?;

        let flags = Flags {
            is_response: (head & 0b1000_0000) != 0,
            opcode: (head >> 3) & 0x0F,
            is_authoritative: (head & 0b0000_0100) != 0,
            is_truncated: (head & 0b0000_0010) != 0,
            recursion_desired: (head & 0b0000_0001) != 0,
            recursion_available: (tail & 0b1000_0000) != 0,
            z: (tail & 0b0100_0000) != 0,
            authentic_data: (tail & 0b0010_0000) != 0,
            checking_disabled: (tail & 0b0001_0000) != 0,
            response_code: ResponseCode::from_nibble(tail & 0x0F),
        };

        Ok(Self {
            id,
            flags,
            question_count: buf.read_u16()?,
            answer_count: buf.read_u16()?,
            authority_count: buf.read_u16()?,
            additional_count: buf.read_u16()?,
        })
    }

    pub fn write(&self, buf: &mut PacketBuffer) -> Result<(), WriterError> {
        buf.write_u16(self.id)?;

        let f = &self.flags;
        let head = ((f.is_response as u8) << 7)
            | (f.opcode << 3)
            | ((f.is_authoritative as u8) << 2)
            | ((f.is_truncated as u8) << 1)
            | (f.recursion_desired as u8);
        let tail = ((f.recursion_available as u8) << 7)
            | ((f.z as u8) << 6)
            | ((f.authentic_data as u8) << 5)
            | ((f.checking_disabled as u8) << 4)
            | f.response_code.into_nibble();

        buf.write_u8(head)?;
        buf.write_u8(tail)?;
        buf.write_u16(self.question_count)?;
        buf.write_u16(self.answer_count)?;
        buf.write_u16(self.authority_count)?;
        buf.write_u16(self.additional_count)
    }
}

/// Recognized record/query classes (spec section 3). Always `Internet` for
/// anything this library emits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecordClass {
    Internet,
    Other(u16),
}

impl RecordClass {
    fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::Internet,
            other => Self::Other(other),
        }
    }

    fn into_u16(self) -> u16 {
        match self {
            Self::Internet => 1,
            Self::Other(v) => v,
        }
    }
}

/// Recognized record/query types (spec section 3). Anything else decodes as
/// an opaque blob via `RecordType::Other`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Ns,
    Cname,
    Soa,
    Txt,
    Aaaa,
    Srv,
    Other(u16),
}

impl RecordType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::A,
            2 => Self::Ns,
            5 => Self::Cname,
            6 => Self::Soa,
            16 => Self::Txt,
            28 => Self::Aaaa,
            33 => Self::Srv,
            other => Self::Other(other),
        }
    }

    pub fn into_u16(self) -> u16 {
        match self {
            Self::A => 1,
            Self::Ns => 2,
            Self::Cname => 5,
            Self::Soa => 6,
            Self::Txt => 16,
            Self::Aaaa => 28,
            Self::Srv => 33,
            Self::Other(v) => v,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::Ns => write!(f, "NS"),
            Self::Cname => write!(f, "CNAME"),
            Self::Soa => write!(f, "SOA"),
            Self::Txt => write!(f, "TXT"),
            Self::Aaaa => write!(f, "AAAA"),
            Self::Srv => write!(f, "SRV"),
            Self::Other(v) => write!(f, "TYPE{v}"),
        }
    }
}

/// A question (spec section 3): name, type, class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

impl Question {
    pub fn new(name: impl Into<String>, qtype: RecordType) -> Self {
        Self {
            name: name.into(),
            qtype,
            qclass: RecordClass::Internet,
        }
    }

    pub fn read(buf: &mut PacketBuffer) -> Result<Self, ReaderError> {
        let name = buf.read_name()?;
        let qtype = RecordType::from_u16(buf.read_u16()?);
        let qclass = RecordClass::from_u16(buf.read_u16()?);
        Ok(Self { name, qtype, qclass })
    }

    pub fn write(&self, buf: &mut PacketBuffer) -> Result<(), WriterError> {
        buf.write_name(&self.name)?;
        buf.write_u16(self.qtype.into_u16())?;
        buf.write_u16(self.qclass.into_u16())
    }
}

/// SOA record body (spec section 4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoaData {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

/// SRV record body (RFC 2782, spec section 4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvData {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

/// The decoded RDATA of a resource record. Only A/AAAA/CNAME/NS/SOA/SRV/TXT
/// are given typed bodies; everything else is preserved as an opaque blob
/// (spec section 1: "not a general DNS library").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Cname(String),
    Ns(String),
    Soa(SoaData),
    Srv(SrvData),
    Txt(Vec<u8>),
    Opaque(Vec<u8>),
}

/// A resource record with its owned, decoded body (spec section 3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub rtype: RecordType,
    pub rclass: RecordClass,
    pub ttl: u32,
    pub data: RecordData,
}

impl ResourceRecord {
    pub fn read(buf: &mut PacketBuffer) -> Result<Self, ReaderError> {
        let name = buf.read_name()?;
        let rtype = RecordType::from_u16(buf.read_u16()?);
        let rclass = RecordClass::from_u16(buf.read_u16()?);
        let ttl = buf.read_u32()?;
        let rdlength = buf.read_u16()? as usize;
        let rdata_start = buf.pos();

        let data = match rtype {
            RecordType::A => {
                if rdlength != 4 {
                    return Err(ReaderError::EndOfBuffer);
                }
                let raw = buf.read_u32()?;
                RecordData::A(Ipv4Addr::from(raw))
            }
            RecordType::Aaaa => {
                if rdlength != 16 {
                    return Err(ReaderError::EndOfBuffer);
                }
                let mut octets = [0u8; 16];
                for octet in octets.iter_mut() {
                    *octet = buf.read_u8()?;
                }
                RecordData::Aaaa(Ipv6Addr::from(octets))
            }
            RecordType::Cname => RecordData::Cname(buf.read_name()?),
            RecordType::Ns => RecordData::Ns(buf.read_name()?),
            RecordType::Soa => {
                let mname = buf.read_name()?;
                let rname = buf.read_name()?;
                RecordData::Soa(SoaData {
                    mname,
                    rname,
                    serial: buf.read_u32()?,
                    refresh: buf.read_u32()?,
                    retry: buf.read_u32()?,
                    expire: buf.read_u32()?,
                    minimum: buf.read_u32()?,
                })
            }
            RecordType::Srv => {
                let priority = buf.read_u16()?;
                let weight = buf.read_u16()?;
                let port = buf.read_u16()?;
                let target = buf.read_name()?;
                RecordData::Srv(SrvData {
                    priority,
                    weight,
                    port,
                    target,
                })
            }
            RecordType::Txt => RecordData::Txt(buf.read_bytes(rdlength)?),
            RecordType::Other(_) => RecordData::Opaque(buf.read_bytes(rdlength)?),
        };

        // Names inside RDATA (CNAME/NS/SOA/SRV target) can use compression
        // pointers resolved against the outer buffer, so the bytes actually
        // consumed can differ from `rdlength` if the encoder compressed
        // them. We always trust our own cursor, but still guard against a
        // server lying about rdlength entirely (spec section 9: "answer-count
        // honesty" - surface protocol errors rather than silently reading
        // past what was claimed, mirrored here for rdlength).
        let consumed = buf.pos() - rdata_start;
        if matches!(
            rtype,
            RecordType::A | RecordType::Aaaa | RecordType::Txt | RecordType::Other(_)
        ) && consumed != rdlength
        {
            return Err(ReaderError::EndOfBuffer);
        }

        Ok(Self {
            name,
            rtype,
            rclass,
            ttl,
            data,
        })
    }
}

/// A forward-only reader over a full message buffer (spec section 4.2).
pub struct MessageReader<'a> {
    buf: &'a mut PacketBuffer,
}

impl<'a> MessageReader<'a> {
    pub fn new(buf: &'a mut PacketBuffer) -> Self {
        Self { buf }
    }

    pub fn read_header(&mut self) -> Result<Header, ReaderError> {
        Header::read(self.buf)
    }

    pub fn read_question(&mut self) -> Result<Question, ReaderError> {
        Question::read(self.buf)
    }

    pub fn read_resource_record(&mut self) -> Result<ResourceRecord, ReaderError> {
        ResourceRecord::read(self.buf)
    }
}

/// Build an outgoing query: header + exactly one question. The writer never
/// emits RRs (spec section 4.2: the writer is for constructing queries).
pub fn write_query(
    buf: &mut PacketBuffer,
    id: u16,
    recursion_desired: bool,
    question: &Question,
) -> Result<(), WriterError> {
    let header = Header {
        id,
        flags: Flags {
            recursion_desired,
            ..Default::default()
        },
        question_count: 1,
        answer_count: 0,
        authority_count: 0,
        additional_count: 0,
    };
    header.write(buf)?;
    question.write(buf)
}
