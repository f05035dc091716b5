use super::{PacketBuffer, MAX_LABEL_LEN, MAX_NAME_LEN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterError {
    EndOfBuffer,
    LabelTooLong(usize),
    NameTooLong(usize),
}

impl std::fmt::Display for WriterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndOfBuffer => write!(f, "writing out of buffer"),
            Self::LabelTooLong(len) => write!(f, "label of {len} bytes exceeds {MAX_LABEL_LEN}"),
            Self::NameTooLong(len) => write!(f, "name of {len} bytes exceeds {MAX_NAME_LEN}"),
        }
    }
}

impl std::error::Error for WriterError {}

impl From<WriterError> for std::io::Error {
    fn from(value: WriterError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, value.to_string())
    }
}

impl PacketBuffer {
    fn set(&mut self, pos: usize, val: u8) -> Result<(), WriterError> {
        if pos >= self.buf.len() {
            return Err(WriterError::EndOfBuffer);
        }
        self.buf[pos] = val;
        Ok(())
    }

    pub fn set_u16(&mut self, pos: usize, val: u16) -> Result<(), WriterError> {
        self.set(pos, (val >> 8) as u8)?;
        self.set(pos + 1, (val & 0xFF) as u8)?;
        Ok(())
    }

    pub fn write_u8(&mut self, val: u8) -> Result<(), WriterError> {
        if self.pos >= self.buf.len() {
            return Err(WriterError::EndOfBuffer);
        }
        self.buf[self.pos] = val;
        self.pos += 1;
        Ok(())
    }

    pub fn write_u16(&mut self, val: u16) -> Result<(), WriterError> {
        self.write_u8((val >> 8) as u8)?;
        self.write_u8((val & 0xFF) as u8)?;
        Ok(())
    }

    pub fn write_u32(&mut self, val: u32) -> Result<(), WriterError> {
        self.write_u8(((val >> 24) & 0xFF) as u8)?;
        self.write_u8(((val >> 16) & 0xFF) as u8)?;
        self.write_u8(((val >> 8) & 0xFF) as u8)?;
        self.write_u8((val & 0xFF) as u8)?;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WriterError> {
        for b in bytes {
            self.write_u8(*b)?;
        }
        Ok(())
    }

    fn write_label(&mut self, label: &str) -> Result<(), WriterError> {
        let len = label.len();
        if len > MAX_LABEL_LEN {
            return Err(WriterError::LabelTooLong(len));
        }
        self.write_u8(len as u8)?;
        self.write_bytes(label.as_bytes())
    }

    /// Write a name as `<len><label>...<0>`.
    ///
    /// Spec section 4.1: the writer never emits compression pointers. The
    /// only messages this library builds are outgoing questions, so there is
    /// nothing to gain by sharing suffixes between names (there is only ever
    /// one name per message).
    pub fn write_name(&mut self, name: &str) -> Result<(), WriterError> {
        if name.len() > MAX_NAME_LEN {
            return Err(WriterError::NameTooLong(name.len()));
        }
        let name = name.strip_suffix('.').unwrap_or(name);
        if !name.is_empty() {
            for label in name.split('.') {
                self.write_label(label)?;
            }
        }
        self.write_u8(0)
    }
}
