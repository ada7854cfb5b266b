use crate::prelude::*;

/// Little-endian cursor over a growable table buffer.
///
/// Writes at the end of the buffer extend it; after a `seek` back into the
/// buffer, writes overwrite in place so a sub-range can be patched.
#[derive(Debug, Default, Clone)]
pub struct TableWriter {
    buffer: BytesMut,
    position: usize,
}

impl TableWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            position: 0,
        }
    }

    /// Starts from an existing payload, cursor at offset zero.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            buffer: BytesMut::from(data),
            position: 0,
        }
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.buffer.len() {
            return Err(Error::UnexpectedEndOfData {
                offset: position,
                needed: 0,
                remaining: 0,
            });
        }
        self.position = position;
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }

    fn put(&mut self, bytes: &[u8]) {
        let end = self.position + bytes.len();
        let overlap = self.buffer.len().saturating_sub(self.position).min(bytes.len());
        self.buffer[self.position..self.position + overlap].copy_from_slice(&bytes[..overlap]);
        self.buffer.extend_from_slice(&bytes[overlap..]);
        self.position = end;
    }

    pub fn write_u8(&mut self, value: u8) {
        self.put(&[value]);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.put(&value.to_le_bytes());
    }

    pub fn write_u16(&mut self, value: u16) {
        self.put(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.put(&value.to_le_bytes());
    }

    pub fn write_u24(&mut self, value: u32) -> Result<()> {
        if value > 0x00FF_FFFF {
            return Err(Error::InvalidValue {
                field: "u24",
                value: value.to_string(),
            });
        }
        self.put(&value.to_le_bytes()[..3]);
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) {
        self.put(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.put(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.put(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.put(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.put(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.put(&value.to_le_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.put(&[u8::from(value)]);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.put(bytes);
    }

    pub fn write_zeros(&mut self, count: usize) {
        self.put(&vec![0; count]);
    }

    /// Writes `value` into a fixed `len` field, space padded.
    ///
    /// Values longer than the field are truncated, as the meter firmware does;
    /// the truncation is logged.
    pub fn write_string(&mut self, value: &str, len: usize) {
        let mut field: Vec<u8> = value
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect();
        if field.len() > len {
            warn!("truncating {:?} to {} bytes", value, len);
            field.truncate(len);
        }
        field.resize(len, b' ');
        self.put(&field);
    }

    /// Writes a digit string as `len` bytes of packed BCD, left padded with zeros.
    pub fn write_bcd(&mut self, digits: &str, len: usize) -> Result<()> {
        let invalid = || Error::InvalidValue {
            field: "bcd digits",
            value: digits.to_string(),
        };
        if digits.len() > len * 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let padded = format!("{:0>width$}", digits, width = len * 2);
        let packed: Vec<u8> = padded
            .as_bytes()
            .chunks(2)
            .map(|pair| bits::pack_nibbles(pair[0] - b'0', pair[1] - b'0'))
            .collect();
        self.put(&packed);
        Ok(())
    }
}
