use crate::prelude::*;

use nom::bytes::complete::take;
use nom::number::complete as num;
use nom::IResult;

/// Sequential little-endian cursor over a table payload.
///
/// Every read checks the remaining length first, so running off the end of the
/// buffer surfaces as `Error::UnexpectedEndOfData` rather than a nom error.
#[derive(Debug, Clone)]
pub struct TableReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> TableReader<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Moves the cursor to an absolute offset. Seeking to the end is allowed.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::UnexpectedEndOfData {
                offset: position,
                needed: 0,
                remaining: 0,
            });
        }
        self.position = position;
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.position += count;
        Ok(())
    }

    /// Runs `parser` over exactly the next `width` bytes and advances past them.
    pub fn parse<T, P>(&mut self, width: usize, parser: P) -> Result<T>
    where
        P: FnOnce(&'a [u8]) -> IResult<&'a [u8], T>,
    {
        self.ensure(width)?;
        let input = &self.data[self.position..self.position + width];
        match parser(input) {
            Ok((_, value)) => {
                self.position += width;
                Ok(value)
            }
            Err(err) => Err(Error::InvalidValue {
                field: "record",
                value: format!("offset {}: {:?}", self.position, err),
            }),
        }
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(Error::UnexpectedEndOfData {
                offset: self.position,
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.parse(1, num::le_u8)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.parse(1, num::le_i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.parse(2, num::le_u16)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.parse(2, num::le_i16)
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        self.parse(3, num::le_u24)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.parse(4, num::le_u32)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.parse(4, num::le_i32)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.parse(8, num::le_u64)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.parse(8, num::le_i64)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.parse(4, num::le_f32)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.parse(8, num::le_f64)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.parse(count, take(count))
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Reads a fixed-length ISO 8859/1 string, dropping trailing NUL and space padding.
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        let end = bytes
            .iter()
            .rposition(|b| *b != 0 && *b != b' ')
            .map_or(0, |p| p + 1);
        Ok(bytes[..end].iter().map(|b| char::from(*b)).collect())
    }

    /// Reads exactly `len` ISO 8859/1 bytes, padding included.
    pub fn read_latin1(&mut self, len: usize) -> Result<String> {
        Ok(self.read_bytes(len)?.iter().map(|b| char::from(*b)).collect())
    }

    /// Reads `len` bytes of packed BCD, two digits per byte, most significant first.
    pub fn read_bcd(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        let mut digits = String::with_capacity(len * 2);
        for b in bytes {
            for nibble in [bits::high_nibble(*b), bits::low_nibble(*b)] {
                if nibble > 9 {
                    return Err(Error::InvalidValue {
                        field: "bcd digit",
                        value: format!("{:#04x}", b),
                    });
                }
                digits.push(char::from(b'0' + nibble));
            }
        }
        Ok(digits)
    }
}
