//! PSEM session boundary.
//!
//! Framing, logon and retries live behind `PsemTransport`; tables only see a
//! byte payload or a response code.

use crate::prelude::*;

use chrono::NaiveDateTime;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::collections::HashMap;
use std::fmt;

// {{{ ResponseCode
/// C12.18 PSEM response codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive, Serialize)]
#[repr(u8)]
pub enum ResponseCode {
    Ok = 0x00,
    Err = 0x01,
    Sns = 0x02,
    Isc = 0x03,
    Onp = 0x04,
    Iar = 0x05,
    Bsy = 0x06,
    Dnr = 0x07,
    Dlk = 0x08,
    Rno = 0x09,
    Isss = 0x0A,
}

impl ResponseCode {
    pub fn description(&self) -> &'static str {
        match self {
            ResponseCode::Ok => "acknowledge",
            ResponseCode::Err => "error",
            ResponseCode::Sns => "service not supported",
            ResponseCode::Isc => "insufficient security clearance",
            ResponseCode::Onp => "operation not possible",
            ResponseCode::Iar => "inappropriate action requested",
            ResponseCode::Bsy => "device busy",
            ResponseCode::Dnr => "data not ready",
            ResponseCode::Dlk => "data locked",
            ResponseCode::Rno => "renegotiate request",
            ResponseCode::Isss => "invalid service sequence state",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.description())
    }
} // }}}

// {{{ PendingRecord
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive, Serialize)]
#[repr(u8)]
pub enum RelativeUnit {
    Weeks = 1,
    Days = 2,
    Hours = 3,
    Minutes = 4,
    Seconds = 5,
}

/// What makes a pending table become active.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum PendingTrigger {
    Absolute(NaiveDateTime),
    Relative { unit: RelativeUnit, count: u8 },
    NonTime([u8; PendingRecord::STORAGE]),
}

/// PENDING_EVENT_DESCRIPTION_RCD: a selector byte followed by event storage.
///
/// Selector bits 0..3 carry the event code (0 absolute, 1..5 relative, 6
/// non-time), bit 4 requests a self read and bit 5 a demand reset on activation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct PendingRecord {
    pub trigger: PendingTrigger,
    pub self_read: bool,
    pub demand_reset: bool,
}

impl PendingRecord {
    pub const STORAGE: usize = 5;
    pub const SIZE: usize = 1 + Self::STORAGE;

    const NON_TIME: u32 = 6;
    const SELF_READ_BIT: u32 = 4;
    const DEMAND_RESET_BIT: u32 = 5;

    pub fn new(trigger: PendingTrigger) -> Self {
        Self {
            trigger,
            self_read: false,
            demand_reset: false,
        }
    }

    pub fn event_code(&self) -> u8 {
        match self.trigger {
            PendingTrigger::Absolute(_) => 0,
            PendingTrigger::Relative { unit, .. } => unit.into(),
            PendingTrigger::NonTime(_) => Self::NON_TIME as u8,
        }
    }

    pub fn encode(&self, writer: &mut TableWriter, format: TimeFormat) -> Result<()> {
        let mut selector = bits::set_field(0, 0x0F, 0, u32::from(self.event_code()));
        selector = bits::with_bit(selector, Self::SELF_READ_BIT, self.self_read);
        selector = bits::with_bit(selector, Self::DEMAND_RESET_BIT, self.demand_reset);
        writer.write_u8(selector as u8);

        match self.trigger {
            PendingTrigger::Absolute(at) => {
                format.write_stime(writer, Some(at))?;
                writer.write_zeros(Self::STORAGE - format.stime_size());
            }
            PendingTrigger::Relative { count, .. } => {
                writer.write_u8(count);
                writer.write_zeros(Self::STORAGE - 1);
            }
            PendingTrigger::NonTime(storage) => writer.write_bytes(&storage),
        }
        Ok(())
    }

    pub fn decode(reader: &mut TableReader<'_>, format: TimeFormat) -> Result<Self> {
        let selector = u32::from(reader.read_u8()?);
        let code = bits::get_field(selector, 0x0F, 0);
        let storage: [u8; Self::STORAGE] = reader.read_array()?;

        let trigger = match code {
            0 => {
                let mut time = TableReader::new(&storage);
                let at = format.read_stime(&mut time)?.ok_or_else(|| Error::InvalidValue {
                    field: "pending event time",
                    value: format!("{:02x?}", storage),
                })?;
                PendingTrigger::Absolute(at)
            }
            Self::NON_TIME => PendingTrigger::NonTime(storage),
            code => {
                let unit = RelativeUnit::try_from(code as u8).map_err(|_| Error::InvalidValue {
                    field: "pending event code",
                    value: code.to_string(),
                })?;
                PendingTrigger::Relative { unit, count: storage[0] }
            }
        };

        Ok(Self {
            trigger,
            self_read: bits::is_set(selector, Self::SELF_READ_BIT),
            demand_reset: bits::is_set(selector, Self::DEMAND_RESET_BIT),
        })
    }
} // }}}

pub trait PsemTransport {
    fn read(&mut self, table: TableId, timeout: Duration) -> Result<Bytes, ResponseCode>;

    fn read_offset(&mut self, table: TableId, offset: usize, count: usize, timeout: Duration) -> Result<Bytes, ResponseCode>;

    fn write(&mut self, table: TableId, data: &[u8], timeout: Duration) -> Result<(), ResponseCode>;

    fn write_offset(&mut self, table: TableId, offset: usize, data: &[u8], timeout: Duration) -> Result<(), ResponseCode>;

    fn pending_write(&mut self, table: TableId, record: &PendingRecord, data: &[u8], timeout: Duration) -> Result<(), ResponseCode>;
}

// {{{ MemoryTransport
#[derive(Clone, Debug, PartialEq)]
pub struct WriteRecord {
    pub table: TableId,
    /// `None` for a full table write.
    pub offset: Option<usize>,
    pub data: Bytes,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PendingWriteRecord {
    pub table: TableId,
    pub record: PendingRecord,
    pub data: Bytes,
}

/// Serves tables from memory, as captured from a meter.
///
/// Tables that were never inserted answer `Iar`, like a meter asked for a
/// table it does not implement.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    tables: HashMap<TableId, Bytes>,
    faults: HashMap<TableId, ResponseCode>,
    writes: Vec<WriteRecord>,
    pending_writes: Vec<PendingWriteRecord>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: impl Into<TableId>, data: impl Into<Bytes>) {
        self.tables.insert(table.into(), data.into());
    }

    pub fn with_table(mut self, table: impl Into<TableId>, data: impl Into<Bytes>) -> Self {
        self.insert(table, data);
        self
    }

    pub fn get(&self, table: impl Into<TableId>) -> Option<&Bytes> {
        self.tables.get(&table.into())
    }

    pub fn contains(&self, table: impl Into<TableId>) -> bool {
        self.tables.contains_key(&table.into())
    }

    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.tables.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Answers every request for `table` with `code` until cleared.
    pub fn fail_with(&mut self, table: impl Into<TableId>, code: ResponseCode) {
        self.faults.insert(table.into(), code);
    }

    pub fn clear_fault(&mut self, table: impl Into<TableId>) {
        self.faults.remove(&table.into());
    }

    pub fn writes(&self) -> &[WriteRecord] {
        &self.writes
    }

    pub fn pending_writes(&self) -> &[PendingWriteRecord] {
        &self.pending_writes
    }

    fn check(&self, table: TableId) -> Result<(), ResponseCode> {
        match self.faults.get(&table) {
            Some(code) => Err(*code),
            None => Ok(()),
        }
    }
}

impl PsemTransport for MemoryTransport {
    fn read(&mut self, table: TableId, timeout: Duration) -> Result<Bytes, ResponseCode> {
        trace!("memory read {} ({:?})", table, timeout);
        self.check(table)?;
        self.tables.get(&table).cloned().ok_or(ResponseCode::Iar)
    }

    fn read_offset(&mut self, table: TableId, offset: usize, count: usize, timeout: Duration) -> Result<Bytes, ResponseCode> {
        trace!("memory read {} offset {} count {} ({:?})", table, offset, count, timeout);
        self.check(table)?;
        let data = self.tables.get(&table).ok_or(ResponseCode::Iar)?;
        if offset + count > data.len() {
            return Err(ResponseCode::Iar);
        }
        Ok(data.slice(offset..offset + count))
    }

    fn write(&mut self, table: TableId, data: &[u8], timeout: Duration) -> Result<(), ResponseCode> {
        trace!("memory write {} {} bytes ({:?})", table, data.len(), timeout);
        self.check(table)?;
        let data = Bytes::copy_from_slice(data);
        self.tables.insert(table, data.clone());
        self.writes.push(WriteRecord {
            table,
            offset: None,
            data,
        });
        Ok(())
    }

    fn write_offset(&mut self, table: TableId, offset: usize, data: &[u8], timeout: Duration) -> Result<(), ResponseCode> {
        trace!("memory write {} offset {} {} bytes ({:?})", table, offset, data.len(), timeout);
        self.check(table)?;
        let stored = self.tables.get(&table).ok_or(ResponseCode::Iar)?;
        if offset + data.len() > stored.len() {
            return Err(ResponseCode::Iar);
        }
        let mut patched = BytesMut::from(&stored[..]);
        patched[offset..offset + data.len()].copy_from_slice(data);
        self.tables.insert(table, patched.freeze());
        self.writes.push(WriteRecord {
            table,
            offset: Some(offset),
            data: Bytes::copy_from_slice(data),
        });
        Ok(())
    }

    fn pending_write(&mut self, table: TableId, record: &PendingRecord, data: &[u8], timeout: Duration) -> Result<(), ResponseCode> {
        trace!("memory pending write {} {:?} ({:?})", table, record, timeout);
        self.check(table)?;
        self.pending_writes.push(PendingWriteRecord {
            table,
            record: *record,
            data: Bytes::copy_from_slice(data),
        });
        Ok(())
    }
} // }}}
