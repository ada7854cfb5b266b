use crate::prelude::*;

use std::fmt;

/// C12.19 table number. Standard tables are 0..2047, manufacturer tables start at 2048.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct TableId(pub u16);

impl TableId {
    pub const MFG_OFFSET: u16 = 2048;

    pub const fn standard(number: u16) -> Self {
        Self(number)
    }

    pub const fn manufacturer(number: u16) -> Self {
        Self(Self::MFG_OFFSET + number)
    }

    pub const fn is_manufacturer(&self) -> bool {
        self.0 >= Self::MFG_OFFSET
    }

    /// Number within its own (standard or manufacturer) table space.
    pub const fn number(&self) -> u16 {
        if self.is_manufacturer() {
            self.0 - Self::MFG_OFFSET
        } else {
            self.0
        }
    }
}

impl From<u16> for TableId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_manufacturer() {
            write!(f, "{} (MT{})", self.0, self.number())
        } else {
            write!(f, "{} (ST{})", self.0, self.0)
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum TableState {
    Unloaded,
    Loaded,
    /// Fields modified locally and not yet written back.
    Dirty,
    Expired,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum TableSize {
    Fixed(usize),
    /// Length is carried by the table's own header; only known once read.
    SelfDescribing,
}

impl TableSize {
    pub const fn fixed(&self) -> Option<usize> {
        match self {
            TableSize::Fixed(len) => Some(*len),
            TableSize::SelfDescribing => None,
        }
    }
}

pub trait TableDecode: Sized {
    const TABLE: TableId;
    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Values taken from other, already decoded tables.
    type Params: Clone + fmt::Debug;

    /// Field layout for `params`, or `None` for self-describing tables.
    fn layout(params: &Self::Params) -> Option<Layout>;

    fn size(params: &Self::Params) -> TableSize {
        match Self::layout(params) {
            Some(layout) => TableSize::Fixed(layout.size()),
            None => TableSize::SelfDescribing,
        }
    }

    fn decode(reader: &mut TableReader<'_>, params: &Self::Params) -> Result<Self>;
}

pub trait TableEncode: TableDecode {
    fn encode(&self, writer: &mut TableWriter, params: &Self::Params) -> Result<()>;
}

/// Decodes a complete table payload, requiring every byte to be consumed.
pub fn decode_table<T: TableDecode>(data: &[u8], params: &T::Params) -> Result<T> {
    let expected = match T::size(params) {
        TableSize::Fixed(len) => {
            if data.len() > len {
                return Err(schema_error!(
                    T::TABLE,
                    "received {} bytes for a {} byte table",
                    data.len(),
                    len
                ));
            }
            len
        }
        TableSize::SelfDescribing => data.len(),
    };

    let mut reader = TableReader::new(data);
    let value = T::decode(&mut reader, params)?;
    let consumed = reader.position();
    if consumed != expected {
        return Err(Error::LengthMismatch {
            table: T::TABLE,
            expected,
            consumed,
        });
    }
    trace!("decoded table {}: {} bytes", T::TABLE, consumed);
    Ok(value)
}

pub fn encode_table<T: TableEncode>(value: &T, params: &T::Params) -> Result<Bytes> {
    let size = T::size(params);
    let mut writer = TableWriter::with_capacity(size.fixed().unwrap_or_default());
    value.encode(&mut writer, params)?;
    if let TableSize::Fixed(expected) = size {
        if writer.len() != expected {
            return Err(Error::LengthMismatch {
                table: T::TABLE,
                expected,
                consumed: writer.len(),
            });
        }
    }
    Ok(writer.into_bytes())
}

/// A table instance together with its read/modify/write lifecycle.
///
/// Any failed transport call or decode leaves state, fields and the raw
/// buffer exactly as they were. Local changes survive `expire`; only a
/// successful write or `force_read` drops them.
#[derive(Clone, Debug)]
pub struct PsemTable<T: TableDecode> {
    params: T::Params,
    size: TableSize,
    timeout: Duration,
    state: TableState,
    raw: Bytes,
    fields: Option<T>,
    unwritten: bool,
}

impl<T: TableDecode> PsemTable<T> {
    pub fn new(params: T::Params) -> Self {
        Self {
            size: T::size(&params),
            params,
            timeout: T::TIMEOUT,
            state: TableState::Unloaded,
            raw: Bytes::new(),
            fields: None,
            unwritten: false,
        }
    }

    /// Builds a loaded table from a captured payload, without any transport.
    pub fn from_bytes(data: Bytes, params: T::Params) -> Result<Self> {
        let mut table = Self::new(params);
        table.load(data)?;
        Ok(table)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn id(&self) -> TableId {
        T::TABLE
    }

    pub fn params(&self) -> &T::Params {
        &self.params
    }

    pub fn size(&self) -> TableSize {
        self.size
    }

    /// Byte length: the computed size, or the loaded length for self-describing tables.
    pub fn len(&self) -> usize {
        self.size.fixed().unwrap_or(self.raw.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn fields(&self) -> Result<&T> {
        match self.state {
            TableState::Loaded | TableState::Dirty => self.fields.as_ref().ok_or(Error::NotLoaded { table: T::TABLE }),
            TableState::Unloaded | TableState::Expired => Err(Error::NotLoaded { table: T::TABLE }),
        }
    }

    pub fn into_fields(self) -> Result<T> {
        match self.state {
            TableState::Loaded | TableState::Dirty => self.fields.ok_or(Error::NotLoaded { table: T::TABLE }),
            TableState::Unloaded | TableState::Expired => Err(Error::NotLoaded { table: T::TABLE }),
        }
    }

    /// True while local changes have not been written, including after `expire`.
    pub fn has_unwritten_changes(&self) -> bool {
        self.unwritten
    }

    /// Returns the fields, reading the table first if it is unloaded or expired.
    pub fn fields_or_read(&mut self, transport: &mut impl PsemTransport) -> Result<&T> {
        if matches!(self.state, TableState::Unloaded | TableState::Expired) {
            self.read(transport)?;
        }
        self.fields()
    }

    /// Reads and decodes the whole table. Refuses to discard local changes.
    pub fn read(&mut self, transport: &mut impl PsemTransport) -> Result<&T> {
        if self.unwritten {
            return Err(Error::PendingChanges { table: T::TABLE });
        }
        self.force_read(transport)
    }

    /// Reads and decodes the whole table, discarding any local changes.
    pub fn force_read(&mut self, transport: &mut impl PsemTransport) -> Result<&T> {
        debug!("reading table {} (timeout {:?})", T::TABLE, self.timeout);
        let data = transport
            .read(T::TABLE, self.timeout)
            .map_err(|code| Error::from_response(T::TABLE, code))?;
        self.load(data)?;
        self.fields()
    }

    /// Re-reads `count` bytes at `offset` and re-decodes the patched payload.
    pub fn read_offset(&mut self, transport: &mut impl PsemTransport, offset: usize, count: usize) -> Result<&T> {
        if self.unwritten {
            return Err(Error::PendingChanges { table: T::TABLE });
        }
        if self.state != TableState::Loaded {
            return Err(Error::NotLoaded { table: T::TABLE });
        }
        if offset + count > self.raw.len() {
            return Err(schema_error!(
                T::TABLE,
                "partial read of {} bytes at {} is outside the {} byte table",
                count,
                offset,
                self.raw.len()
            ));
        }

        debug!("reading table {} offset {} count {}", T::TABLE, offset, count);
        let data = transport
            .read_offset(T::TABLE, offset, count, self.timeout)
            .map_err(|code| Error::from_response(T::TABLE, code))?;
        if data.len() != count {
            return Err(schema_error!(
                T::TABLE,
                "partial read returned {} bytes, requested {}",
                data.len(),
                count
            ));
        }

        let mut patched = BytesMut::from(&self.raw[..]);
        patched[offset..offset + count].copy_from_slice(&data);
        self.load(patched.freeze())?;
        self.fields()
    }

    /// Marks the loaded contents stale; the next access must read again.
    /// Unwritten changes are kept and still block `read`.
    pub fn expire(&mut self) {
        if self.state != TableState::Unloaded {
            self.state = TableState::Expired;
        }
    }

    /// Changes the dependency values, resizing the table. Decoded fields are kept.
    pub fn reconfigure(&mut self, params: T::Params) {
        let size = T::size(&params);
        if size != self.size {
            debug!("table {} resized from {:?} to {:?}", T::TABLE, self.size, size);
        }
        self.params = params;
        self.size = size;
    }

    fn load(&mut self, data: Bytes) -> Result<()> {
        let fields = decode_table::<T>(&data, &self.params)?;
        self.fields = Some(fields);
        self.raw = data;
        self.state = TableState::Loaded;
        self.unwritten = false;
        Ok(())
    }

    /// Fields as held locally, including unwritten changes on an expired table.
    fn local_fields(&self) -> Result<&T> {
        if self.unwritten {
            return self.fields.as_ref().ok_or(Error::NotLoaded { table: T::TABLE });
        }
        self.fields()
    }

    fn mark_written(&mut self, data: Bytes) {
        self.raw = data;
        self.state = TableState::Loaded;
        self.unwritten = false;
    }
}

impl<T: TableEncode> PsemTable<T> {
    /// Applies `change` to the loaded fields and marks the table dirty.
    pub fn modify<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut T),
    {
        if matches!(self.state, TableState::Unloaded | TableState::Expired) {
            return Err(Error::NotLoaded { table: T::TABLE });
        }
        let fields = self.fields.as_mut().ok_or(Error::NotLoaded { table: T::TABLE })?;
        change(fields);
        self.state = TableState::Dirty;
        self.unwritten = true;
        Ok(())
    }

    /// Encodes the current fields with the current params.
    pub fn encoded(&self) -> Result<Bytes> {
        encode_table(self.local_fields()?, &self.params)
    }

    pub fn write(&mut self, transport: &mut impl PsemTransport) -> Result<()> {
        let data = self.encoded()?;
        debug!("writing table {} ({} bytes)", T::TABLE, data.len());
        transport
            .write(T::TABLE, &data, self.timeout)
            .map_err(|code| Error::from_response(T::TABLE, code))?;
        self.mark_written(data);
        Ok(())
    }

    /// Writes only the bytes of the named layout field.
    pub fn write_offset(&mut self, transport: &mut impl PsemTransport, field: &str) -> Result<()> {
        let layout = T::layout(&self.params)
            .ok_or_else(|| schema_error!(T::TABLE, "self-describing table has no field offsets"))?;
        let (offset, width) = match (layout.offset_of(field), layout.width_of(field)) {
            (Some(offset), Some(width)) => (offset, width),
            _ => return Err(schema_error!(T::TABLE, "no field {:?} at this revision", field)),
        };

        let data = self.encoded()?;
        if self.raw.len() != data.len() {
            return Err(schema_error!(
                T::TABLE,
                "table resized from {} to {} bytes, full write required",
                self.raw.len(),
                data.len()
            ));
        }
        debug!("writing table {} field {} ({} bytes at {})", T::TABLE, field, width, offset);
        transport
            .write_offset(T::TABLE, offset, &data[offset..offset + width], self.timeout)
            .map_err(|code| Error::from_response(T::TABLE, code))?;

        // other fields may still hold unwritten changes
        let mut patched = BytesMut::from(&self.raw[..]);
        patched[offset..offset + width].copy_from_slice(&data[offset..offset + width]);
        let patched = patched.freeze();
        if patched == data {
            self.mark_written(data);
        } else {
            self.raw = patched;
        }
        Ok(())
    }

    /// Schedules the current fields to be applied by the meter when `record` triggers.
    pub fn pending_write(&mut self, transport: &mut impl PsemTransport, record: &PendingRecord) -> Result<()> {
        let data = self.encoded()?;
        debug!("pending write of table {} ({:?})", T::TABLE, record);
        transport
            .pending_write(T::TABLE, record, &data, self.timeout)
            .map_err(|code| Error::from_response(T::TABLE, code))?;
        self.mark_written(data);
        Ok(())
    }
}
