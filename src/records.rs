//! Record value types carried inside the HAN and DRLC tables.

use crate::prelude::*;

use chrono::NaiveDateTime;
use nom_derive::{Nom, Parse};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serializer;
use std::fmt;

/// 16-bit record counts use 0xFFFF for "not configured", which sizes to nothing.
pub fn clamp_count(count: u16) -> usize {
    if count == u16::MAX {
        0
    } else {
        usize::from(count)
    }
}

fn sentinel<T: PartialEq>(value: T, none: T) -> Option<T> {
    if value == none {
        None
    } else {
        Some(value)
    }
}

// {{{ Eui64
/// IEEE EUI-64 device address. All ones marks an unassigned slot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Eui64(pub u64);

impl Eui64 {
    pub const UNASSIGNED: Eui64 = Eui64(u64::MAX);

    pub fn is_unassigned(&self) -> bool {
        *self == Self::UNASSIGNED
    }
}

impl fmt::Display for Eui64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        let parts: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
        write!(f, "{}", parts.join(":"))
    }
}

impl Serialize for Eui64 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
} // }}}

// {{{ Binding
/// HAN client binding slot as laid out on the wire.
#[derive(Clone, Copy, Debug, Nom)]
#[nom(LittleEndian)]
struct BindingRcd {
    address: u64,
    short_address: u16,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Binding {
    pub address: Eui64,
    pub short_address: u16,
}

impl Binding {
    pub const SIZE: usize = 10;

    /// An empty slot, as the meter writes it.
    pub const fn unassigned() -> Self {
        Self {
            address: Eui64::UNASSIGNED,
            short_address: u16::MAX,
        }
    }

    pub fn decode(reader: &mut TableReader<'_>) -> Result<Self> {
        let rcd: BindingRcd = reader.parse(Self::SIZE, BindingRcd::parse)?;
        Ok(Self {
            address: Eui64(rcd.address),
            short_address: rcd.short_address,
        })
    }

    pub fn encode(&self, writer: &mut TableWriter) {
        writer.write_u64(self.address.0);
        writer.write_u16(self.short_address);
    }
} // }}}

// {{{ ClientDataRecord
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ClientDataRecord {
    pub eui: Eui64,
    pub data_valid: bool,
    pub payload: Vec<u8>,
}

impl ClientDataRecord {
    pub const HEADER: usize = 9;

    pub const fn size(client_data_size: usize) -> usize {
        Self::HEADER + client_data_size
    }

    pub fn decode(reader: &mut TableReader<'_>, client_data_size: usize) -> Result<Self> {
        Ok(Self {
            eui: Eui64(reader.read_u64()?),
            data_valid: reader.read_bool()?,
            payload: reader.read_bytes(client_data_size)?.to_vec(),
        })
    }

    /// Payloads longer than the slot are rejected; shorter ones are zero padded.
    pub fn encode(&self, writer: &mut TableWriter, client_data_size: usize) -> Result<()> {
        if self.payload.len() > client_data_size {
            return Err(Error::InvalidValue {
                field: "client data payload",
                value: format!("{} bytes, slot holds {}", self.payload.len(), client_data_size),
            });
        }
        writer.write_u64(self.eui.0);
        writer.write_bool(self.data_valid);
        writer.write_bytes(&self.payload);
        writer.write_zeros(client_data_size - self.payload.len());
        Ok(())
    }
} // }}}

// {{{ DisplayVersion
/// Four-part version the radio stores least significant byte first.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct DisplayVersion {
    pub major: u8,
    pub minor: u8,
    pub release: u8,
    pub build: u8,
}

impl DisplayVersion {
    pub fn from_raw(raw: u32) -> Self {
        let [major, minor, release, build] = raw.swap_bytes().to_le_bytes();
        Self {
            major,
            minor,
            release,
            build,
        }
    }

    pub fn to_raw(&self) -> u32 {
        u32::from_le_bytes([self.major, self.minor, self.release, self.build]).swap_bytes()
    }
}

impl fmt::Display for DisplayVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.release, self.build)
    }
}

impl Serialize for DisplayVersion {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Two-part version stored least significant byte first.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ShortVersion {
    pub major: u8,
    pub minor: u8,
}

impl ShortVersion {
    pub fn from_raw(raw: u16) -> Self {
        let [major, minor] = raw.swap_bytes().to_le_bytes();
        Self { major, minor }
    }

    pub fn to_raw(&self) -> u16 {
        u16::from_le_bytes([self.major, self.minor]).swap_bytes()
    }
}

impl fmt::Display for ShortVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Serialize for ShortVersion {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
} // }}}

// {{{ FirmwareImageStatus
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive, Serialize)]
#[repr(u8)]
pub enum UpgradeStatus {
    Idle = 0,
    Downloading = 1,
    Downloaded = 2,
    WaitingToUpgrade = 3,
    Upgrading = 4,
    Failed = 5,
}

#[derive(Clone, Copy, Debug, Nom)]
#[nom(LittleEndian)]
struct FirmwareImageRcd {
    device: u64,
    image_type: u16,
    current: u32,
    pending: u32,
    status: u8,
    percent: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct FirmwareImageStatus {
    pub device: Eui64,
    pub image_type: u16,
    pub current: DisplayVersion,
    pub pending: DisplayVersion,
    pub status_code: u8,
    pub percent_complete: u8,
}

impl FirmwareImageStatus {
    pub const SIZE: usize = 20;

    pub fn decode(reader: &mut TableReader<'_>) -> Result<Self> {
        let rcd: FirmwareImageRcd = reader.parse(Self::SIZE, FirmwareImageRcd::parse)?;
        Ok(Self {
            device: Eui64(rcd.device),
            image_type: rcd.image_type,
            current: DisplayVersion::from_raw(rcd.current),
            pending: DisplayVersion::from_raw(rcd.pending),
            status_code: rcd.status,
            percent_complete: rcd.percent,
        })
    }

    pub fn status(&self) -> Option<UpgradeStatus> {
        UpgradeStatus::try_from(self.status_code).ok()
    }
} // }}}

// {{{ RegisteredDevice
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RegisteredDevice {
    pub eui: Eui64,
    pub device_type: u8,
    /// Join state in the high nibble, link quality in the low nibble.
    pub status: u8,
    /// Exactly the length-prefixed ISO 8859/1 bytes, padding kept. Characters
    /// above U+00FF are written as `?`.
    pub name: String,
    pub clusters: Vec<u16>,
}

impl RegisteredDevice {
    pub fn join_state(&self) -> u8 {
        bits::high_nibble(self.status)
    }

    pub fn link_quality(&self) -> u8 {
        bits::low_nibble(self.status)
    }

    pub fn set_join_state(&mut self, state: u8) {
        self.status = bits::with_high_nibble(self.status, state);
    }

    pub fn set_link_quality(&mut self, quality: u8) {
        self.status = bits::with_low_nibble(self.status, quality);
    }

    pub fn encoded_len(&self) -> usize {
        8 + 1 + 1 + 1 + self.name.chars().count() + 1 + 2 * self.clusters.len()
    }

    pub fn decode(reader: &mut TableReader<'_>) -> Result<Self> {
        let eui = Eui64(reader.read_u64()?);
        let device_type = reader.read_u8()?;
        let status = reader.read_u8()?;
        let name_len = usize::from(reader.read_u8()?);
        let name = reader.read_latin1(name_len)?;
        let cluster_count = usize::from(reader.read_u8()?);
        let clusters = (0..cluster_count)
            .map(|_| reader.read_u16())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            eui,
            device_type,
            status,
            name,
            clusters,
        })
    }

    pub fn encode(&self, writer: &mut TableWriter) -> Result<()> {
        let name_len = u8::try_from(self.name.chars().count()).map_err(|_| Error::InvalidValue {
            field: "device name",
            value: self.name.clone(),
        })?;
        let cluster_count = u8::try_from(self.clusters.len()).map_err(|_| Error::InvalidValue {
            field: "cluster count",
            value: self.clusters.len().to_string(),
        })?;
        writer.write_u64(self.eui.0);
        writer.write_u8(self.device_type);
        writer.write_u8(self.status);
        writer.write_u8(name_len);
        writer.write_string(&self.name, usize::from(name_len));
        writer.write_u8(cluster_count);
        for cluster in &self.clusters {
            writer.write_u16(*cluster);
        }
        Ok(())
    }
} // }}}

// {{{ DrlcEvent
/// Demand response / load control event slot.
///
/// `None` fields hold the protocol's "not used" value on the wire.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DrlcEvent {
    pub issuer_event_id: u32,
    pub device_class: u16,
    pub enrollment_group: u8,
    /// `None` starts the event immediately.
    pub start_time: Option<NaiveDateTime>,
    pub duration_minutes: u16,
    pub criticality: u8,
    pub cooling_offset: Option<u8>,
    pub heating_offset: Option<u8>,
    pub cooling_setpoint: Option<i16>,
    pub heating_setpoint: Option<i16>,
    pub load_adjustment: Option<i8>,
    pub duty_cycle: Option<u8>,
    pub event_control: u8,
}

impl DrlcEvent {
    pub const EMPTY_ID: u32 = u32::MAX;
    const OFFSET_NONE: u8 = 0xFF;
    const SETPOINT_NONE: i16 = i16::MIN;
    const ADJUSTMENT_NONE: i8 = i8::MIN;
    const DUTY_CYCLE_NONE: u8 = 0xFF;
    const RANDOMIZE_START_BIT: u32 = 0;
    const RANDOMIZE_END_BIT: u32 = 1;

    pub fn layout(format: TimeFormat) -> Layout {
        Layout::new()
            .field("issuer_event_id", 4)
            .field("device_class", 2)
            .field("enrollment_group", 1)
            .field("start_time", format.stime_size())
            .field("duration", 2)
            .field("criticality", 1)
            .field("cooling_offset", 1)
            .field("heating_offset", 1)
            .field("cooling_setpoint", 2)
            .field("heating_setpoint", 2)
            .field("load_adjustment", 1)
            .field("duty_cycle", 1)
            .field("event_control", 1)
    }

    pub fn randomize_start(&self) -> bool {
        bits::is_set(u32::from(self.event_control), Self::RANDOMIZE_START_BIT)
    }

    pub fn randomize_end(&self) -> bool {
        bits::is_set(u32::from(self.event_control), Self::RANDOMIZE_END_BIT)
    }

    pub fn set_randomize_start(&mut self, on: bool) {
        self.event_control = bits::with_bit(u32::from(self.event_control), Self::RANDOMIZE_START_BIT, on) as u8;
    }

    pub fn set_randomize_end(&mut self, on: bool) {
        self.event_control = bits::with_bit(u32::from(self.event_control), Self::RANDOMIZE_END_BIT, on) as u8;
    }

    /// Reads one slot. A slot whose issuer id is all ones is empty and its
    /// remaining bytes are skipped.
    pub fn decode(reader: &mut TableReader<'_>, format: TimeFormat) -> Result<Option<Self>> {
        let issuer_event_id = reader.read_u32()?;
        if issuer_event_id == Self::EMPTY_ID {
            reader.skip(Self::layout(format).size() - 4)?;
            return Ok(None);
        }

        Ok(Some(Self {
            issuer_event_id,
            device_class: reader.read_u16()?,
            enrollment_group: reader.read_u8()?,
            start_time: format.read_stime(reader)?,
            duration_minutes: reader.read_u16()?,
            criticality: reader.read_u8()?,
            cooling_offset: sentinel(reader.read_u8()?, Self::OFFSET_NONE),
            heating_offset: sentinel(reader.read_u8()?, Self::OFFSET_NONE),
            cooling_setpoint: sentinel(reader.read_i16()?, Self::SETPOINT_NONE),
            heating_setpoint: sentinel(reader.read_i16()?, Self::SETPOINT_NONE),
            load_adjustment: sentinel(reader.read_i8()?, Self::ADJUSTMENT_NONE),
            duty_cycle: sentinel(reader.read_u8()?, Self::DUTY_CYCLE_NONE),
            event_control: reader.read_u8()?,
        }))
    }

    pub fn encode(&self, writer: &mut TableWriter, format: TimeFormat) -> Result<()> {
        if self.issuer_event_id == Self::EMPTY_ID {
            return Err(Error::InvalidValue {
                field: "issuer event id",
                value: format!("{:#x}", self.issuer_event_id),
            });
        }
        writer.write_u32(self.issuer_event_id);
        writer.write_u16(self.device_class);
        writer.write_u8(self.enrollment_group);
        format.write_stime(writer, self.start_time)?;
        writer.write_u16(self.duration_minutes);
        writer.write_u8(self.criticality);
        writer.write_u8(self.cooling_offset.unwrap_or(Self::OFFSET_NONE));
        writer.write_u8(self.heating_offset.unwrap_or(Self::OFFSET_NONE));
        writer.write_i16(self.cooling_setpoint.unwrap_or(Self::SETPOINT_NONE));
        writer.write_i16(self.heating_setpoint.unwrap_or(Self::SETPOINT_NONE));
        writer.write_i8(self.load_adjustment.unwrap_or(Self::ADJUSTMENT_NONE));
        writer.write_u8(self.duty_cycle.unwrap_or(Self::DUTY_CYCLE_NONE));
        writer.write_u8(self.event_control);
        Ok(())
    }

    /// Writes an empty slot.
    pub fn encode_empty(writer: &mut TableWriter, format: TimeFormat) {
        writer.write_bytes(&vec![0xFF; Self::layout(format).size()]);
    }
} // }}}

// {{{ DrlcLogEntry
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive, Serialize)]
#[repr(u8)]
pub enum DrlcEventStatus {
    Received = 0x01,
    Started = 0x02,
    Completed = 0x03,
    OptedOut = 0x04,
    OptedIn = 0x05,
    Cancelled = 0x06,
    Superseded = 0x07,
    PartiallyOptedOut = 0x08,
    PartiallyOptedIn = 0x09,
    CompletedNoParticipation = 0x0A,
    Rejected = 0xF8,
    InvalidCancelCommand = 0xF9,
    InvalidEffectiveTime = 0xFB,
    Expired = 0xFD,
    Undefined = 0xFE,
}

/// Logged DRLC event: the event slot followed by its status and status time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DrlcLogEntry {
    pub event: DrlcEvent,
    pub status_code: u8,
    pub status_time: Option<NaiveDateTime>,
}

impl DrlcLogEntry {
    pub fn layout(format: TimeFormat) -> Layout {
        DrlcEvent::layout(format).extend(
            Layout::new()
                .field("status", 1)
                .field("status_time", format.stime_size()),
        )
    }

    pub fn status(&self) -> Option<DrlcEventStatus> {
        DrlcEventStatus::try_from(self.status_code).ok()
    }

    pub fn decode(reader: &mut TableReader<'_>, format: TimeFormat) -> Result<Option<Self>> {
        let event = DrlcEvent::decode(reader, format)?;
        let status_code = reader.read_u8()?;
        let status_time = match event {
            Some(_) => format.read_stime(reader)?,
            None => {
                reader.skip(format.stime_size())?;
                None
            }
        };
        Ok(event.map(|event| Self {
            event,
            status_code,
            status_time,
        }))
    }
} // }}}
