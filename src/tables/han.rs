//! Home area network tables (MT50..MT56).

use crate::prelude::*;
use crate::version::{select_by_version, HW_3_6, LITHIUM, SP5, SP5_1};

use serde::ser::SerializeStruct;

// {{{ HanDimensionLimits
/// Which optional sections the dimension limits table carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DimensionFormat {
    Base,
    Sp5,
    Mesh,
}

impl DimensionFormat {
    fn for_version(tag: &VersionTag) -> Self {
        let formats = [
            (Threshold::NONE, DimensionFormat::Base),
            (Threshold::firmware(SP5), DimensionFormat::Sp5),
            (Threshold::both(LITHIUM, HW_3_6), DimensionFormat::Mesh),
        ];
        select_by_version(tag, &formats).unwrap_or(DimensionFormat::Base)
    }
}

/// HAN dimension limits (MT50). Sized 11, 15 or 16 bytes by firmware and hardware.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct HanDimensionLimits {
    pub max_han_clients: u8,
    pub client_data_size: u16,
    pub max_drlc_events: u8,
    pub max_drlc_log_entries: u8,
    pub max_price_tiers: u8,
    pub max_messages: u8,
    pub max_message_length: u16,
    pub max_pending_events: u8,
    pub max_fw_images: u8,
    pub fw_block_size: Option<u16>,
    pub max_meter_events: Option<u8>,
    pub max_bindings: Option<u8>,
    pub max_mesh_neighbors: Option<u8>,
}

impl HanDimensionLimits {
    pub const DEFAULT_FW_BLOCK_SIZE: u16 = 64;

    pub fn fw_block_size(&self) -> u16 {
        self.fw_block_size.unwrap_or(Self::DEFAULT_FW_BLOCK_SIZE)
    }

    pub fn max_meter_events(&self) -> u8 {
        self.max_meter_events.unwrap_or(0)
    }

    /// Bindings the radio reports it can hold, or the client slot count on
    /// firmware that does not report it. MT52 itself always has
    /// `max_han_clients` slots.
    pub fn max_bindings(&self) -> u8 {
        self.max_bindings.unwrap_or(self.max_han_clients)
    }

    pub fn max_mesh_neighbors(&self) -> u8 {
        self.max_mesh_neighbors.unwrap_or(0)
    }
}

impl TableDecode for HanDimensionLimits {
    const TABLE: TableId = TableId::manufacturer(50);

    type Params = VersionTag;

    fn layout(tag: &VersionTag) -> Option<Layout> {
        let format = DimensionFormat::for_version(tag);
        let sp5 = format != DimensionFormat::Base;
        Some(
            Layout::new()
                .field("max_han_clients", 1)
                .field("client_data_size", 2)
                .field("max_drlc_events", 1)
                .field("max_drlc_log_entries", 1)
                .field("max_price_tiers", 1)
                .field("max_messages", 1)
                .field("max_message_length", 2)
                .field("max_pending_events", 1)
                .field("max_fw_images", 1)
                .optional("fw_block_size", 2, sp5)
                .optional("max_meter_events", 1, sp5)
                .optional("max_bindings", 1, sp5)
                .optional("max_mesh_neighbors", 1, format == DimensionFormat::Mesh),
        )
    }

    fn decode(reader: &mut TableReader<'_>, tag: &VersionTag) -> Result<Self> {
        let layout = Self::layout(tag).unwrap_or_default();
        let mut limits = Self {
            max_han_clients: reader.read_u8()?,
            client_data_size: reader.read_u16()?,
            max_drlc_events: reader.read_u8()?,
            max_drlc_log_entries: reader.read_u8()?,
            max_price_tiers: reader.read_u8()?,
            max_messages: reader.read_u8()?,
            max_message_length: reader.read_u16()?,
            max_pending_events: reader.read_u8()?,
            max_fw_images: reader.read_u8()?,
            ..Default::default()
        };
        if layout.contains("fw_block_size") {
            limits.fw_block_size = Some(reader.read_u16()?);
        }
        if layout.contains("max_meter_events") {
            limits.max_meter_events = Some(reader.read_u8()?);
        }
        if layout.contains("max_bindings") {
            limits.max_bindings = Some(reader.read_u8()?);
        }
        if layout.contains("max_mesh_neighbors") {
            limits.max_mesh_neighbors = Some(reader.read_u8()?);
        }
        Ok(limits)
    }
} // }}}

// {{{ HanConfiguration
/// HAN configuration (MT51). Firmware SP5.1 and later append the metering
/// multiplier and divisor.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct HanConfiguration {
    pub pan_id: u16,
    pub extended_pan_id: u64,
    pub channel_mask: u32,
    pub security_level: u8,
    pub startup_control: u8,
    pub permit_join_seconds: u8,
    /// Power source high nibble, power mode low nibble.
    pub power_config: u8,
    pub key_refresh_days: u16,
    pub time_sync_interval: u32,
    pub metering_device_type: u8,
    pub unit_of_measure: u8,
    /// Digits left of the decimal point high nibble, digits right low nibble.
    pub summation_formatting: u8,
    pub multiplier: Option<u32>,
    pub divisor: Option<u32>,
}

impl HanConfiguration {
    pub fn power_source(&self) -> u8 {
        bits::high_nibble(self.power_config)
    }

    pub fn power_mode(&self) -> u8 {
        bits::low_nibble(self.power_config)
    }

    pub fn set_power_source(&mut self, source: u8) {
        self.power_config = bits::with_high_nibble(self.power_config, source);
    }

    pub fn set_power_mode(&mut self, mode: u8) {
        self.power_config = bits::with_low_nibble(self.power_config, mode);
    }

    pub fn summation_digits(&self) -> (u8, u8) {
        bits::unpack_nibbles(self.summation_formatting)
    }

    pub fn set_summation_digits(&mut self, left: u8, right: u8) {
        self.summation_formatting = bits::pack_nibbles(left, right);
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier.unwrap_or(1)
    }

    pub fn divisor(&self) -> u32 {
        self.divisor.unwrap_or(1)
    }
}

impl TableDecode for HanConfiguration {
    const TABLE: TableId = TableId::manufacturer(51);

    type Params = VersionTag;

    fn layout(tag: &VersionTag) -> Option<Layout> {
        let metering = tag.meets(Threshold::firmware(SP5_1));
        Some(
            Layout::new()
                .field("pan_id", 2)
                .field("extended_pan_id", 8)
                .field("channel_mask", 4)
                .field("security_level", 1)
                .field("startup_control", 1)
                .field("permit_join_seconds", 1)
                .field("power_config", 1)
                .field("key_refresh_days", 2)
                .field("time_sync_interval", 4)
                .field("metering_device_type", 1)
                .field("unit_of_measure", 1)
                .field("summation_formatting", 1)
                .optional("multiplier", 4, metering)
                .optional("divisor", 4, metering),
        )
    }

    fn decode(reader: &mut TableReader<'_>, tag: &VersionTag) -> Result<Self> {
        let layout = Self::layout(tag).unwrap_or_default();
        let mut config = Self {
            pan_id: reader.read_u16()?,
            extended_pan_id: reader.read_u64()?,
            channel_mask: reader.read_u32()?,
            security_level: reader.read_u8()?,
            startup_control: reader.read_u8()?,
            permit_join_seconds: reader.read_u8()?,
            power_config: reader.read_u8()?,
            key_refresh_days: reader.read_u16()?,
            time_sync_interval: reader.read_u32()?,
            metering_device_type: reader.read_u8()?,
            unit_of_measure: reader.read_u8()?,
            summation_formatting: reader.read_u8()?,
            ..Default::default()
        };
        if layout.contains("multiplier") {
            config.multiplier = Some(reader.read_u32()?);
        }
        if layout.contains("divisor") {
            config.divisor = Some(reader.read_u32()?);
        }
        Ok(config)
    }
}

impl TableEncode for HanConfiguration {
    fn encode(&self, writer: &mut TableWriter, tag: &VersionTag) -> Result<()> {
        let layout = Self::layout(tag).unwrap_or_default();
        writer.write_u16(self.pan_id);
        writer.write_u64(self.extended_pan_id);
        writer.write_u32(self.channel_mask);
        writer.write_u8(self.security_level);
        writer.write_u8(self.startup_control);
        writer.write_u8(self.permit_join_seconds);
        writer.write_u8(self.power_config);
        writer.write_u16(self.key_refresh_days);
        writer.write_u32(self.time_sync_interval);
        writer.write_u8(self.metering_device_type);
        writer.write_u8(self.unit_of_measure);
        writer.write_u8(self.summation_formatting);
        if layout.contains("multiplier") {
            writer.write_u32(self.multiplier());
        }
        if layout.contains("divisor") {
            writer.write_u32(self.divisor());
        }
        Ok(())
    }
} // }}}

/// Number of client slots, from `HanDimensionLimits::max_han_clients`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ClientSlots {
    pub max_clients: usize,
}

impl ClientSlots {
    pub fn new(max_clients: usize) -> Self {
        Self { max_clients }
    }
}

// {{{ HanBindings
/// HAN client bindings (MT52). Unassigned slots stay in place but are not
/// reported by `bindings()`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HanBindings {
    slots: Vec<Binding>,
}

impl HanBindings {
    pub fn new(slots: Vec<Binding>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[Binding] {
        &self.slots
    }

    pub fn bindings(&self) -> Vec<Binding> {
        self.slots.iter().filter(|b| !b.address.is_unassigned()).copied().collect()
    }

    pub fn set_slot(&mut self, index: usize, binding: Binding) -> Result<()> {
        let slots = self.slots.len();
        let slot = self.slots.get_mut(index).ok_or_else(|| Error::InvalidValue {
            field: "binding slot",
            value: format!("{} of {}", index, slots),
        })?;
        *slot = binding;
        Ok(())
    }

    pub fn clear_slot(&mut self, index: usize) -> Result<()> {
        self.set_slot(index, Binding::unassigned())
    }
}

impl Serialize for HanBindings {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("HanBindings", 2)?;
        state.serialize_field("slots", &self.slots.len())?;
        state.serialize_field("bindings", &self.bindings())?;
        state.end()
    }
}

impl TableDecode for HanBindings {
    const TABLE: TableId = TableId::manufacturer(52);

    type Params = ClientSlots;

    fn layout(params: &ClientSlots) -> Option<Layout> {
        Some(Layout::new().repeated("binding", Binding::SIZE, params.max_clients))
    }

    fn decode(reader: &mut TableReader<'_>, params: &ClientSlots) -> Result<Self> {
        let slots = (0..params.max_clients)
            .map(|_| Binding::decode(reader))
            .collect::<Result<Vec<_>>>()?;
        let unassigned = slots.iter().filter(|b| b.address.is_unassigned()).count();
        if unassigned > 0 {
            debug!("{} of {} binding slots unassigned", unassigned, slots.len());
        }
        Ok(Self { slots })
    }
}

impl TableEncode for HanBindings {
    fn encode(&self, writer: &mut TableWriter, params: &ClientSlots) -> Result<()> {
        if self.slots.len() != params.max_clients {
            return Err(schema_error!(
                Self::TABLE,
                "{} binding slots for {} clients",
                self.slots.len(),
                params.max_clients
            ));
        }
        for binding in &self.slots {
            binding.encode(writer);
        }
        Ok(())
    }
} // }}}

// {{{ HanClientData
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ClientDataParams {
    pub max_clients: usize,
    pub client_data_size: usize,
}

/// Per-client data records (MT53), each carrying a payload sized by MT50.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct HanClientData {
    pub records: Vec<ClientDataRecord>,
}

impl HanClientData {
    pub fn assigned(&self) -> impl Iterator<Item = &ClientDataRecord> {
        self.records.iter().filter(|r| !r.eui.is_unassigned())
    }
}

impl TableDecode for HanClientData {
    const TABLE: TableId = TableId::manufacturer(53);

    type Params = ClientDataParams;

    fn layout(params: &ClientDataParams) -> Option<Layout> {
        Some(Layout::new().repeated(
            "client_data",
            ClientDataRecord::size(params.client_data_size),
            params.max_clients,
        ))
    }

    fn decode(reader: &mut TableReader<'_>, params: &ClientDataParams) -> Result<Self> {
        let records = (0..params.max_clients)
            .map(|_| ClientDataRecord::decode(reader, params.client_data_size))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { records })
    }
}

impl TableEncode for HanClientData {
    fn encode(&self, writer: &mut TableWriter, params: &ClientDataParams) -> Result<()> {
        if self.records.len() != params.max_clients {
            return Err(schema_error!(
                Self::TABLE,
                "{} client records for {} clients",
                self.records.len(),
                params.max_clients
            ));
        }
        for record in &self.records {
            record.encode(writer, params.client_data_size)?;
        }
        Ok(())
    }
} // }}}

// {{{ HanModuleInfo
/// HAN radio module information (MT54).
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct HanModuleInfo {
    pub radio_firmware: DisplayVersion,
    pub stack_version: ShortVersion,
    pub bootloader_version: ShortVersion,
    pub hardware_id: u8,
    pub mac_address: Eui64,
    pub channel: u8,
    pub pan_id: u16,
    /// Transmit power high nibble, receive sensitivity low nibble.
    pub radio_power: u8,
}

impl HanModuleInfo {
    pub fn transmit_power(&self) -> u8 {
        bits::high_nibble(self.radio_power)
    }

    pub fn receive_sensitivity(&self) -> u8 {
        bits::low_nibble(self.radio_power)
    }
}

impl TableDecode for HanModuleInfo {
    const TABLE: TableId = TableId::manufacturer(54);

    type Params = ();

    fn layout(_: &()) -> Option<Layout> {
        Some(
            Layout::new()
                .field("radio_firmware", 4)
                .field("stack_version", 2)
                .field("bootloader_version", 2)
                .field("hardware_id", 1)
                .field("mac_address", 8)
                .field("channel", 1)
                .field("pan_id", 2)
                .field("radio_power", 1),
        )
    }

    fn decode(reader: &mut TableReader<'_>, _: &()) -> Result<Self> {
        Ok(Self {
            radio_firmware: DisplayVersion::from_raw(reader.read_u32()?),
            stack_version: ShortVersion::from_raw(reader.read_u16()?),
            bootloader_version: ShortVersion::from_raw(reader.read_u16()?),
            hardware_id: reader.read_u8()?,
            mac_address: Eui64(reader.read_u64()?),
            channel: reader.read_u8()?,
            pan_id: reader.read_u16()?,
            radio_power: reader.read_u8()?,
        })
    }
} // }}}

// {{{ HanDeviceRegistry
/// Devices registered with the HAN (MT55). A count byte followed by
/// variable-length device blocks; the table length is only known once read.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct HanDeviceRegistry {
    pub devices: Vec<RegisteredDevice>,
}

impl HanDeviceRegistry {
    pub fn encoded_len(&self) -> usize {
        1 + self.devices.iter().map(RegisteredDevice::encoded_len).sum::<usize>()
    }
}

impl TableDecode for HanDeviceRegistry {
    const TABLE: TableId = TableId::manufacturer(55);

    type Params = ();

    fn layout(_: &()) -> Option<Layout> {
        None
    }

    fn decode(reader: &mut TableReader<'_>, _: &()) -> Result<Self> {
        let count = reader.read_u8()?;
        let devices = (0..count)
            .map(|_| RegisteredDevice::decode(reader))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { devices })
    }
}

impl TableEncode for HanDeviceRegistry {
    fn encode(&self, writer: &mut TableWriter, _: &()) -> Result<()> {
        let count = u8::try_from(self.devices.len())
            .map_err(|_| schema_error!(Self::TABLE, "{} devices do not fit a count byte", self.devices.len()))?;
        writer.write_u8(count);
        for device in &self.devices {
            device.encode(writer)?;
        }
        Ok(())
    }
} // }}}

// {{{ HanFirmwareStatus
/// Firmware image status per client (MT56). Unassigned slots are dropped.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct HanFirmwareStatus {
    pub images: Vec<FirmwareImageStatus>,
}

impl TableDecode for HanFirmwareStatus {
    const TABLE: TableId = TableId::manufacturer(56);

    type Params = ClientSlots;

    fn layout(params: &ClientSlots) -> Option<Layout> {
        Some(Layout::new().repeated("image_status", FirmwareImageStatus::SIZE, params.max_clients))
    }

    fn decode(reader: &mut TableReader<'_>, params: &ClientSlots) -> Result<Self> {
        let mut images = Vec::with_capacity(params.max_clients);
        for _ in 0..params.max_clients {
            let image = FirmwareImageStatus::decode(reader)?;
            if !image.device.is_unassigned() {
                images.push(image);
            }
        }
        Ok(Self { images })
    }
} // }}}
