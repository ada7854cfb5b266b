use crate::prelude::*;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HostMeterParams {
    /// GE host meters carry a trailing options byte.
    pub ge_meter: bool,
}

/// Host meter configuration (MT142).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HostMeterConfig {
    pub host_meter_type: u8,
    pub register_multiplier: u32,
    pub ct_ratio: f32,
    pub pt_ratio: f32,
    pub kh: f64,
    pub demand_interval_minutes: u8,
    pub flags: u8,
    pub ge_options: Option<u8>,
}

impl HostMeterConfig {
    pub fn ge_options(&self) -> u8 {
        self.ge_options.unwrap_or(0)
    }

    pub fn bidirectional(&self) -> bool {
        bits::is_set(u32::from(self.flags), 0)
    }

    pub fn set_bidirectional(&mut self, on: bool) {
        self.flags = bits::with_bit(u32::from(self.flags), 0, on) as u8;
    }
}

impl TableDecode for HostMeterConfig {
    const TABLE: TableId = TableId::manufacturer(142);

    type Params = HostMeterParams;

    fn layout(params: &HostMeterParams) -> Option<Layout> {
        Some(
            Layout::new()
                .field("host_meter_type", 1)
                .field("register_multiplier", 3)
                .field("ct_ratio", 4)
                .field("pt_ratio", 4)
                .field("kh", 8)
                .field("demand_interval", 1)
                .field("flags", 1)
                .optional("ge_options", 1, params.ge_meter),
        )
    }

    fn decode(reader: &mut TableReader<'_>, params: &HostMeterParams) -> Result<Self> {
        let layout = Self::layout(params).unwrap_or_default();
        let mut config = Self {
            host_meter_type: reader.read_u8()?,
            register_multiplier: reader.read_u24()?,
            ct_ratio: reader.read_f32()?,
            pt_ratio: reader.read_f32()?,
            kh: reader.read_f64()?,
            demand_interval_minutes: reader.read_u8()?,
            flags: reader.read_u8()?,
            ge_options: None,
        };
        if layout.contains("ge_options") {
            config.ge_options = Some(reader.read_u8()?);
        }
        Ok(config)
    }
}

impl TableEncode for HostMeterConfig {
    fn encode(&self, writer: &mut TableWriter, params: &HostMeterParams) -> Result<()> {
        let layout = Self::layout(params).unwrap_or_default();
        writer.write_u8(self.host_meter_type);
        writer.write_u24(self.register_multiplier)?;
        writer.write_f32(self.ct_ratio);
        writer.write_f32(self.pt_ratio);
        writer.write_f64(self.kh);
        writer.write_u8(self.demand_interval_minutes);
        writer.write_u8(self.flags);
        if layout.contains("ge_options") {
            writer.write_u8(self.ge_options());
        }
        Ok(())
    }
}
