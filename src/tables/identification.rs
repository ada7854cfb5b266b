use crate::prelude::*;
use crate::tables::IdForm;

use chrono::NaiveDateTime;

// {{{ ManufacturerIdentification
/// GEN_MFG_ID_TBL (table 1).
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ManufacturerIdentification {
    pub manufacturer: String,
    pub model: String,
    pub hardware: Revision,
    pub firmware: Revision,
    pub serial_number: String,
}

impl ManufacturerIdentification {
    pub fn version_tag(&self) -> VersionTag {
        VersionTag::new(self.firmware, self.hardware)
    }
}

impl TableDecode for ManufacturerIdentification {
    const TABLE: TableId = TableId::standard(1);

    type Params = ();

    fn layout(_: &()) -> Option<Layout> {
        Some(
            Layout::new()
                .field("manufacturer", 4)
                .field("model", 8)
                .field("hw_version", 1)
                .field("hw_revision", 1)
                .field("fw_version", 1)
                .field("fw_revision", 1)
                .field("serial_number", 16),
        )
    }

    fn decode(reader: &mut TableReader<'_>, _: &()) -> Result<Self> {
        let manufacturer = reader.read_string(4)?;
        let model = reader.read_string(8)?;
        let hardware = Revision::new(reader.read_u8()?, reader.read_u8()?);
        let firmware = Revision::new(reader.read_u8()?, reader.read_u8()?);
        let serial_number = reader.read_string(16)?;
        Ok(Self {
            manufacturer,
            model,
            hardware,
            firmware,
            serial_number,
        })
    }
} // }}}

// {{{ DeviceIdentification
/// DEVICE_IDENT_TBL (table 5): 20 characters, or 20 BCD digits when ID_FORM is set.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DeviceIdentification {
    pub identification: String,
}

impl DeviceIdentification {
    const CHARS: usize = 20;
    const BCD_BYTES: usize = 10;
}

impl TableDecode for DeviceIdentification {
    const TABLE: TableId = TableId::standard(5);

    type Params = IdForm;

    fn layout(form: &IdForm) -> Option<Layout> {
        let width = match form {
            IdForm::String => Self::CHARS,
            IdForm::Bcd => Self::BCD_BYTES,
        };
        Some(Layout::new().field("identification", width))
    }

    fn decode(reader: &mut TableReader<'_>, form: &IdForm) -> Result<Self> {
        let identification = match form {
            IdForm::String => reader.read_string(Self::CHARS)?,
            IdForm::Bcd => reader.read_bcd(Self::BCD_BYTES)?,
        };
        Ok(Self { identification })
    }
}

impl TableEncode for DeviceIdentification {
    fn encode(&self, writer: &mut TableWriter, form: &IdForm) -> Result<()> {
        match form {
            IdForm::String => writer.write_string(&self.identification, Self::CHARS),
            IdForm::Bcd => writer.write_bcd(&self.identification, Self::BCD_BYTES)?,
        }
        Ok(())
    }
} // }}}

// {{{ Clock
/// CLOCK_TBL (table 52).
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Clock {
    pub clock: Option<NaiveDateTime>,
    /// TIME_DATE_QUAL bit field.
    pub qualifier: u8,
}

impl Clock {
    fn qualifier_bit(&self, bit: u32) -> bool {
        bits::is_set(u32::from(self.qualifier), bit)
    }

    /// 0 is Sunday.
    pub fn day_of_week(&self) -> u8 {
        bits::get_field(u32::from(self.qualifier), 0x07, 0) as u8
    }

    pub fn dst(&self) -> bool {
        self.qualifier_bit(3)
    }

    pub fn gmt(&self) -> bool {
        self.qualifier_bit(4)
    }

    pub fn time_zone_applied(&self) -> bool {
        self.qualifier_bit(5)
    }

    pub fn dst_applied(&self) -> bool {
        self.qualifier_bit(6)
    }
}

impl TableDecode for Clock {
    const TABLE: TableId = TableId::standard(52);
    const TIMEOUT: Duration = Duration::from_secs(2);

    type Params = TimeFormat;

    fn layout(format: &TimeFormat) -> Option<Layout> {
        Some(
            Layout::new()
                .field("clock_calendar", format.ltime_size())
                .field("time_date_qual", 1),
        )
    }

    fn decode(reader: &mut TableReader<'_>, format: &TimeFormat) -> Result<Self> {
        Ok(Self {
            clock: format.read_ltime(reader)?,
            qualifier: reader.read_u8()?,
        })
    }
} // }}}
