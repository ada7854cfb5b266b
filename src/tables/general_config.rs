use crate::prelude::*;

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, IntoPrimitive, TryFromPrimitive, Serialize)]
#[repr(u8)]
pub enum DataOrder {
    #[default]
    LittleEndian = 0,
    BigEndian = 1,
}

/// ID_FORM: how table 5 carries the device identification.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, IntoPrimitive, TryFromPrimitive, Serialize)]
#[repr(u8)]
pub enum IdForm {
    #[default]
    String = 0,
    Bcd = 1,
}

/// Bit set of table or procedure numbers, bit 0 of byte 0 being number 0.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TableSet(pub Vec<u8>);

impl TableSet {
    fn decode(reader: &mut TableReader<'_>, len: u8) -> Result<Self> {
        Ok(Self(reader.read_bytes(usize::from(len))?.to_vec()))
    }

    pub fn contains(&self, number: u16) -> bool {
        let byte = usize::from(number / 8);
        self.0
            .get(byte)
            .map_or(false, |b| bits::is_set(u32::from(*b), u32::from(number % 8)))
    }

    pub fn numbers(&self) -> Vec<u16> {
        (0..(self.0.len() * 8) as u16).filter(|n| self.contains(*n)).collect()
    }
}

impl Serialize for TableSet {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.numbers().serialize(serializer)
    }
}

// {{{ GeneralConfig
/// GEN_CONFIG_TBL (table 0). Its header fixes the length of the sets that follow.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeneralConfig {
    pub data_order: DataOrder,
    pub char_format: u8,
    pub time_format: TimeFormat,
    pub data_access_method: u8,
    pub id_form: IdForm,
    pub int_format: u8,
    /// NI_FORMAT1 low nibble, NI_FORMAT2 high nibble.
    pub ni_formats: u8,
    pub manufacturer: String,
    pub nameplate_type: u8,
    pub default_set_used: u8,
    pub max_proc_parm_length: u8,
    pub max_resp_data_len: u8,
    pub std_version: u8,
    pub std_revision: u8,
    pub dim_std_tables: u8,
    pub dim_mfg_tables: u8,
    pub dim_std_procs: u8,
    pub dim_mfg_procs: u8,
    pub dim_mfg_status: u8,
    pub nbr_pending: u8,
    pub std_tables_used: TableSet,
    pub mfg_tables_used: TableSet,
    pub std_procs_used: TableSet,
    pub mfg_procs_used: TableSet,
    pub mfg_status_used: TableSet,
    pub std_tables_write: TableSet,
    pub mfg_tables_write: TableSet,
}

impl GeneralConfig {
    pub const HEADER: usize = 19;

    pub fn ni_format1(&self) -> u8 {
        bits::low_nibble(self.ni_formats)
    }

    pub fn ni_format2(&self) -> u8 {
        bits::high_nibble(self.ni_formats)
    }

    pub fn std_table_used(&self, number: u16) -> bool {
        self.std_tables_used.contains(number)
    }

    pub fn mfg_table_used(&self, number: u16) -> bool {
        self.mfg_tables_used.contains(number)
    }

    pub fn table_used(&self, table: TableId) -> bool {
        if table.is_manufacturer() {
            self.mfg_table_used(table.number())
        } else {
            self.std_table_used(table.number())
        }
    }

    pub fn is_writable(&self, table: TableId) -> bool {
        if table.is_manufacturer() {
            self.mfg_tables_write.contains(table.number())
        } else {
            self.std_tables_write.contains(table.number())
        }
    }

    fn invalid(field: &'static str, value: u8) -> Error {
        Error::InvalidValue {
            field,
            value: value.to_string(),
        }
    }
}

impl TableDecode for GeneralConfig {
    const TABLE: TableId = TableId::standard(0);

    type Params = ();

    fn layout(_: &()) -> Option<Layout> {
        None
    }

    fn decode(reader: &mut TableReader<'_>, _: &()) -> Result<Self> {
        let control_1 = u32::from(reader.read_u8()?);
        let control_2 = u32::from(reader.read_u8()?);
        let ni_formats = reader.read_u8()?;

        let data_order = bits::get_field(control_1, 0x01, 0) as u8;
        let time_format = bits::get_field(control_2, 0x07, 0) as u8;
        let id_form = bits::get_field(control_2, 0x01, 5) as u8;

        let manufacturer = reader.read_string(4)?;
        let nameplate_type = reader.read_u8()?;
        let default_set_used = reader.read_u8()?;
        let max_proc_parm_length = reader.read_u8()?;
        let max_resp_data_len = reader.read_u8()?;
        let std_version = reader.read_u8()?;
        let std_revision = reader.read_u8()?;
        let dim_std_tables = reader.read_u8()?;
        let dim_mfg_tables = reader.read_u8()?;
        let dim_std_procs = reader.read_u8()?;
        let dim_mfg_procs = reader.read_u8()?;
        let dim_mfg_status = reader.read_u8()?;
        let nbr_pending = reader.read_u8()?;

        Ok(Self {
            data_order: DataOrder::try_from(data_order).map_err(|_| Self::invalid("data order", data_order))?,
            char_format: bits::get_field(control_1, 0x07, 1) as u8,
            time_format: TimeFormat::try_from(time_format).map_err(|_| Self::invalid("time format", time_format))?,
            data_access_method: bits::get_field(control_2, 0x03, 3) as u8,
            id_form: IdForm::try_from(id_form).map_err(|_| Self::invalid("id form", id_form))?,
            int_format: bits::get_field(control_2, 0x03, 6) as u8,
            ni_formats,
            manufacturer,
            nameplate_type,
            default_set_used,
            max_proc_parm_length,
            max_resp_data_len,
            std_version,
            std_revision,
            dim_std_tables,
            dim_mfg_tables,
            dim_std_procs,
            dim_mfg_procs,
            dim_mfg_status,
            nbr_pending,
            std_tables_used: TableSet::decode(reader, dim_std_tables)?,
            mfg_tables_used: TableSet::decode(reader, dim_mfg_tables)?,
            std_procs_used: TableSet::decode(reader, dim_std_procs)?,
            mfg_procs_used: TableSet::decode(reader, dim_mfg_procs)?,
            mfg_status_used: TableSet::decode(reader, dim_mfg_status)?,
            std_tables_write: TableSet::decode(reader, dim_std_tables)?,
            mfg_tables_write: TableSet::decode(reader, dim_mfg_tables)?,
        })
    }
} // }}}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_set_numbers() {
        let set = TableSet(vec![0b0010_0011, 0b0000_0100]);
        assert!(set.contains(0));
        assert!(set.contains(5));
        assert!(set.contains(10));
        assert!(!set.contains(2));
        assert!(!set.contains(100));
        assert_eq!(set.numbers(), vec![0, 1, 5, 10]);
    }
}
