use crate::prelude::*;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// TM_FORMAT from GEN_CONFIG_TBL FORMAT_CONTROL_2, selecting how STIME_DATE and
/// LTIME_DATE fields are laid out on the wire.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive, Serialize)]
#[repr(u8)]
pub enum TimeFormat {
    /// No clock; time fields are zero width.
    None = 0,
    /// BCD YY MM DD HH MM [SS]
    Bcd = 1,
    /// UINT8 YY MM DD HH MM [SS]
    #[default]
    Packed = 2,
    /// UINT32 minutes since 1970-01-01 [+ UINT8 seconds]
    Minutes = 3,
    /// UINT32 seconds since 1970-01-01
    Seconds = 4,
}

impl TimeFormat {
    /// Width of an STIME_DATE field.
    pub const fn stime_size(self) -> usize {
        match self {
            TimeFormat::None => 0,
            TimeFormat::Bcd | TimeFormat::Packed => 5,
            TimeFormat::Minutes | TimeFormat::Seconds => 4,
        }
    }

    /// Width of an LTIME_DATE field.
    pub const fn ltime_size(self) -> usize {
        match self {
            TimeFormat::None => 0,
            TimeFormat::Bcd | TimeFormat::Packed => 6,
            TimeFormat::Minutes => 5,
            TimeFormat::Seconds => 4,
        }
    }

    /// Reads an STIME_DATE. An all-zero field means "no time" and reads as `None`.
    pub fn read_stime(self, reader: &mut TableReader<'_>) -> Result<Option<NaiveDateTime>> {
        self.read(reader, false)
    }

    /// Reads an LTIME_DATE. An all-zero field means "no time" and reads as `None`.
    pub fn read_ltime(self, reader: &mut TableReader<'_>) -> Result<Option<NaiveDateTime>> {
        self.read(reader, true)
    }

    /// Writes an STIME_DATE. The minutes format has no seconds field, so seconds
    /// are dropped. The epoch instant is rejected under the minutes and seconds
    /// formats, where it would read back as `None`.
    pub fn write_stime(self, writer: &mut TableWriter, value: Option<NaiveDateTime>) -> Result<()> {
        self.write(writer, value, false)
    }

    /// Writes an LTIME_DATE. The epoch instant is rejected under the minutes and
    /// seconds formats, where it would read back as `None`.
    pub fn write_ltime(self, writer: &mut TableWriter, value: Option<NaiveDateTime>) -> Result<()> {
        self.write(writer, value, true)
    }

    fn read(self, reader: &mut TableReader<'_>, long: bool) -> Result<Option<NaiveDateTime>> {
        match self {
            TimeFormat::None => Ok(None),
            TimeFormat::Bcd | TimeFormat::Packed => {
                let count = if long { 6 } else { 5 };
                let raw = reader.read_bytes(count)?;
                if raw.iter().all(|b| *b == 0) {
                    return Ok(None);
                }
                let mut fields = [0u32; 6];
                for (slot, byte) in fields.iter_mut().zip(raw) {
                    *slot = if self == TimeFormat::Bcd {
                        Self::from_bcd(*byte)?
                    } else {
                        u32::from(*byte)
                    };
                }
                let [yy, month, day, hour, minute, second] = fields;
                let year = if yy < 70 { 2000 + yy } else { 1900 + yy };
                NaiveDate::from_ymd_opt(year as i32, month, day)
                    .and_then(|d| d.and_hms_opt(hour, minute, second))
                    .map(Some)
                    .ok_or_else(|| Error::InvalidValue {
                        field: "date/time",
                        value: format!("{:02x?}", raw),
                    })
            }
            TimeFormat::Minutes => {
                let minutes = reader.read_u32()?;
                let seconds = if long { reader.read_u8()? } else { 0 };
                if minutes == 0 && seconds == 0 {
                    return Ok(None);
                }
                Self::from_epoch(i64::from(minutes) * 60 + i64::from(seconds)).map(Some)
            }
            TimeFormat::Seconds => match reader.read_u32()? {
                0 => Ok(None),
                seconds => Self::from_epoch(i64::from(seconds)).map(Some),
            },
        }
    }

    fn write(self, writer: &mut TableWriter, value: Option<NaiveDateTime>, long: bool) -> Result<()> {
        let width = if long { self.ltime_size() } else { self.stime_size() };
        let Some(value) = value else {
            writer.write_zeros(width);
            return Ok(());
        };

        match self {
            TimeFormat::None => Ok(()),
            TimeFormat::Bcd | TimeFormat::Packed => {
                let year = value.year();
                if !(1970..2070).contains(&year) {
                    return Err(Error::InvalidValue {
                        field: "year",
                        value: year.to_string(),
                    });
                }
                let fields = [
                    (year % 100) as u8,
                    value.month() as u8,
                    value.day() as u8,
                    value.hour() as u8,
                    value.minute() as u8,
                    value.second() as u8,
                ];
                for field in &fields[..width] {
                    let byte = if self == TimeFormat::Bcd {
                        bits::pack_nibbles(field / 10, field % 10)
                    } else {
                        *field
                    };
                    writer.write_u8(byte);
                }
                Ok(())
            }
            TimeFormat::Minutes => {
                let seconds = Self::to_epoch(value)?;
                let (minutes, rest) = (seconds / 60, seconds % 60);
                if minutes == 0 && (!long || rest == 0) {
                    return Err(Self::epoch_error(value));
                }
                writer.write_u32(minutes as u32);
                if long {
                    writer.write_u8(rest as u8);
                }
                Ok(())
            }
            TimeFormat::Seconds => {
                let seconds = Self::to_epoch(value)?;
                if seconds == 0 {
                    return Err(Self::epoch_error(value));
                }
                writer.write_u32(seconds as u32);
                Ok(())
            }
        }
    }

    fn epoch_error(value: NaiveDateTime) -> Error {
        Error::InvalidValue {
            field: "date/time",
            value: format!("{} encodes as no time", value),
        }
    }

    fn from_bcd(byte: u8) -> Result<u32> {
        let (high, low) = bits::unpack_nibbles(byte);
        if high > 9 || low > 9 {
            return Err(Error::InvalidValue {
                field: "bcd time",
                value: format!("{:#04x}", byte),
            });
        }
        Ok(u32::from(high) * 10 + u32::from(low))
    }

    fn from_epoch(seconds: i64) -> Result<NaiveDateTime> {
        DateTime::from_timestamp(seconds, 0)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| Error::InvalidValue {
                field: "epoch seconds",
                value: seconds.to_string(),
            })
    }

    fn to_epoch(value: NaiveDateTime) -> Result<u64> {
        let seconds = value.and_utc().timestamp();
        if !(0..=i64::from(u32::MAX)).contains(&seconds) {
            return Err(Error::InvalidValue {
                field: "epoch seconds",
                value: seconds.to_string(),
            });
        }
        Ok(seconds as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    #[test]
    fn widths_follow_format() {
        assert_eq!(TimeFormat::Bcd.stime_size(), 5);
        assert_eq!(TimeFormat::Bcd.ltime_size(), 6);
        assert_eq!(TimeFormat::Minutes.ltime_size(), 5);
        assert_eq!(TimeFormat::Seconds.stime_size(), 4);
        assert_eq!(TimeFormat::None.ltime_size(), 0);
    }

    #[test]
    fn bcd_ltime_decodes() -> Result<()> {
        let data = [0x24, 0x03, 0x15, 0x13, 0x45, 0x30];
        let mut reader = TableReader::new(&data);
        assert_eq!(TimeFormat::Bcd.read_ltime(&mut reader)?, Some(at(2024, 3, 15, 13, 45, 30)));
        Ok(())
    }

    #[test]
    fn seconds_since_epoch_decodes() -> Result<()> {
        let data = 1_700_000_000u32.to_le_bytes();
        let mut reader = TableReader::new(&data);
        assert_eq!(TimeFormat::Seconds.read_stime(&mut reader)?, Some(at(2023, 11, 14, 22, 13, 20)));
        Ok(())
    }

    #[test]
    fn zero_is_no_time() -> Result<()> {
        let data = [0u8; 6];
        for format in [TimeFormat::Bcd, TimeFormat::Packed, TimeFormat::Minutes, TimeFormat::Seconds] {
            let mut reader = TableReader::new(&data);
            assert_eq!(format.read_ltime(&mut reader)?, None);
            assert_eq!(reader.position(), format.ltime_size());
        }
        Ok(())
    }

    #[test]
    fn every_format_round_trips() -> Result<()> {
        let when = at(2031, 12, 31, 23, 59, 0);
        for format in [TimeFormat::Bcd, TimeFormat::Packed, TimeFormat::Minutes, TimeFormat::Seconds] {
            let mut writer = TableWriter::new();
            format.write_stime(&mut writer, Some(when))?;
            format.write_ltime(&mut writer, Some(when))?;
            assert_eq!(writer.len(), format.stime_size() + format.ltime_size());

            let mut reader = TableReader::new(writer.as_slice());
            assert_eq!(format.read_stime(&mut reader)?, Some(when));
            assert_eq!(format.read_ltime(&mut reader)?, Some(when));
        }
        Ok(())
    }

    #[test]
    fn minutes_stime_drops_seconds() -> Result<()> {
        let mut writer = TableWriter::new();
        TimeFormat::Minutes.write_stime(&mut writer, Some(at(2024, 3, 15, 13, 45, 30)))?;
        let mut reader = TableReader::new(writer.as_slice());
        assert_eq!(TimeFormat::Minutes.read_stime(&mut reader)?, Some(at(2024, 3, 15, 13, 45, 0)));
        Ok(())
    }

    #[test]
    fn epoch_instant_is_rejected_where_it_means_no_time() -> Result<()> {
        let epoch = at(1970, 1, 1, 0, 0, 0);
        for format in [TimeFormat::Minutes, TimeFormat::Seconds] {
            let mut writer = TableWriter::new();
            assert!(matches!(
                format.write_stime(&mut writer, Some(epoch)),
                Err(Error::InvalidValue { .. })
            ));
            assert!(matches!(
                format.write_ltime(&mut writer, Some(epoch)),
                Err(Error::InvalidValue { .. })
            ));
        }

        // seconds past the epoch still fit the long minutes form
        let mut writer = TableWriter::new();
        TimeFormat::Minutes.write_ltime(&mut writer, Some(at(1970, 1, 1, 0, 0, 5)))?;
        let mut reader = TableReader::new(writer.as_slice());
        assert_eq!(TimeFormat::Minutes.read_ltime(&mut reader)?, Some(at(1970, 1, 1, 0, 0, 5)));

        let mut writer = TableWriter::new();
        TimeFormat::Packed.write_stime(&mut writer, Some(epoch))?;
        let mut reader = TableReader::new(writer.as_slice());
        assert_eq!(TimeFormat::Packed.read_stime(&mut reader)?, Some(epoch));
        Ok(())
    }

    #[test]
    fn invalid_packed_date_is_rejected() {
        let data = [24, 13, 1, 0, 0];
        let mut reader = TableReader::new(&data);
        assert!(TimeFormat::Packed.read_stime(&mut reader).is_err());
    }
}
