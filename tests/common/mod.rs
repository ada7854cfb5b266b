#![allow(dead_code)]

use c1219_tables::prelude::*;
use c1219_tables::tables::*;
use c1219_tables::transport::MemoryTransport;

use chrono::{NaiveDate, NaiveDateTime};

pub struct Factory();
impl Factory {
    pub fn tag(firmware: (u8, u8), hardware: (u8, u8)) -> VersionTag {
        VersionTag::new(
            Revision::new(firmware.0, firmware.1),
            Revision::new(hardware.0, hardware.1),
        )
    }

    pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    // {{{ table 0
    pub const DIM_STD_TABLES: usize = 7;
    pub const DIM_MFG_TABLES: usize = 18;

    /// GEN_CONFIG_TBL for a little-endian GE meter listing every table as used.
    pub fn general_config(time_format: TimeFormat, id_form: IdForm) -> Vec<u8> {
        let mut data = vec![
            0x04, // char format ISO 8859/1
            u8::from(time_format) | (u8::from(id_form) << 5),
            0x00,
        ];
        data.extend_from_slice(b"GE  ");
        data.extend_from_slice(&[
            0, // nameplate type
            0, // default set
            4, // max proc parm length
            64, // max response data length
            2, // std version
            0, // std revision
            Self::DIM_STD_TABLES as u8,
            Self::DIM_MFG_TABLES as u8,
            0, // dim std procs
            0, // dim mfg procs
            0, // dim mfg status
            1, // nbr pending
        ]);
        data.extend(vec![0xFF; Self::DIM_STD_TABLES]);
        data.extend(vec![0xFF; Self::DIM_MFG_TABLES]);
        data.extend(vec![0x00; Self::DIM_STD_TABLES]);
        data.extend(vec![0xFF; Self::DIM_MFG_TABLES]);
        data
    }

    /// Same as `general_config`, with `table` cleared from the used set.
    pub fn general_config_without(table: TableId) -> Vec<u8> {
        let mut data = Self::general_config(TimeFormat::Packed, IdForm::String);
        let base = if table.is_manufacturer() {
            GeneralConfig::HEADER + Self::DIM_STD_TABLES
        } else {
            GeneralConfig::HEADER
        };
        let number = usize::from(table.number());
        data[base + number / 8] &= !(1 << (number % 8));
        data
    } // }}}

    pub fn manufacturer_identification(firmware: (u8, u8), hardware: (u8, u8)) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"GE  ");
        data.extend_from_slice(b"I210+c  ");
        data.extend_from_slice(&[hardware.0, hardware.1, firmware.0, firmware.1]);
        data.extend_from_slice(b"000012345678    ");
        data
    }

    pub fn device_identification() -> Vec<u8> {
        let mut data = b"METER-0001".to_vec();
        data.resize(20, b' ');
        data
    }

    pub fn clock() -> Vec<u8> {
        vec![24, 3, 15, 13, 45, 30, 0x0A]
    }

    // {{{ HAN
    /// Dimension limits with 5 clients, 8 byte client data, 3 events and 4 log entries.
    pub fn dimension_limits(len: usize) -> Vec<u8> {
        let mut data = vec![5, 8, 0, 3, 4, 2, 1, 64, 0, 2, 5];
        if len >= 15 {
            data.extend_from_slice(&[128, 0, 10, 6]);
        }
        if len >= 16 {
            data.push(12);
        }
        data
    }

    pub fn han_configuration_bytes(metering: bool) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&0x1A2Bu16.to_le_bytes());
        data.extend_from_slice(&0x0011_2233_4455_6677u64.to_le_bytes());
        data.extend_from_slice(&0x07FF_F800u32.to_le_bytes());
        data.extend_from_slice(&[5, 0, 60, 0x21]);
        data.extend_from_slice(&30u16.to_le_bytes());
        data.extend_from_slice(&3600u32.to_le_bytes());
        data.extend_from_slice(&[0, 0, 0x52]);
        if metering {
            data.extend_from_slice(&1000u32.to_le_bytes());
            data.extend_from_slice(&3u32.to_le_bytes());
        }
        data
    }

    pub fn bindings_bytes(slots: &[Option<(u64, u16)>]) -> Vec<u8> {
        let mut data = Vec::new();
        for slot in slots {
            let (address, short) = slot.unwrap_or((u64::MAX, u16::MAX));
            data.extend_from_slice(&address.to_le_bytes());
            data.extend_from_slice(&short.to_le_bytes());
        }
        data
    }

    pub fn client_data_bytes(clients: usize, size: usize) -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..clients {
            if i % 2 == 0 {
                data.extend_from_slice(&(0x1000 + i as u64).to_le_bytes());
                data.push(1);
                data.extend((0..size).map(|b| b as u8));
            } else {
                data.extend_from_slice(&u64::MAX.to_le_bytes());
                data.push(0);
                data.extend(vec![0; size]);
            }
        }
        data
    }

    pub fn module_info() -> Vec<u8> {
        let mut data = vec![4, 3, 2, 1, 7, 2, 1, 1, 3];
        data.extend_from_slice(&0x0011_2233_4455_6677u64.to_le_bytes());
        data.push(15);
        data.extend_from_slice(&0x1A2Bu16.to_le_bytes());
        data.push(0x4C);
        data
    }

    pub fn registry() -> HanDeviceRegistry {
        HanDeviceRegistry {
            devices: vec![
                RegisteredDevice {
                    eui: Eui64(0x0011_2233_4455_6601),
                    device_type: 5,
                    status: 0x2A,
                    name: "thermostat".to_string(),
                    clusters: vec![0x0201, 0x0702],
                },
                RegisteredDevice {
                    eui: Eui64(0x0011_2233_4455_6602),
                    device_type: 9,
                    status: 0x10,
                    name: "ihd".to_string(),
                    clusters: Vec::new(),
                },
            ],
        }
    }

    pub fn firmware_status(clients: usize) -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..clients {
            let eui = if i < 2 { 0x0011_2233_4455_6600 + i as u64 } else { u64::MAX };
            data.extend_from_slice(&eui.to_le_bytes());
            data.extend_from_slice(&0x0101u16.to_le_bytes());
            data.extend_from_slice(&[4, 3, 2, 1]);
            data.extend_from_slice(&[0, 0, 3, 1]);
            data.extend_from_slice(&[1, 40]);
        }
        data
    } // }}}

    // {{{ DRLC
    pub fn source_ids(ids: &[u32]) -> Vec<u8> {
        ids.iter().flat_map(|id| id.to_le_bytes()).collect()
    }

    pub fn drlc_event(issuer_event_id: u32) -> DrlcEvent {
        DrlcEvent {
            issuer_event_id,
            device_class: 0x0004,
            enrollment_group: 1,
            start_time: Some(Self::at(2024, 7, 1, 14, 0)),
            duration_minutes: 120,
            criticality: 3,
            cooling_offset: Some(2),
            heating_offset: None,
            cooling_setpoint: Some(2600),
            heating_setpoint: None,
            load_adjustment: Some(-20),
            duty_cycle: None,
            event_control: 0x01,
        }
    }

    pub fn drlc_events() -> DrlcEvents {
        DrlcEvents {
            slots: vec![Some(Self::drlc_event(0x100)), None, Some(Self::drlc_event(0x101))],
        }
    }

    /// Four log slots: two entries, two empty.
    pub fn drlc_event_log(format: TimeFormat) -> Vec<u8> {
        let mut writer = TableWriter::new();
        for slot in 0..4u32 {
            if slot % 2 == 0 {
                Self::drlc_event(0x200 + slot).encode(&mut writer, format).unwrap();
                writer.write_u8(0x03);
                format
                    .write_stime(&mut writer, Some(Self::at(2024, 7, 1, 16, 0)))
                    .unwrap();
            } else {
                DrlcEvent::encode_empty(&mut writer, format);
                writer.write_bytes(&vec![0xFF; 1 + format.stime_size()]);
            }
        }
        writer.as_slice().to_vec()
    } // }}}

    pub fn host_meter_config() -> HostMeterConfig {
        HostMeterConfig {
            host_meter_type: 2,
            register_multiplier: 0x01_0000,
            ct_ratio: 200.0,
            pt_ratio: 1.0,
            kh: 7.2,
            demand_interval_minutes: 15,
            flags: 0x01,
            ge_options: None,
        }
    }

    /// Every supported table of a GE meter at firmware 3.12 with a 3.60 radio board.
    pub fn meter_tables() -> Vec<(u16, Vec<u8>)> {
        let host = encode_table(&Self::host_meter_config(), &HostMeterParams { ge_meter: true }).unwrap();
        let events = encode_table(&Self::drlc_events(), &EventSlots::new(3, TimeFormat::Packed)).unwrap();
        let registry = encode_table(&Self::registry(), &()).unwrap();

        vec![
            (0, Self::general_config(TimeFormat::Packed, IdForm::String)),
            (1, Self::manufacturer_identification((3, 12), (3, 60))),
            (5, Self::device_identification()),
            (52, Self::clock()),
            (2098, Self::dimension_limits(16)),
            (2099, Self::han_configuration_bytes(true)),
            (2100, Self::bindings_bytes(&[Some((0xA1, 0x0001)), None, Some((0xA3, 0x0003)), None, None])),
            (2101, Self::client_data_bytes(5, 8)),
            (2102, Self::module_info()),
            (2103, registry.to_vec()),
            (2104, Self::firmware_status(5)),
            (2105, vec![3, 0, 2]),
            (2106, Self::source_ids(&[0x11, 0x22, 0x33])),
            (2107, events.to_vec()),
            (2108, Self::drlc_event_log(TimeFormat::Packed)),
            (2190, host.to_vec()),
        ]
    }

    pub fn meter() -> MemoryTransport {
        let mut transport = MemoryTransport::new();
        for (id, data) in Self::meter_tables() {
            transport.insert(id, data);
        }
        transport
    }

    pub fn hex(data: &[u8]) -> String {
        data.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn capture_yaml() -> String {
        Self::meter_tables()
            .iter()
            .map(|(id, data)| format!("{}: \"{}\"\n", id, Self::hex(data)))
            .collect()
    }
}
