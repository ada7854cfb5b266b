mod common;
use common::*;

use c1219_tables::prelude::*;
use c1219_tables::tables::*;
use c1219_tables::transport::MemoryTransport;

#[test]
fn registry_round_trips_through_its_own_header() {
    let registry = Factory::registry();
    let encoded = encode_table(&registry, &()).unwrap();
    assert_eq!(encoded.len(), registry.encoded_len());
    assert_eq!(encoded[0], 2);

    let decoded = decode_table::<HanDeviceRegistry>(&encoded, &()).unwrap();
    assert_eq!(decoded, registry);
    assert_eq!(decoded.devices[0].name, "thermostat");
    assert_eq!(decoded.devices[0].clusters, vec![0x0201, 0x0702]);
    assert_eq!((decoded.devices[0].join_state(), decoded.devices[0].link_quality()), (2, 0xA));
}

#[test]
fn empty_registry_is_one_byte() {
    let decoded = decode_table::<HanDeviceRegistry>(&[0], &()).unwrap();
    assert!(decoded.devices.is_empty());
    assert_eq!(decoded.encoded_len(), 1);
}

#[test]
fn truncated_registry_is_end_of_data() {
    let encoded = encode_table(&Factory::registry(), &()).unwrap();
    let truncated = &encoded[..encoded.len() - 1];
    assert!(matches!(
        decode_table::<HanDeviceRegistry>(truncated, &()),
        Err(Error::UnexpectedEndOfData { .. })
    ));
}

#[test]
fn trailing_bytes_are_a_length_mismatch() {
    let mut data = encode_table(&Factory::registry(), &()).unwrap().to_vec();
    data.push(0);
    match decode_table::<HanDeviceRegistry>(&data, &()) {
        Err(Error::LengthMismatch { expected, consumed, .. }) => {
            assert_eq!(expected, data.len());
            assert_eq!(consumed, data.len() - 1);
        }
        other => panic!("expected length mismatch, got {:?}", other),
    }
}

#[test]
fn registry_length_is_known_once_read() {
    let registry = Factory::registry();
    let mut transport = MemoryTransport::new().with_table(HanDeviceRegistry::TABLE, encode_table(&registry, &()).unwrap());
    let mut table = PsemTable::<HanDeviceRegistry>::new(());
    assert_eq!(table.size(), TableSize::SelfDescribing);
    assert_eq!(table.len(), 0);

    table.read(&mut transport).unwrap();
    assert_eq!(table.len(), registry.encoded_len());
}

#[test]
fn registry_edit_writes_new_length() {
    let mut transport = MemoryTransport::new().with_table(HanDeviceRegistry::TABLE, encode_table(&Factory::registry(), &()).unwrap());
    let mut table = PsemTable::<HanDeviceRegistry>::new(());
    table.read(&mut transport).unwrap();

    table
        .modify(|registry| {
            registry.devices.remove(1);
            registry.devices[0].set_link_quality(3);
        })
        .unwrap();
    table.write(&mut transport).unwrap();

    let stored = transport.get(HanDeviceRegistry::TABLE).unwrap();
    let reread = decode_table::<HanDeviceRegistry>(stored, &()).unwrap();
    assert_eq!(reread.devices.len(), 1);
    assert_eq!(reread.devices[0].status, 0x23);
    assert_eq!(table.len(), stored.len());
    assert!(matches!(
        table.write_offset(&mut transport, "count"),
        Err(Error::Schema { .. })
    ));
}

#[test]
fn long_device_name_is_invalid() {
    let mut registry = Factory::registry();
    registry.devices[1].name = "x".repeat(300);
    assert!(matches!(
        encode_table(&registry, &()),
        Err(Error::InvalidValue { field: "device name", .. })
    ));
}

fn device_bytes(name: &[u8]) -> Vec<u8> {
    let mut data = vec![1];
    data.extend_from_slice(&0x0011_2233_4455_6677u64.to_le_bytes());
    data.extend_from_slice(&[0x04, 0x21, name.len() as u8]);
    data.extend_from_slice(name);
    data.extend_from_slice(&[1, 0x02, 0x07]);
    data
}

#[test]
fn padded_name_is_kept_byte_for_byte() {
    let data = device_bytes(b"AB ");
    let decoded = decode_table::<HanDeviceRegistry>(&data, &()).unwrap();
    assert_eq!(decoded.devices[0].name, "AB ");
    assert_eq!(decoded.encoded_len(), data.len());
    assert_eq!(encode_table(&decoded, &()).unwrap().to_vec(), data);
}

#[test]
fn latin1_name_counts_characters() {
    let data = device_bytes(&[0xE9]);
    let decoded = decode_table::<HanDeviceRegistry>(&data, &()).unwrap();
    assert_eq!(decoded.devices[0].name, "\u{e9}");
    assert_eq!(decoded.encoded_len(), data.len());
    assert_eq!(encode_table(&decoded, &()).unwrap().to_vec(), data);
}
