mod common;
use common::*;

use c1219_tables::prelude::*;
use c1219_tables::tables::*;

#[test]
fn string_identification_round_trips() {
    let id = DeviceIdentification {
        identification: "METER-0042".to_string(),
    };
    let encoded = encode_table(&id, &IdForm::String).unwrap();
    assert_eq!(encoded.len(), 20);
    assert_eq!(&encoded[..10], b"METER-0042");
    assert!(encoded[10..].iter().all(|b| *b == b' '));
    assert_eq!(decode_table::<DeviceIdentification>(&encoded, &IdForm::String).unwrap(), id);
}

#[test]
fn bcd_identification_round_trips() {
    let id = DeviceIdentification {
        identification: "12345678900000000001".to_string(),
    };
    let encoded = encode_table(&id, &IdForm::Bcd).unwrap();
    assert_eq!(encoded.to_vec(), vec![0x12, 0x34, 0x56, 0x78, 0x90, 0, 0, 0, 0, 0x01]);
    assert_eq!(decode_table::<DeviceIdentification>(&encoded, &IdForm::Bcd).unwrap(), id);
}

#[test]
fn short_bcd_identification_is_left_padded() {
    let id = DeviceIdentification {
        identification: "4321".to_string(),
    };
    let encoded = encode_table(&id, &IdForm::Bcd).unwrap();
    assert_eq!(encoded.to_vec(), vec![0, 0, 0, 0, 0, 0, 0, 0, 0x43, 0x21]);

    let decoded = decode_table::<DeviceIdentification>(&encoded, &IdForm::Bcd).unwrap();
    assert_eq!(decoded.identification, "00000000000000004321");
    assert_eq!(encode_table(&decoded, &IdForm::Bcd).unwrap(), encoded);
}

#[test]
fn bcd_identification_rejects_letters_and_overflow() {
    for bad in ["12AB", "123456789012345678901"] {
        let id = DeviceIdentification {
            identification: bad.to_string(),
        };
        assert!(matches!(encode_table(&id, &IdForm::Bcd), Err(Error::InvalidValue { .. })));
    }
}

#[test]
fn identification_written_through_table() {
    let mut transport = Factory::meter();
    let mut table = PsemTable::<DeviceIdentification>::new(IdForm::String);
    table.read(&mut transport).unwrap();
    table
        .modify(|id| id.identification = "SUBSTATION 7".to_string())
        .unwrap();
    table.write(&mut transport).unwrap();

    let stored = transport.get(DeviceIdentification::TABLE).unwrap();
    let reread = decode_table::<DeviceIdentification>(stored, &IdForm::String).unwrap();
    assert_eq!(reread.identification, "SUBSTATION 7");
}
