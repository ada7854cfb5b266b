mod common;
use common::*;

use c1219_tables::prelude::*;
use c1219_tables::tables::*;
use c1219_tables::transport::MemoryTransport;

fn five_slots() -> Vec<u8> {
    Factory::bindings_bytes(&[
        Some((0x0011_2233_4455_66A1, 0x0001)),
        None,
        Some((0x0011_2233_4455_66A3, 0x0003)),
        None,
        Some((0x0011_2233_4455_66A5, 0x0005)),
    ])
}

#[test]
fn unassigned_slots_are_filtered() {
    let bindings = decode_table::<HanBindings>(&five_slots(), &ClientSlots::new(5)).unwrap();

    assert_eq!(bindings.slots().len(), 5);
    let assigned = bindings.bindings();
    assert_eq!(assigned.len(), 3);
    assert_eq!(
        assigned.iter().map(|b| b.short_address).collect::<Vec<_>>(),
        vec![0x0001, 0x0003, 0x0005]
    );
    assert_eq!(assigned[0].address, Eui64(0x0011_2233_4455_66A1));
    assert!(bindings.slots()[1].address.is_unassigned());
}

#[test]
fn round_trip_keeps_empty_slots_in_place() {
    let params = ClientSlots::new(5);
    let bindings = decode_table::<HanBindings>(&five_slots(), &params).unwrap();
    let encoded = encode_table(&bindings, &params).unwrap();
    assert_eq!(encoded.to_vec(), five_slots());
}

#[test]
fn slots_can_be_set_and_cleared() {
    let params = ClientSlots::new(5);
    let mut transport = MemoryTransport::new().with_table(HanBindings::TABLE, five_slots());
    let mut table = PsemTable::<HanBindings>::new(params);
    table.read(&mut transport).unwrap();

    table
        .modify(|bindings| {
            bindings
                .set_slot(
                    1,
                    Binding {
                        address: Eui64(0xBEEF),
                        short_address: 0x0042,
                    },
                )
                .unwrap();
            bindings.clear_slot(4).unwrap();
        })
        .unwrap();
    table.write(&mut transport).unwrap();

    let stored = transport.get(HanBindings::TABLE).unwrap();
    let reread = decode_table::<HanBindings>(stored, &params).unwrap();
    assert_eq!(
        reread.bindings().iter().map(|b| b.short_address).collect::<Vec<_>>(),
        vec![0x0001, 0x0042, 0x0003]
    );
    assert_eq!(reread.slots()[4], Binding::unassigned());
}

#[test]
fn slot_out_of_range_is_invalid() {
    let mut bindings = HanBindings::new(vec![Binding::unassigned(); 2]);
    assert!(matches!(
        bindings.clear_slot(2),
        Err(Error::InvalidValue { field: "binding slot", .. })
    ));
}

#[test]
fn slot_count_must_match_clients() {
    let bindings = HanBindings::new(vec![Binding::unassigned(); 3]);
    assert!(matches!(
        encode_table(&bindings, &ClientSlots::new(4)),
        Err(Error::Schema { .. })
    ));
}

#[test]
fn serializes_only_assigned_bindings() {
    let bindings = decode_table::<HanBindings>(&five_slots(), &ClientSlots::new(5)).unwrap();
    let json = serde_json::to_value(&bindings).unwrap();
    assert_eq!(json["slots"], 5);
    assert_eq!(json["bindings"].as_array().unwrap().len(), 3);
    assert_eq!(json["bindings"][0]["address"], "00:11:22:33:44:55:66:A1");
}

#[test]
fn client_data_keeps_payload_per_slot() {
    let params = ClientDataParams {
        max_clients: 3,
        client_data_size: 4,
    };
    let data = Factory::client_data_bytes(3, 4);
    let table = decode_table::<HanClientData>(&data, &params).unwrap();

    assert_eq!(table.records.len(), 3);
    assert_eq!(table.assigned().count(), 2);
    assert_eq!(table.records[0].payload, vec![0, 1, 2, 3]);
    assert!(table.records[0].data_valid);
    assert!(!table.records[1].data_valid);

    let mut short = table.clone();
    short.records[2].payload = vec![9];
    let encoded = encode_table(&short, &params).unwrap();
    assert_eq!(&encoded[encoded.len() - 4..], &[9, 0, 0, 0]);

    short.records[2].payload = vec![1; 5];
    assert!(matches!(encode_table(&short, &params), Err(Error::InvalidValue { .. })));
}

#[test]
fn firmware_status_drops_unassigned_clients() {
    let status = decode_table::<HanFirmwareStatus>(&Factory::firmware_status(5), &ClientSlots::new(5)).unwrap();
    assert_eq!(status.images.len(), 2);

    let image = &status.images[1];
    assert_eq!(image.device, Eui64(0x0011_2233_4455_6601));
    assert_eq!(image.image_type, 0x0101);
    assert_eq!(image.current.to_string(), "1.2.3.4");
    assert_eq!(image.percent_complete, 40);
    assert_eq!(image.status(), Some(UpgradeStatus::Downloading));
}

#[test]
fn module_info_fields() {
    let info = decode_table::<HanModuleInfo>(&Factory::module_info(), &()).unwrap();
    assert_eq!(info.radio_firmware.to_string(), "1.2.3.4");
    assert_eq!(info.mac_address, Eui64(0x0011_2233_4455_6677));
    assert_eq!(info.channel, 15);
    assert_eq!(info.pan_id, 0x1A2B);
    assert_eq!((info.transmit_power(), info.receive_sensitivity()), (4, 0xC));
}
