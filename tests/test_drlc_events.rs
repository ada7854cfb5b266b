mod common;
use common::*;

use c1219_tables::prelude::*;
use c1219_tables::tables::*;
use c1219_tables::transport::MemoryTransport;

const FORMATS: [TimeFormat; 4] = [TimeFormat::Bcd, TimeFormat::Packed, TimeFormat::Minutes, TimeFormat::Seconds];

#[test]
fn events_survive_every_time_format() {
    for format in FORMATS {
        let params = EventSlots::new(3, format);
        let encoded = encode_table(&Factory::drlc_events(), &params).unwrap();
        let decoded = decode_table::<DrlcEvents>(&encoded, &params).unwrap();
        assert_eq!(decoded, Factory::drlc_events(), "{:?}", format);
    }
}

#[test]
fn empty_slot_is_all_ones() {
    let params = EventSlots::new(3, TimeFormat::Packed);
    let encoded = encode_table(&Factory::drlc_events(), &params).unwrap();
    let slot = DrlcEvent::layout(TimeFormat::Packed).size();
    assert_eq!(slot, 24);
    assert!(encoded[slot..2 * slot].iter().all(|b| *b == 0xFF));

    let decoded = decode_table::<DrlcEvents>(&encoded, &params).unwrap();
    assert_eq!(decoded.slots[1], None);
    assert_eq!(decoded.events().count(), 2);
}

#[test]
fn not_used_values_are_sentinels_on_the_wire() {
    let params = EventSlots::new(1, TimeFormat::Seconds);
    let events = DrlcEvents {
        slots: vec![Some(Factory::drlc_event(7))],
    };
    let encoded = encode_table(&events, &params).unwrap();

    let layout = DrlcEvent::layout(TimeFormat::Seconds);
    let at = |name: &str| layout.offset_of(name).unwrap();
    assert_eq!(encoded[at("cooling_offset")], 2);
    assert_eq!(encoded[at("heating_offset")], 0xFF);
    let heating = at("heating_setpoint");
    assert_eq!(&encoded[heating..heating + 2], &i16::MIN.to_le_bytes());
    assert_eq!(encoded[at("load_adjustment")], (-20i8) as u8);
    assert_eq!(encoded[at("duty_cycle")], 0xFF);
}

#[test]
fn immediate_start_is_zero_time() {
    let mut event = Factory::drlc_event(9);
    event.start_time = None;
    let events = DrlcEvents { slots: vec![Some(event)] };
    let params = EventSlots::new(1, TimeFormat::Minutes);

    let encoded = encode_table(&events, &params).unwrap();
    let start = DrlcEvent::layout(TimeFormat::Minutes).offset_of("start_time").unwrap();
    assert_eq!(&encoded[start..start + 4], &[0, 0, 0, 0]);
    assert_eq!(decode_table::<DrlcEvents>(&encoded, &params).unwrap(), events);
}

#[test]
fn schedule_and_cancel() {
    let params = EventSlots::new(3, TimeFormat::Packed);
    let mut transport = MemoryTransport::new().with_table(
        DrlcEvents::TABLE,
        encode_table(&Factory::drlc_events(), &params).unwrap(),
    );
    let mut table = PsemTable::<DrlcEvents>::new(params);
    table.read(&mut transport).unwrap();
    assert!(table.fields().unwrap().find(0x101).is_some());

    table
        .modify(|events| {
            assert_eq!(events.schedule(Factory::drlc_event(0x102)).unwrap(), 1);
            assert!(matches!(
                events.schedule(Factory::drlc_event(0x103)),
                Err(Error::InvalidValue { .. })
            ));
            assert!(events.cancel(0x100));
            assert!(!events.cancel(0x100));
        })
        .unwrap();
    table.write(&mut transport).unwrap();

    let stored = transport.get(DrlcEvents::TABLE).unwrap();
    let reread = decode_table::<DrlcEvents>(stored, &params).unwrap();
    let ids: Vec<u32> = reread.events().map(|e| e.issuer_event_id).collect();
    assert_eq!(ids, vec![0x102, 0x101]);
    assert_eq!(reread.slots[0], None);
}

#[test]
fn empty_issuer_id_cannot_be_encoded() {
    let events = DrlcEvents {
        slots: vec![Some(Factory::drlc_event(DrlcEvent::EMPTY_ID))],
    };
    assert!(matches!(
        encode_table(&events, &EventSlots::new(1, TimeFormat::Packed)),
        Err(Error::InvalidValue { .. })
    ));
}

#[test]
fn randomize_bits() {
    let mut event = Factory::drlc_event(1);
    assert!(event.randomize_start());
    assert!(!event.randomize_end());
    event.set_randomize_end(true);
    event.set_randomize_start(false);
    assert_eq!(event.event_control, 0x02);
}

#[test]
fn log_keeps_only_recorded_entries() {
    for format in FORMATS {
        let params = EventSlots::new(4, format);
        let data = Factory::drlc_event_log(format);
        assert_eq!(Some(data.len()), DrlcEventLog::size(&params).fixed());

        let log = decode_table::<DrlcEventLog>(&data, &params).unwrap();
        assert_eq!(log.entries.len(), 2, "{:?}", format);
        assert_eq!(log.entries[0].event.issuer_event_id, 0x200);
        assert_eq!(log.entries[1].event.issuer_event_id, 0x202);
        assert_eq!(log.entries[0].status(), Some(DrlcEventStatus::Completed));
        assert_eq!(log.entries[0].status_time, Some(Factory::at(2024, 7, 1, 16, 0)));
    }
}

#[test]
fn log_entries_serialize_with_times() {
    let params = EventSlots::new(4, TimeFormat::Packed);
    let log = decode_table::<DrlcEventLog>(&Factory::drlc_event_log(TimeFormat::Packed), &params).unwrap();
    let json = serde_json::to_value(&log).unwrap();
    assert_eq!(json["entries"][0]["status_time"], "2024-07-01T16:00:00");
    assert_eq!(json["entries"][0]["event"]["heating_offset"], serde_json::Value::Null);
}
