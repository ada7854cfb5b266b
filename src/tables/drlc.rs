//! Demand response / load control tables (MT57..MT60).

use crate::prelude::*;

// {{{ DrlcSourceCounts
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct DrlcSourceCounts {
    /// 0xFFFF when no sources are configured.
    pub number_of_sources: u16,
    pub number_of_programs: u8,
}

impl DrlcSourceCounts {
    pub fn source_count(&self) -> usize {
        clamp_count(self.number_of_sources)
    }
}

impl TableDecode for DrlcSourceCounts {
    const TABLE: TableId = TableId::manufacturer(57);

    type Params = ();

    fn layout(_: &()) -> Option<Layout> {
        Some(
            Layout::new()
                .field("number_of_sources", 2)
                .field("number_of_programs", 1),
        )
    }

    fn decode(reader: &mut TableReader<'_>, _: &()) -> Result<Self> {
        Ok(Self {
            number_of_sources: reader.read_u16()?,
            number_of_programs: reader.read_u8()?,
        })
    }
} // }}}

// {{{ DrlcSourceIds
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct DrlcSourceIds {
    pub source_ids: Vec<u32>,
}

impl DrlcSourceIds {
    const EMPTY_ID: u32 = u32::MAX;
}

impl TableDecode for DrlcSourceIds {
    const TABLE: TableId = TableId::manufacturer(58);

    /// `DrlcSourceCounts::number_of_sources`, sentinel included.
    type Params = u16;

    fn layout(number_of_sources: &u16) -> Option<Layout> {
        Some(Layout::new().repeated("source_id", 4, clamp_count(*number_of_sources)))
    }

    fn decode(reader: &mut TableReader<'_>, number_of_sources: &u16) -> Result<Self> {
        let mut source_ids = Vec::new();
        for _ in 0..clamp_count(*number_of_sources) {
            let id = reader.read_u32()?;
            if id != Self::EMPTY_ID {
                source_ids.push(id);
            }
        }
        Ok(Self { source_ids })
    }
} // }}}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EventSlots {
    pub slots: usize,
    pub time_format: TimeFormat,
}

impl EventSlots {
    pub fn new(slots: usize, time_format: TimeFormat) -> Self {
        Self { slots, time_format }
    }
}

// {{{ DrlcEvents
/// Scheduled DRLC events (MT59). Empty slots read as `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DrlcEvents {
    pub slots: Vec<Option<DrlcEvent>>,
}

impl DrlcEvents {
    pub fn events(&self) -> impl Iterator<Item = &DrlcEvent> {
        self.slots.iter().flatten()
    }

    pub fn find(&self, issuer_event_id: u32) -> Option<&DrlcEvent> {
        self.events().find(|e| e.issuer_event_id == issuer_event_id)
    }

    /// Puts `event` in the first empty slot, returning its index.
    pub fn schedule(&mut self, event: DrlcEvent) -> Result<usize> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or_else(|| Error::InvalidValue {
                field: "drlc event",
                value: format!("no free slot for {}", event.issuer_event_id),
            })?;
        self.slots[index] = Some(event);
        Ok(index)
    }

    pub fn cancel(&mut self, issuer_event_id: u32) -> bool {
        match self
            .slots
            .iter_mut()
            .find(|slot| matches!(slot, Some(e) if e.issuer_event_id == issuer_event_id))
        {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }
}

impl TableDecode for DrlcEvents {
    const TABLE: TableId = TableId::manufacturer(59);

    type Params = EventSlots;

    fn layout(params: &EventSlots) -> Option<Layout> {
        Some(Layout::new().repeated(
            "event",
            DrlcEvent::layout(params.time_format).size(),
            params.slots,
        ))
    }

    fn decode(reader: &mut TableReader<'_>, params: &EventSlots) -> Result<Self> {
        let slots = (0..params.slots)
            .map(|_| DrlcEvent::decode(reader, params.time_format))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { slots })
    }
}

impl TableEncode for DrlcEvents {
    fn encode(&self, writer: &mut TableWriter, params: &EventSlots) -> Result<()> {
        if self.slots.len() != params.slots {
            return Err(schema_error!(
                Self::TABLE,
                "{} event slots for a table of {}",
                self.slots.len(),
                params.slots
            ));
        }
        for slot in &self.slots {
            match slot {
                Some(event) => event.encode(writer, params.time_format)?,
                None => DrlcEvent::encode_empty(writer, params.time_format),
            }
        }
        Ok(())
    }
} // }}}

// {{{ DrlcEventLog
/// DRLC event log (MT60): event slots extended with a status and status time.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DrlcEventLog {
    pub entries: Vec<DrlcLogEntry>,
}

impl TableDecode for DrlcEventLog {
    const TABLE: TableId = TableId::manufacturer(60);
    const TIMEOUT: Duration = Duration::from_secs(10);

    type Params = EventSlots;

    fn layout(params: &EventSlots) -> Option<Layout> {
        Some(Layout::new().repeated(
            "entry",
            DrlcLogEntry::layout(params.time_format).size(),
            params.slots,
        ))
    }

    fn decode(reader: &mut TableReader<'_>, params: &EventSlots) -> Result<Self> {
        let mut entries = Vec::new();
        for _ in 0..params.slots {
            if let Some(entry) = DrlcLogEntry::decode(reader, params.time_format)? {
                entries.push(entry);
            }
        }
        Ok(Self { entries })
    }
} // }}}
