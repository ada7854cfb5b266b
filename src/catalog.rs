//! Dependency-ordered decoding of every supported table.

use crate::prelude::*;
use crate::tables::*;

use enum_dispatch::enum_dispatch;

#[enum_dispatch]
pub trait DecodedTable {
    fn table_id(&self) -> TableId;
    fn name(&self) -> &'static str;
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T: TableDecode + Serialize> DecodedTable for T {
    fn table_id(&self) -> TableId {
        T::TABLE
    }

    fn name(&self) -> &'static str {
        let path = std::any::type_name::<T>();
        path.rsplit("::").next().unwrap_or(path)
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[enum_dispatch(DecodedTable)]
#[derive(Clone, Debug, PartialEq)]
pub enum AnyTable {
    GeneralConfig(GeneralConfig),
    ManufacturerIdentification(ManufacturerIdentification),
    DeviceIdentification(DeviceIdentification),
    Clock(Clock),
    HanDimensionLimits(HanDimensionLimits),
    HanConfiguration(HanConfiguration),
    HanBindings(HanBindings),
    HanClientData(HanClientData),
    HanModuleInfo(HanModuleInfo),
    HanDeviceRegistry(HanDeviceRegistry),
    HanFirmwareStatus(HanFirmwareStatus),
    DrlcSourceCounts(DrlcSourceCounts),
    DrlcSourceIds(DrlcSourceIds),
    DrlcEvents(DrlcEvents),
    DrlcEventLog(DrlcEventLog),
    HostMeterConfig(HostMeterConfig),
}

/// Every table the session can decode, dependencies first.
pub const KNOWN_TABLES: [TableId; 16] = [
    GeneralConfig::TABLE,
    ManufacturerIdentification::TABLE,
    DeviceIdentification::TABLE,
    Clock::TABLE,
    HanDimensionLimits::TABLE,
    HanConfiguration::TABLE,
    HanBindings::TABLE,
    HanClientData::TABLE,
    HanModuleInfo::TABLE,
    HanDeviceRegistry::TABLE,
    HanFirmwareStatus::TABLE,
    DrlcSourceCounts::TABLE,
    DrlcSourceIds::TABLE,
    DrlcEvents::TABLE,
    DrlcEventLog::TABLE,
    HostMeterConfig::TABLE,
];

#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    pub firmware: Option<Revision>,
    pub hardware: Option<Revision>,
    /// Defaults to whether table 1 names GE as the manufacturer.
    pub ge_meter: Option<bool>,
    pub timeout: Option<Duration>,
}

/// Reads tables through a transport, resolving the values each table's size
/// depends on from the tables it depends on.
pub struct Session<'a, P: PsemTransport> {
    transport: &'a mut P,
    options: SessionOptions,
    general: Option<GeneralConfig>,
    identification: Option<ManufacturerIdentification>,
    limits: Option<HanDimensionLimits>,
    source_counts: Option<DrlcSourceCounts>,
}

impl<'a, P: PsemTransport> Session<'a, P> {
    pub fn new(transport: &'a mut P, options: SessionOptions) -> Self {
        Self {
            transport,
            options,
            general: None,
            identification: None,
            limits: None,
            source_counts: None,
        }
    }

    fn fetch<T: TableDecode>(&mut self, params: T::Params) -> Result<T> {
        let mut table = PsemTable::<T>::new(params);
        if let Some(timeout) = self.options.timeout {
            table = table.with_timeout(timeout);
        }
        table.force_read(&mut *self.transport)?;
        table.into_fields()
    }

    /// Reads a table after checking table 0 lists it as used.
    fn read<T: TableDecode>(&mut self, params: T::Params) -> Result<T> {
        if !self.general_config()?.table_used(T::TABLE) {
            debug!("table {} not listed as used", T::TABLE);
            return Err(Error::NotSupported { table: T::TABLE });
        }
        self.fetch(params)
    }

    pub fn general_config(&mut self) -> Result<&GeneralConfig> {
        if self.general.is_none() {
            let general = self.fetch::<GeneralConfig>(())?;
            if general.data_order != DataOrder::LittleEndian {
                return Err(schema_error!(GeneralConfig::TABLE, "big-endian data order is not supported"));
            }
            info!(
                "{} meter, C12.19 version {}.{}, time format {:?}",
                general.manufacturer, general.std_version, general.std_revision, general.time_format
            );
            self.general = Some(general);
        }
        self.general.as_ref().ok_or(Error::NotLoaded {
            table: GeneralConfig::TABLE,
        })
    }

    pub fn identification(&mut self) -> Result<&ManufacturerIdentification> {
        if self.identification.is_none() {
            let identification = self.read::<ManufacturerIdentification>(())?;
            info!(
                "model {} serial {} ({})",
                identification.model,
                identification.serial_number,
                identification.version_tag()
            );
            self.identification = Some(identification);
        }
        self.identification.as_ref().ok_or(Error::NotLoaded {
            table: ManufacturerIdentification::TABLE,
        })
    }

    /// Installed versions, with configured overrides taking precedence over table 1.
    pub fn version_tag(&mut self) -> Result<VersionTag> {
        let (firmware, hardware) = match (self.options.firmware, self.options.hardware) {
            (Some(firmware), Some(hardware)) => (firmware, hardware),
            (firmware, hardware) => {
                let tag = self.identification()?.version_tag();
                (firmware.unwrap_or(tag.firmware), hardware.unwrap_or(tag.hardware))
            }
        };
        Ok(VersionTag::new(firmware, hardware))
    }

    pub fn time_format(&mut self) -> Result<TimeFormat> {
        Ok(self.general_config()?.time_format)
    }

    pub fn ge_meter(&mut self) -> Result<bool> {
        match self.options.ge_meter {
            Some(ge_meter) => Ok(ge_meter),
            None => Ok(self.identification()?.manufacturer == "GE"),
        }
    }

    pub fn dimension_limits(&mut self) -> Result<&HanDimensionLimits> {
        if self.limits.is_none() {
            let tag = self.version_tag()?;
            self.limits = Some(self.read::<HanDimensionLimits>(tag)?);
        }
        self.limits.as_ref().ok_or(Error::NotLoaded {
            table: HanDimensionLimits::TABLE,
        })
    }

    pub fn source_counts(&mut self) -> Result<&DrlcSourceCounts> {
        if self.source_counts.is_none() {
            self.source_counts = Some(self.read::<DrlcSourceCounts>(())?);
        }
        self.source_counts.as_ref().ok_or(Error::NotLoaded {
            table: DrlcSourceCounts::TABLE,
        })
    }

    pub fn decode(&mut self, id: TableId) -> Result<AnyTable> {
        let table: AnyTable = match id {
            id if id == GeneralConfig::TABLE => self.general_config()?.clone().into(),
            id if id == ManufacturerIdentification::TABLE => self.identification()?.clone().into(),
            id if id == DeviceIdentification::TABLE => {
                let form = self.general_config()?.id_form;
                self.read::<DeviceIdentification>(form)?.into()
            }
            id if id == Clock::TABLE => {
                let format = self.time_format()?;
                self.read::<Clock>(format)?.into()
            }
            id if id == HanDimensionLimits::TABLE => self.dimension_limits()?.clone().into(),
            id if id == HanConfiguration::TABLE => {
                let tag = self.version_tag()?;
                self.read::<HanConfiguration>(tag)?.into()
            }
            id if id == HanBindings::TABLE => {
                let slots = self.client_slots()?;
                self.read::<HanBindings>(slots)?.into()
            }
            id if id == HanClientData::TABLE => {
                let limits = self.dimension_limits()?;
                let params = ClientDataParams {
                    max_clients: usize::from(limits.max_han_clients),
                    client_data_size: usize::from(limits.client_data_size),
                };
                self.read::<HanClientData>(params)?.into()
            }
            id if id == HanModuleInfo::TABLE => self.read::<HanModuleInfo>(())?.into(),
            id if id == HanDeviceRegistry::TABLE => self.read::<HanDeviceRegistry>(())?.into(),
            id if id == HanFirmwareStatus::TABLE => {
                let slots = self.client_slots()?;
                self.read::<HanFirmwareStatus>(slots)?.into()
            }
            id if id == DrlcSourceCounts::TABLE => self.source_counts()?.clone().into(),
            id if id == DrlcSourceIds::TABLE => {
                let sources = self.source_counts()?.number_of_sources;
                self.read::<DrlcSourceIds>(sources)?.into()
            }
            id if id == DrlcEvents::TABLE => {
                let format = self.time_format()?;
                let slots = usize::from(self.dimension_limits()?.max_drlc_events);
                self.read::<DrlcEvents>(EventSlots::new(slots, format))?.into()
            }
            id if id == DrlcEventLog::TABLE => {
                let format = self.time_format()?;
                let slots = usize::from(self.dimension_limits()?.max_drlc_log_entries);
                self.read::<DrlcEventLog>(EventSlots::new(slots, format))?.into()
            }
            id if id == HostMeterConfig::TABLE => {
                let ge_meter = self.ge_meter()?;
                self.read::<HostMeterConfig>(HostMeterParams { ge_meter })?.into()
            }
            id => return Err(schema_error!(id, "no decoder for table {}", id)),
        };
        Ok(table)
    }

    /// Decodes each table in turn; one table failing does not stop the rest.
    pub fn decode_all(&mut self, ids: &[TableId]) -> Vec<(TableId, Result<AnyTable>)> {
        ids.iter().map(|id| (*id, self.decode(*id))).collect()
    }

    fn client_slots(&mut self) -> Result<ClientSlots> {
        Ok(ClientSlots::new(usize::from(self.dimension_limits()?.max_han_clients)))
    }
}
