pub mod drlc;
pub mod general_config;
pub mod han;
pub mod host_meter;
pub mod identification;

pub use drlc::{DrlcEventLog, DrlcEvents, DrlcSourceCounts, DrlcSourceIds, EventSlots};
pub use general_config::{DataOrder, GeneralConfig, IdForm, TableSet};
pub use han::{
    ClientDataParams, ClientSlots, HanBindings, HanClientData, HanConfiguration, HanDeviceRegistry, HanDimensionLimits,
    HanFirmwareStatus, HanModuleInfo,
};
pub use host_meter::{HostMeterConfig, HostMeterParams};
pub use identification::{Clock, DeviceIdentification, ManufacturerIdentification};
