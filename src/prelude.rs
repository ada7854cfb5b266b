pub use std::time::Duration;

pub use bytes::{Bytes, BytesMut};
pub use log::{debug, error, info, trace, warn};
pub use serde::Serialize;

pub use crate::bits;
pub use crate::codec::{TableReader, TableWriter, TimeFormat};
pub use crate::error::{Error, Result};
pub use crate::records::*;
pub use crate::schema::Layout;
pub use crate::schema_error;
pub use crate::table::{decode_table, encode_table, PsemTable, TableDecode, TableEncode, TableId, TableSize, TableState};
pub use crate::transport::{PendingRecord, PsemTransport, ResponseCode};
pub use crate::version::{Revision, Threshold, VersionTag};
