use crate::table::TableId;
use crate::transport::ResponseCode;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected end of data: needed {needed} bytes at offset {offset}, {remaining} remaining")]
    UnexpectedEndOfData {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// Non-success PSEM response other than `Onp`.
    #[error("table {table}: {code} response")]
    Transport { table: TableId, code: ResponseCode },

    /// `Onp` response; the meter does not support the request at this firmware level.
    #[error("table {table}: operation not possible")]
    NotSupported { table: TableId },

    #[error("table {table}: {message}")]
    Schema { table: TableId, message: String },

    #[error("table {table}: decode consumed {consumed} bytes of {expected}")]
    LengthMismatch {
        table: TableId,
        expected: usize,
        consumed: usize,
    },

    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("table {table} is not loaded")]
    NotLoaded { table: TableId },

    #[error("table {table} has local changes that have not been written")]
    PendingChanges { table: TableId },
}

impl Error {
    /// Maps a PSEM response for `table` onto the fault taxonomy.
    pub fn from_response(table: TableId, code: ResponseCode) -> Self {
        match code {
            ResponseCode::Onp => Error::NotSupported { table },
            code => Error::Transport { table, code },
        }
    }

    pub fn table(&self) -> Option<TableId> {
        match self {
            Error::Transport { table, .. }
            | Error::NotSupported { table }
            | Error::Schema { table, .. }
            | Error::LengthMismatch { table, .. }
            | Error::NotLoaded { table }
            | Error::PendingChanges { table } => Some(*table),
            Error::UnexpectedEndOfData { .. } | Error::InvalidValue { .. } => None,
        }
    }

    pub fn response_code(&self) -> Option<ResponseCode> {
        match self {
            Error::Transport { code, .. } => Some(*code),
            Error::NotSupported { .. } => Some(ResponseCode::Onp),
            _ => None,
        }
    }
}

/// Creates an `Error::Schema` for a table, tagged with the current file and line number
#[macro_export]
macro_rules! schema_error {
    ($table:expr, $($arg:tt)*) => {
        $crate::error::Error::Schema {
            table: $table,
            message: format!(
                "[{}:{}] {}",
                std::path::Path::new(file!())
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                line!(),
                format!($($arg)*)
            ),
        }
    };
}
