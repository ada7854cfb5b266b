//! Byte-cursor primitives shared by every table decoder and encoder.

pub mod reader;
pub mod time;
pub mod writer;

pub use reader::TableReader;
pub use time::TimeFormat;
pub use writer::TableWriter;
