pub mod destination;
pub mod excel_read;
pub mod excel_write;
pub mod payload;
pub mod transport;
pub mod workbook;

pub use destination::{Destination, MemorySheet};
pub use payload::{RawPayload, parse_payload};
pub use transport::{FileTransport, Transport};
pub use workbook::WorkbookDestination;
