pub mod decode;
pub mod error;
pub mod table;
pub mod value;

pub use decode::{decode_bytes, detect_delimiter};
pub use error::{IngestError, Result};
pub use table::{LegacyTable, RowView};
pub use value::{clean_legacy_id, is_missing, is_unknown_date, parse_amount, parse_date, parse_flag};
