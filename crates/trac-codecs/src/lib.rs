pub mod arrow_ipc;
pub mod csv_codec;
pub mod error;
pub mod json_codec;
pub mod parquet_codec;
pub mod registry;
pub mod schema;

pub use error::{CodecError, CodecResult};
pub use registry::FormatCode;
pub use schema::{assert_exact_schema_match, basic_type_to_arrow, to_arrow_schema};
