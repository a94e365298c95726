//! Mime-type → codec dispatch: "an unrecognized format
//! code yields UNIMPLEMENTED rather than a generic error."

use std::fmt;

use crate::error::{CodecError, CodecResult};

/// Format codes recognised by the data service, identified by their
/// canonical mime type as used in `dataItem` storage metadata and the
/// gRPC/REST `format` field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FormatCode {
    Csv,
    Json,
    ArrowStream,
    ArrowFile,
    Parquet,
}

impl FormatCode {
    pub fn mime_type(self) -> &'static str {
        match self {
            FormatCode::Csv => "text/csv",
            FormatCode::Json => "application/json",
            FormatCode::ArrowStream => "application/vnd.apache.arrow.stream",
            FormatCode::ArrowFile => "application/vnd.apache.arrow.file",
            FormatCode::Parquet => "application/vnd.apache.parquet",
        }
    }

    /// Whether this format can only be decoded once the complete payload
    /// has arrived (true for the file-at-rest formats whose footer comes
    /// last), as opposed to formats that can be decoded incrementally.
    pub fn requires_full_buffering(self) -> bool {
        matches!(self, FormatCode::ArrowFile | FormatCode::Parquet)
    }

    pub fn parse(mime_type: &str) -> CodecResult<Self> {
        match mime_type {
            "text/csv" | "csv" => Ok(FormatCode::Csv),
            "application/json" | "json" => Ok(FormatCode::Json),
            "application/vnd.apache.arrow.stream" | "arrow" | "arrow_stream" => {
                Ok(FormatCode::ArrowStream)
            }
            "application/vnd.apache.arrow.file" | "arrow_file" => Ok(FormatCode::ArrowFile),
            "application/vnd.apache.parquet" | "parquet" => Ok(FormatCode::Parquet),
            other => Err(CodecError::Unimplemented(format!(
                "unrecognized data format: '{other}'"
            ))),
        }
    }
}

impl fmt::Display for FormatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_canonical_mime_types() {
        assert_eq!(FormatCode::parse("text/csv").unwrap(), FormatCode::Csv);
        assert_eq!(FormatCode::parse("application/json").unwrap(), FormatCode::Json);
        assert_eq!(
            FormatCode::parse("application/vnd.apache.parquet").unwrap(),
            FormatCode::Parquet
        );
    }

    #[test]
    fn unknown_format_is_unimplemented() {
        let err = FormatCode::parse("application/x-mystery");
        assert!(matches!(err.unwrap_err(), CodecError::Unimplemented(_)));
    }

    #[test]
    fn file_formats_require_full_buffering() {
        assert!(FormatCode::ArrowFile.requires_full_buffering());
        assert!(FormatCode::Parquet.requires_full_buffering());
        assert!(!FormatCode::Csv.requires_full_buffering());
    }
}
