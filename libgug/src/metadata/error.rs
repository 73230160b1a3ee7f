use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
/// Errors raised while parsing a `.gug` metadata file
pub enum Error {
    /// A line that is neither blank, a comment, a section nor `key=value`
    #[error("malformed line {line}: {content:?}")]
    MalformedLine {
        /// 1-based line number
        line: usize,
        /// offending line
        content: String,
    },
    /// A `key=value` line appearing before any section
    #[error("line {line} is outside of any section")]
    OutsideSection {
        /// 1-based line number
        line: usize,
    },
    /// A value that cannot be converted to the field's type
    #[error("invalid value {value:?} for field {field}")]
    InvalidValue {
        /// field name
        field: &'static str,
        /// raw value
        value: String,
    },
    /// The `[Header]` section is absent
    #[error("header section not found")]
    MissingHeader,
    /// No `[MapInfo]` section present
    #[error("no resolution levels found")]
    NoLevels,
    /// A level lacks a required field
    #[error("resolution level {level} is missing field {field}")]
    MissingField {
        /// level index
        level: usize,
        /// field name
        field: &'static str,
    },
    /// A level whose pixel size or rotation cannot be inverted
    #[error("resolution level {level} has a degenerate pixel transform")]
    DegenerateTransform {
        /// level index
        level: usize,
    },
}
