//! Errors for readpdf

use std::error::Error as IError;
use std::fmt;
use std::io::Error as IoError;

/// error_chain and failure are certainly nice, but completely overengineered
/// for this use-case. For example, neither of them allow error localization.
/// Additionally, debugging macros can get hairy really quick and matching with
/// `*e.kind()` or doing From conversions for other errors is really hard to do.
///
/// So in this case, the best form of error handling is to use the simple Rust-native
/// way: Just enums, `From` + pattern matching. No macros, except for this one.
///
/// What this macro does is (simplified): `impl From<$a> for $b { $b::$variant(error) }`
macro_rules! impl_from {
    ($from:ident, $to:ident::$variant:ident) => {
        impl From<$from> for $to {
            fn from(err: $from) -> Self {
                $to::$variant(err.into())
            }
        }
    };
}

/// Errors that terminate opening or saving a document. Faults inside a content
/// stream never surface here; the interpreter downgrades them to warnings.
#[derive(Debug)]
pub enum Error {
    /// External: std::io::Error
    Io(IoError),
    /// The lexer could not close a balanced construct
    MalformedSyntax(String),
    /// No `%PDF-x.y` marker within the first 1 KiB
    InvalidHeader,
    /// No `startxref` / `%%EOF` within the last 1 KiB
    InvalidTrailer,
    /// The cross-reference table or stream could not be decoded
    InvalidXref(String),
    /// Password authentication against the Standard security handler failed
    BadPassword,
    /// A stream filter this crate does not implement
    UnsupportedFilter(String),
    /// A filter produced an error or wrong-size output
    CorruptStream(String),
    /// An indirect reference resolves to a free or absent slot
    MissingObject(u32, u16),
    /// Caller-side cancellation predicate fired
    Cancelled,
}

impl_from!(IoError, Error::Io);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Error::*;
        match self {
            Io(e) => write!(f, "{e}"),
            MalformedSyntax(msg) => write!(f, "malformed PDF syntax: {msg}"),
            InvalidHeader => write!(f, "no %PDF header in the first 1 KiB"),
            InvalidTrailer => write!(f, "no startxref / %%EOF in the last 1 KiB"),
            InvalidXref(msg) => write!(f, "invalid cross-reference data: {msg}"),
            BadPassword => write!(f, "password authentication failed"),
            UnsupportedFilter(name) => write!(f, "unsupported stream filter {name}"),
            CorruptStream(msg) => write!(f, "corrupt stream: {msg}"),
            MissingObject(num, gen) => write!(f, "object {num} {gen} R is missing or free"),
            Cancelled => write!(f, "operation cancelled by caller"),
        }
    }
}

impl IError for Error {}

/// A non-fatal diagnostic recorded while parsing or interpreting a page.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PdfWarnMsg {
    pub page: usize,
    pub op_id: usize,
    pub severity: &'static str,
    pub msg: String,
}

impl PdfWarnMsg {
    pub const ERROR: &'static str = "error";
    pub const WARNING: &'static str = "warning";

    pub fn error(page: usize, op_id: usize, e: String) -> Self {
        PdfWarnMsg {
            page,
            op_id,
            severity: Self::ERROR,
            msg: e,
        }
    }

    pub fn warning(page: usize, op_id: usize, e: String) -> Self {
        PdfWarnMsg {
            page,
            op_id,
            severity: Self::WARNING,
            msg: e,
        }
    }
}
