// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, io, result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DoesNotExist, // the named file or entity doesn't exist
    XmlDeserialization,
    XmlSerialization,
    MissingModel,
    BackendInit,
    Io,
    Archive,
    Generic,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            DoesNotExist => "does_not_exist",
            XmlDeserialization => "xml_deserialization",
            XmlSerialization => "xml_serialization",
            MissingModel => "missing_model",
            BackendInit => "backend_init",
            Io => "io",
            Archive => "archive",
            Generic => "generic",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading the native model failed.
    Import,
    /// Writing the exported reaction network failed.
    Export,
    /// Writing the experiment description failed.
    Serialization,
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        let code = if err.kind() == io::ErrorKind::NotFound {
            ErrorCode::DoesNotExist
        } else {
            ErrorCode::Io
        };
        Error::new(ErrorKind::Io, code, Some(err.to_string()))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Import => "ImportError",
            ErrorKind::Export => "ExportError",
            ErrorKind::Serialization => "SerializationError",
            ErrorKind::Io => "IoError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! import_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Import, ErrorCode::$code, Some($str)))
    }}
);

#[macro_export]
macro_rules! export_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Export, ErrorCode::$code, Some($str)))
    }}
);

#[macro_export]
macro_rules! serialization_err(
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Serialization, ErrorCode::$code, Some($str)))
    }}
);

#[test]
fn test_error_display() {
    let err = Error::new(
        ErrorKind::Import,
        ErrorCode::XmlDeserialization,
        Some("unexpected end of file".to_owned()),
    );
    assert_eq!(
        "ImportError{xml_deserialization: unexpected end of file}",
        format!("{err}")
    );

    let err = Error::new(ErrorKind::Serialization, ErrorCode::Archive, None);
    assert_eq!("SerializationError{archive}", format!("{err}"));
}

#[test]
fn test_io_error_conversion() {
    let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
    assert_eq!(ErrorKind::Io, err.kind);
    assert_eq!(ErrorCode::DoesNotExist, err.code);

    let err: Error = io::Error::other("disk full").into();
    assert_eq!(ErrorCode::Io, err.code);
    assert_eq!(Some("disk full".to_owned()), err.get_details());
}

#[test]
fn test_error_macros() {
    let result: Result<()> = import_err!(MissingModel, "no <Model> element".to_owned());
    let err = result.unwrap_err();
    assert_eq!(ErrorKind::Import, err.kind);
    assert_eq!(ErrorCode::MissingModel, err.code);

    let result: Result<()> = export_err!(Generic, "unknown species".to_owned());
    assert_eq!(ErrorKind::Export, result.unwrap_err().kind);

    let result: Result<()> = serialization_err!(Archive, "zip".to_owned());
    assert_eq!(ErrorKind::Serialization, result.unwrap_err().kind);
}
