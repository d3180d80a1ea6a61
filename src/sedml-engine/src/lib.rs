// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub mod backend;
pub mod common;
pub mod convert;
pub mod data_generators;
pub mod datamodel;
pub mod plot;
pub mod registry;
pub mod resolve;
pub mod sedml;
pub mod settings;

pub use self::backend::{ModelBackend, initialize_backend};
pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::convert::{ConversionState, Converter};
pub use self::registry::VariableRegistry;
pub use self::resolve::{EntityKind, EntityRef, EntityTable};
pub use self::sedml::SedDocument;
pub use self::settings::ExportSettings;
