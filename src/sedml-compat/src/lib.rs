// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind as IoErrorKind};
use std::path::Path;

use tracing::debug;

pub use sedml_engine::{self as engine, Result};
use sedml_engine::ModelBackend;
use sedml_engine::common::{Error, ErrorCode, ErrorKind};
use sedml_engine::datamodel::Model;
use sedml_engine::sedml::write::write_atomically;

pub mod cps;
pub mod sbml;

pub fn open_copasi(reader: &mut dyn BufRead) -> Result<Model> {
    cps::model_from_reader(reader)
}

pub fn to_sbml(model: &Model) -> Result<String> {
    sbml::model_to_sbml(model)
}

/// Reads COPASI `.cps` files and exports their networks as SBML.
#[derive(Copy, Clone, Debug, Default)]
pub struct CopasiBackend;

impl ModelBackend for CopasiBackend {
    fn load(&self, path: &Path) -> Result<Model> {
        let file = File::open(path).map_err(|err| {
            let code = if err.kind() == IoErrorKind::NotFound {
                ErrorCode::DoesNotExist
            } else {
                ErrorCode::Io
            };
            Error::new(
                ErrorKind::Import,
                code,
                Some(format!("{}: {err}", path.display())),
            )
        })?;
        debug!(path = %path.display(), "reading COPASI model");
        let mut reader = BufReader::new(file);
        open_copasi(&mut reader)
    }

    fn export_network(&self, model: &Model, path: &Path) -> Result<()> {
        let sbml = to_sbml(model)?;
        write_atomically(path, sbml.as_bytes()).map_err(|err| {
            Error::new(
                ErrorKind::Export,
                err.code,
                Some(format!(
                    "{}: {}",
                    path.display(),
                    err.details.unwrap_or_default()
                )),
            )
        })
    }
}
