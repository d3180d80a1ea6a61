// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::path::Path;
use std::sync::OnceLock;

use tracing::debug;

use crate::common::{Error, ErrorCode, Result};
use crate::datamodel::Model;

/// The native model reader/writer the exporter drives.
pub trait ModelBackend {
    /// Process-wide setup; called at most once per process through
    /// [`initialize_backend`].
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Model>;

    /// Writes the model's reaction network in the exchange format to `path`.
    fn export_network(&self, model: &Model, path: &Path) -> Result<()>;
}

fn backend_init_error(err: Error) -> Error {
    let details = match err.details {
        Some(details) => format!("backend initialization failed: {details}"),
        None => "backend initialization failed".to_owned(),
    };
    Error::new(err.kind, ErrorCode::BackendInit, Some(details))
}

static BACKEND_INIT: OnceLock<Result<()>> = OnceLock::new();

/// Runs `backend.initialize()` the first time any conversion in this process
/// needs it; later callers observe the first outcome.
pub fn initialize_backend<B: ModelBackend + ?Sized>(backend: &B) -> Result<()> {
    BACKEND_INIT
        .get_or_init(|| {
            debug!("initializing model backend");
            backend.initialize().map_err(backend_init_error)
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingBackend {
        inits: AtomicUsize,
    }

    impl ModelBackend for CountingBackend {
        fn initialize(&self) -> Result<()> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn load(&self, _path: &Path) -> Result<Model> {
            unreachable!()
        }

        fn export_network(&self, _model: &Model, _path: &Path) -> Result<()> {
            unreachable!()
        }
    }

    #[test]
    fn test_backend_init_error() {
        use crate::common::ErrorKind;

        let err = backend_init_error(Error::new(
            ErrorKind::Import,
            ErrorCode::Io,
            Some("missing runtime".to_owned()),
        ));
        assert_eq!(ErrorKind::Import, err.kind);
        assert_eq!(ErrorCode::BackendInit, err.code);
        assert_eq!(
            Some("backend initialization failed: missing runtime".to_owned()),
            err.details
        );

        let err = backend_init_error(Error::new(ErrorKind::Io, ErrorCode::Generic, None));
        assert_eq!(ErrorCode::BackendInit, err.code);
    }

    #[test]
    fn test_initialize_at_most_once() {
        let backend = CountingBackend {
            inits: AtomicUsize::new(0),
        };
        for _ in 0..3 {
            initialize_backend(&backend).unwrap();
        }
        // another test in this process may have won the race
        assert!(backend.inits.load(Ordering::SeqCst) <= 1);
    }
}
