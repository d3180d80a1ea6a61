// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

// Re-export all common types from sedml-core
pub use sedml_core::common::*;
pub use sedml_core::{export_err, import_err, serialization_err};
