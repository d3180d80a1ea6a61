// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

/// Fixed names used while assembling a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSettings {
    /// name of the native task translated into the simulation
    pub task_name: String,
    /// appended to the destination's stem to name the exported network file
    pub network_suffix: String,
    /// destinations whose extension ends with this are written as archives
    pub archive_extension: String,
    pub model_id: String,
    pub simulation_id: String,
    pub task_id: String,
    /// id of the single variable inside every data generator
    pub variable_symbol: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            task_name: "Time-Course".to_owned(),
            network_suffix: "-sbml.xml".to_owned(),
            archive_extension: "sedx".to_owned(),
            model_id: "model1".to_owned(),
            simulation_id: "sim1".to_owned(),
            task_id: "task1".to_owned(),
            variable_symbol: "v".to_owned(),
        }
    }
}
