// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Assembles a SED-ML document from a native model and saves it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::backend::{ModelBackend, initialize_backend};
use crate::common::Result;
use crate::data_generators;
use crate::datamodel::{MethodSubType, Model};
use crate::plot;
use crate::registry::VariableRegistry;
use crate::resolve::EntityTable;
use crate::sedml::{
    Algorithm, ModelRef, SBML_LANGUAGE, SedDocument, Simulation, Task, is_archive_path,
    normalize, write_to, write_to_archive,
};
use crate::settings::ExportSettings;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConversionState {
    Unconverted,
    Converted,
    Saved,
    Failed,
}

pub struct Converter<B: ModelBackend> {
    backend: B,
    source_file: PathBuf,
    settings: ExportSettings,
    state: ConversionState,
    document: Option<SedDocument>,
}

/// `<dir of out_file>/<stem of out_file><suffix>`
pub fn network_path(out_file: &Path, suffix: &str) -> PathBuf {
    let stem = out_file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{stem}{suffix}");
    match out_file.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

fn select_algorithm(sub_type: &MethodSubType) -> Algorithm {
    match sub_type {
        MethodSubType::Deterministic => Algorithm::Deterministic,
        _ => Algorithm::Stochastic,
    }
}

impl<B: ModelBackend> Converter<B> {
    pub fn new(backend: B, source_file: impl Into<PathBuf>) -> Self {
        Converter {
            backend,
            source_file: source_file.into(),
            settings: ExportSettings::default(),
            state: ConversionState::Unconverted,
            document: None,
        }
    }

    pub fn with_settings(mut self, settings: ExportSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn state(&self) -> ConversionState {
        self.state
    }

    pub fn document(&self) -> Option<&SedDocument> {
        self.document.as_ref()
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Builds the document, exporting the network next to `out_file`. Once
    /// converted, later calls return the existing document.
    pub fn convert(&mut self, out_file: &Path) -> Result<&SedDocument> {
        let doc = match self.document.take() {
            Some(doc) => doc,
            None => match self.assemble(out_file) {
                Ok(doc) => {
                    self.state = ConversionState::Converted;
                    doc
                }
                Err(err) => {
                    self.state = ConversionState::Failed;
                    return Err(err);
                }
            },
        };
        let doc: &SedDocument = self.document.insert(doc);
        Ok(doc)
    }

    /// Converts if needed, then writes an archive or a plain document
    /// depending on `out_file`'s extension. After a failed conversion this
    /// writes nothing.
    pub fn save_to(&mut self, out_file: &Path) -> Result<()> {
        if self.state == ConversionState::Unconverted {
            self.convert(out_file)?;
        }
        let Some(ref doc) = self.document else {
            warn!(path = %out_file.display(), "no converted document to save");
            return Ok(());
        };

        if is_archive_path(out_file, &self.settings.archive_extension) {
            write_to_archive(doc, out_file)?;
        } else {
            write_to(doc, out_file)?;
        }
        info!(path = %out_file.display(), "saved SED-ML");
        self.state = ConversionState::Saved;
        Ok(())
    }

    fn assemble(&self, out_file: &Path) -> Result<SedDocument> {
        initialize_backend(&self.backend)?;

        let model = self.backend.load(&self.source_file)?;
        info!(source = %self.source_file.display(), model = %model.name, "loaded model");

        let network_file = network_path(out_file, &self.settings.network_suffix);
        self.backend.export_network(&model, &network_file)?;
        let content = fs::read_to_string(&network_file)?;
        info!(path = %network_file.display(), "exported reaction network");

        let source = network_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut doc = SedDocument::new();
        doc.models.push(ModelRef {
            id: self.settings.model_id.clone(),
            language: SBML_LANGUAGE.to_owned(),
            source,
            content: Some(content),
        });

        self.add_time_course(&model, &mut doc);

        normalize(&mut doc);
        Ok(doc)
    }

    fn add_time_course(&self, model: &Model, doc: &mut SedDocument) {
        let settings = &self.settings;
        let Some((task, problem)) = model
            .task(&settings.task_name)
            .and_then(|task| task.time_course().map(|problem| (task, problem)))
        else {
            info!(task = %settings.task_name, "no time course task; writing model reference only");
            return;
        };

        let algorithm = select_algorithm(&task.method.sub_type);
        debug!(method = %task.method.name, ?algorithm, "selected algorithm");
        doc.simulations.push(Simulation {
            id: settings.simulation_id.clone(),
            algorithm,
            initial_time: model.initial_time,
            output_start_time: problem.output_start_time,
            output_end_time: problem.output_end_time(),
            number_of_steps: problem.step_number,
        });
        doc.tasks.push(Task {
            id: settings.task_id.clone(),
            simulation_reference: settings.simulation_id.clone(),
            model_reference: settings.model_id.clone(),
        });

        let table = EntityTable::new(model);
        let mut registry = VariableRegistry::new();
        for spec in model.plots.iter() {
            let plot = plot::translate(spec, &table, &mut registry);
            if plot.curves.is_empty() {
                debug!(plot = %spec.title, "dropping plot without curves");
                continue;
            }
            doc.outputs.push(plot);
        }

        doc.data_generators =
            data_generators::build(&registry, &settings.task_id, &settings.variable_symbol);
        info!(
            outputs = doc.outputs.len(),
            data_generators = doc.data_generators.len(),
            "translated plots"
        );
    }
}

#[test]
fn test_network_path() {
    assert_eq!(
        PathBuf::from("out/experiment-sbml.xml"),
        network_path(Path::new("out/experiment.sedml"), "-sbml.xml")
    );
    assert_eq!(
        PathBuf::from("experiment-sbml.xml"),
        network_path(Path::new("experiment.sedx"), "-sbml.xml")
    );
}

#[test]
fn test_select_algorithm() {
    assert_eq!(
        Algorithm::Deterministic,
        select_algorithm(&MethodSubType::Deterministic)
    );
    assert_eq!(
        Algorithm::Stochastic,
        select_algorithm(&MethodSubType::Stochastic)
    );
    assert_eq!(
        Algorithm::Stochastic,
        select_algorithm(&MethodSubType::Hybrid)
    );
    assert_eq!(
        Algorithm::Stochastic,
        select_algorithm(&MethodSubType::Other("Euler".to_owned()))
    );
}
