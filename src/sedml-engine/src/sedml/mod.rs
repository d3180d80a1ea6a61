// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! In-memory SED-ML (Level 1 Version 2) document and its XML writer.

use quick_xml::Writer;

use crate::common::Result;
use sedml_core::xml::{
    ToXml, XmlWriter, format_f64, to_xml_string, write_empty_tag_with_attrs, write_tag,
    write_tag_end, write_tag_start, write_tag_start_with_attrs,
};

pub mod normalize;
pub mod write;

pub use self::normalize::normalize;
pub use self::write::{is_archive_path, write_to, write_to_archive};

pub const SEDML_LEVEL: u32 = 1;
pub const SEDML_VERSION: u32 = 2;
const XML_NS_SEDML: &str = "http://sed-ml.org/sed-ml/level1/version2";
const XML_NS_MATHML: &str = "http://www.w3.org/1998/Math/MathML";
pub const SBML_LANGUAGE: &str = "urn:sedml:language:sbml";
/// bound to the `sbml` prefix used by data generator targets
pub const SBML_L2V4_NAMESPACE: &str = "http://www.sbml.org/sbml/level2/version4";
pub const TIME_SYMBOL: &str = "urn:sedml:symbol:time";

const KISAO_DETERMINISTIC: &str = "KISAO:0000019";
const KISAO_STOCHASTIC: &str = "KISAO:0000029";

#[derive(Clone, Debug, PartialEq)]
pub struct ModelRef {
    pub id: String,
    pub language: String,
    /// location of the model file, relative to the document
    pub source: String,
    /// the model file's full text
    pub content: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Deterministic,
    Stochastic,
}

impl Algorithm {
    pub fn kisao_id(&self) -> &'static str {
        match self {
            Algorithm::Deterministic => KISAO_DETERMINISTIC,
            Algorithm::Stochastic => KISAO_STOCHASTIC,
        }
    }
}

/// A uniform time course simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct Simulation {
    pub id: String,
    pub algorithm: Algorithm,
    pub initial_time: f64,
    pub output_start_time: f64,
    pub output_end_time: f64,
    pub number_of_steps: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub simulation_reference: String,
    pub model_reference: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VariableTarget {
    /// an implicit quantity such as simulation time
    Symbol(String),
    /// an XPath into the referenced model
    XPath(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    pub id: String,
    pub task_reference: String,
    pub target: VariableTarget,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataGenerator {
    pub id: String,
    pub name: String,
    pub variables: Vec<Variable>,
    /// the computed expression; always a single variable's id
    pub math: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Curve {
    pub id: Option<String>,
    pub x_data_reference: String,
    pub y_data_reference: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plot2D {
    pub id: Option<String>,
    pub name: String,
    pub log_x: bool,
    pub log_y: bool,
    pub curves: Vec<Curve>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SedDocument {
    pub level: u32,
    pub version: u32,
    pub models: Vec<ModelRef>,
    pub simulations: Vec<Simulation>,
    pub tasks: Vec<Task>,
    pub data_generators: Vec<DataGenerator>,
    pub outputs: Vec<Plot2D>,
}

impl Default for SedDocument {
    fn default() -> Self {
        SedDocument {
            level: SEDML_LEVEL,
            version: SEDML_VERSION,
            models: vec![],
            simulations: vec![],
            tasks: vec![],
            data_generators: vec![],
            outputs: vec![],
        }
    }
}

impl SedDocument {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn data_generator(&self, id: &str) -> Option<&DataGenerator> {
        self.data_generators.iter().find(|dg| dg.id == id)
    }
}

fn bool_attr(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

impl ToXml<XmlWriter> for SedDocument {
    fn write_xml(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        let level = self.level.to_string();
        let version = self.version.to_string();
        let attrs = &[
            ("xmlns", XML_NS_SEDML),
            ("xmlns:sbml", SBML_L2V4_NAMESPACE),
            ("level", level.as_str()),
            ("version", version.as_str()),
        ];
        write_tag_start_with_attrs(writer, "sedML", attrs)?;

        if !self.simulations.is_empty() {
            write_tag_start(writer, "listOfSimulations")?;
            for sim in self.simulations.iter() {
                sim.write_xml(writer)?;
            }
            write_tag_end(writer, "listOfSimulations")?;
        }

        if !self.models.is_empty() {
            write_tag_start(writer, "listOfModels")?;
            for model in self.models.iter() {
                model.write_xml(writer)?;
            }
            write_tag_end(writer, "listOfModels")?;
        }

        if !self.tasks.is_empty() {
            write_tag_start(writer, "listOfTasks")?;
            for task in self.tasks.iter() {
                task.write_xml(writer)?;
            }
            write_tag_end(writer, "listOfTasks")?;
        }

        if !self.data_generators.is_empty() {
            write_tag_start(writer, "listOfDataGenerators")?;
            for dg in self.data_generators.iter() {
                dg.write_xml(writer)?;
            }
            write_tag_end(writer, "listOfDataGenerators")?;
        }

        if !self.outputs.is_empty() {
            write_tag_start(writer, "listOfOutputs")?;
            for output in self.outputs.iter() {
                output.write_xml(writer)?;
            }
            write_tag_end(writer, "listOfOutputs")?;
        }

        write_tag_end(writer, "sedML")
    }
}

impl ToXml<XmlWriter> for ModelRef {
    fn write_xml(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        let attrs = &[
            ("id", self.id.as_str()),
            ("language", self.language.as_str()),
            ("source", self.source.as_str()),
        ];
        write_empty_tag_with_attrs(writer, "model", attrs)
    }
}

impl ToXml<XmlWriter> for Simulation {
    fn write_xml(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        let initial_time = format_f64(self.initial_time);
        let output_start_time = format_f64(self.output_start_time);
        let output_end_time = format_f64(self.output_end_time);
        let number_of_points = self.number_of_steps.to_string();
        let attrs = &[
            ("id", self.id.as_str()),
            ("initialTime", initial_time.as_str()),
            ("outputStartTime", output_start_time.as_str()),
            ("outputEndTime", output_end_time.as_str()),
            ("numberOfPoints", number_of_points.as_str()),
        ];
        write_tag_start_with_attrs(writer, "uniformTimeCourse", attrs)?;
        write_empty_tag_with_attrs(writer, "algorithm", &[("kisaoID", self.algorithm.kisao_id())])?;
        write_tag_end(writer, "uniformTimeCourse")
    }
}

impl ToXml<XmlWriter> for Task {
    fn write_xml(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        let attrs = &[
            ("id", self.id.as_str()),
            ("modelReference", self.model_reference.as_str()),
            ("simulationReference", self.simulation_reference.as_str()),
        ];
        write_empty_tag_with_attrs(writer, "task", attrs)
    }
}

impl ToXml<XmlWriter> for Variable {
    fn write_xml(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        let target = match self.target {
            VariableTarget::Symbol(ref symbol) => ("symbol", symbol.as_str()),
            VariableTarget::XPath(ref xpath) => ("target", xpath.as_str()),
        };
        let attrs = &[
            ("id", self.id.as_str()),
            ("taskReference", self.task_reference.as_str()),
            target,
        ];
        write_empty_tag_with_attrs(writer, "variable", attrs)
    }
}

impl ToXml<XmlWriter> for DataGenerator {
    fn write_xml(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        let attrs = &[("id", self.id.as_str()), ("name", self.name.as_str())];
        write_tag_start_with_attrs(writer, "dataGenerator", attrs)?;

        write_tag_start(writer, "listOfVariables")?;
        for var in self.variables.iter() {
            var.write_xml(writer)?;
        }
        write_tag_end(writer, "listOfVariables")?;

        write_tag_start_with_attrs(writer, "math", &[("xmlns", XML_NS_MATHML)])?;
        write_tag(writer, "ci", &self.math)?;
        write_tag_end(writer, "math")?;

        write_tag_end(writer, "dataGenerator")
    }
}

impl ToXml<XmlWriter> for Plot2D {
    fn write_xml(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        let mut attrs: Vec<(&str, &str)> = vec![];
        if let Some(ref id) = self.id {
            attrs.push(("id", id));
        }
        attrs.push(("name", &self.name));
        write_tag_start_with_attrs(writer, "plot2D", &attrs)?;

        write_tag_start(writer, "listOfCurves")?;
        for curve in self.curves.iter() {
            // log scaling lives on curves in L1V2
            let mut attrs: Vec<(&str, &str)> = vec![];
            if let Some(ref id) = curve.id {
                attrs.push(("id", id));
            }
            attrs.push(("logX", bool_attr(self.log_x)));
            attrs.push(("logY", bool_attr(self.log_y)));
            attrs.push(("xDataReference", &curve.x_data_reference));
            attrs.push(("yDataReference", &curve.y_data_reference));
            write_empty_tag_with_attrs(writer, "curve", &attrs)?;
        }
        write_tag_end(writer, "listOfCurves")?;

        write_tag_end(writer, "plot2D")
    }
}

pub fn to_sedml(doc: &SedDocument) -> Result<String> {
    to_xml_string(doc)
}
