// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Reader for COPASI `.cps` files.
//!
//! The serde structs below mirror the subset of the CopasiML schema the
//! exporter needs; everything else in the file is skipped. [`convert`] turns
//! them into the engine's datamodel, computing the common names plot channels
//! refer to and the identifiers entities receive in the exported network.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use quick_xml::de;
use serde::Deserialize;
use tracing::debug;

use sedml_engine::common::{Error, ErrorCode, ErrorKind, Result, import_err};
use sedml_engine::datamodel;

use crate::sbml::AVOGADRO;

const DEFAULT_QUANTITY_UNIT: &str = "mol";
const PLOT_2D: &str = "Plot2D";

const STOCHASTIC_METHODS: &[&str] = &[
    "Stochastic",
    "Direct method",
    "DirectMethod",
    "Gibson",
    "tau-Leap",
    "TauLeap",
];

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename = "COPASI")]
pub struct File {
    #[serde(rename = "Model")]
    pub model: Option<Model>,
    #[serde(rename = "ListOfTasks")]
    pub tasks: Option<ListOfTasks>,
    #[serde(rename = "ListOfPlots")]
    pub plots: Option<ListOfPlots>,
    #[serde(rename = "SBMLReference")]
    pub sbml_reference: Option<SbmlReference>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Model {
    #[serde(rename = "@key", default)]
    pub key: String,
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@quantityUnit")]
    pub quantity_unit: Option<String>,
    #[serde(rename = "@avogadroConstant")]
    pub avogadro_constant: Option<f64>,
    #[serde(rename = "ListOfCompartments")]
    pub compartments: Option<ListOfCompartments>,
    #[serde(rename = "ListOfMetabolites")]
    pub metabolites: Option<ListOfMetabolites>,
    #[serde(rename = "ListOfModelValues")]
    pub model_values: Option<ListOfModelValues>,
    #[serde(rename = "ListOfReactions")]
    pub reactions: Option<ListOfReactions>,
    #[serde(rename = "ListOfModelParameterSets")]
    pub parameter_sets: Option<ListOfModelParameterSets>,
    #[serde(rename = "StateTemplate")]
    pub state_template: Option<StateTemplate>,
    #[serde(rename = "InitialState")]
    pub initial_state: Option<InitialState>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListOfCompartments {
    #[serde(rename = "Compartment", default)]
    pub compartments: Vec<Compartment>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Compartment {
    #[serde(rename = "@key")]
    pub key: String,
    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListOfMetabolites {
    #[serde(rename = "Metabolite", default)]
    pub metabolites: Vec<Metabolite>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Metabolite {
    #[serde(rename = "@key")]
    pub key: String,
    #[serde(rename = "@name")]
    pub name: String,
    /// key of the owning compartment
    #[serde(rename = "@compartment")]
    pub compartment: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListOfModelValues {
    #[serde(rename = "ModelValue", default)]
    pub model_values: Vec<ModelValue>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ModelValue {
    #[serde(rename = "@key")]
    pub key: String,
    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListOfReactions {
    #[serde(rename = "Reaction", default)]
    pub reactions: Vec<Reaction>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Reaction {
    #[serde(rename = "@key")]
    pub key: String,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@reversible", default)]
    pub reversible: bool,
    #[serde(rename = "ListOfSubstrates")]
    pub substrates: Option<ListOfSubstrates>,
    #[serde(rename = "ListOfProducts")]
    pub products: Option<ListOfProducts>,
    #[serde(rename = "ListOfModifiers")]
    pub modifiers: Option<ListOfModifiers>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListOfSubstrates {
    #[serde(rename = "Substrate", default)]
    pub substrates: Vec<Stoichiometry>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListOfProducts {
    #[serde(rename = "Product", default)]
    pub products: Vec<Stoichiometry>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListOfModifiers {
    #[serde(rename = "Modifier", default)]
    pub modifiers: Vec<Stoichiometry>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Stoichiometry {
    #[serde(rename = "@metabolite")]
    pub metabolite: String,
    #[serde(rename = "@stoichiometry")]
    pub stoichiometry: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListOfModelParameterSets {
    #[serde(rename = "@activeSet")]
    pub active_set: Option<String>,
    #[serde(rename = "ModelParameterSet", default)]
    pub sets: Vec<ModelParameterSet>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ModelParameterSet {
    #[serde(rename = "@key", default)]
    pub key: String,
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "ModelParameterGroup", default)]
    pub groups: Vec<ModelParameterGroup>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ModelParameterGroup {
    #[serde(rename = "@cn", default)]
    pub cn: String,
    #[serde(rename = "ModelParameterGroup", default)]
    pub groups: Vec<ModelParameterGroup>,
    #[serde(rename = "ModelParameter", default)]
    pub parameters: Vec<ModelParameter>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ModelParameter {
    #[serde(rename = "@cn")]
    pub cn: String,
    #[serde(rename = "@value")]
    pub value: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StateTemplate {
    #[serde(rename = "StateTemplateVariable", default)]
    pub variables: Vec<StateTemplateVariable>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StateTemplateVariable {
    #[serde(rename = "@objectReference")]
    pub object_reference: String,
}

/// Whitespace separated values, in [`StateTemplate`] order.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct InitialState {
    #[serde(rename = "$text", default)]
    pub values: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListOfTasks {
    #[serde(rename = "Task", default)]
    pub tasks: Vec<Task>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Task {
    #[serde(rename = "@key", default)]
    pub key: String,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@type")]
    pub kind: String,
    #[serde(rename = "Problem")]
    pub problem: Option<Problem>,
    #[serde(rename = "Method")]
    pub method: Option<Method>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Problem {
    #[serde(rename = "Parameter", default)]
    pub parameters: Vec<Parameter>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Parameter {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@value")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Method {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@type", default)]
    pub kind: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListOfPlots {
    #[serde(rename = "PlotSpecification", default)]
    pub plots: Vec<PlotSpecification>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PlotSpecification {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@type", default)]
    pub kind: String,
    #[serde(rename = "Parameter", default)]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "ListOfPlotItems")]
    pub items: Option<ListOfPlotItems>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListOfPlotItems {
    #[serde(rename = "PlotItem", default)]
    pub items: Vec<PlotItem>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PlotItem {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "ListOfChannels")]
    pub channels: Option<ListOfChannels>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ListOfChannels {
    #[serde(rename = "ChannelSpec", default)]
    pub channels: Vec<ChannelSpec>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChannelSpec {
    #[serde(rename = "@cn")]
    pub cn: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SbmlReference {
    #[serde(rename = "@file")]
    pub file: Option<String>,
    #[serde(rename = "SBMLMap", default)]
    pub maps: Vec<SbmlMap>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SbmlMap {
    #[serde(rename = "@SBMLid")]
    pub sbml_id: String,
    #[serde(rename = "@COPASIkey")]
    pub copasi_key: String,
}

pub fn file_from_reader(reader: &mut dyn BufRead) -> Result<File> {
    de::from_reader(reader).map_err(|err| {
        Error::new(
            ErrorKind::Import,
            ErrorCode::XmlDeserialization,
            Some(err.to_string()),
        )
    })
}

pub fn model_from_reader(reader: &mut dyn BufRead) -> Result<datamodel::Model> {
    convert(file_from_reader(reader)?)
}

/// Prefixes the characters that delimit common names with a backslash.
pub fn escape_cn(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '\\' | '[' | ']' | ',' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn model_cn(name: &str) -> String {
    format!("CN=Root,Model={}", escape_cn(name))
}

fn vector_cn(parent: &str, vector: &str, name: &str) -> String {
    format!("{parent},Vector={vector}[{}]", escape_cn(name))
}

pub fn method_sub_type(kind: &str) -> datamodel::MethodSubType {
    use datamodel::MethodSubType;
    if kind.starts_with("Deterministic") {
        MethodSubType::Deterministic
    } else if STOCHASTIC_METHODS.iter().any(|prefix| kind.starts_with(prefix)) {
        MethodSubType::Stochastic
    } else if kind.starts_with("Hybrid") {
        MethodSubType::Hybrid
    } else {
        MethodSubType::Other(kind.to_owned())
    }
}

/// Hands out exported network identifiers, preferring the ones recorded in
/// the file's SBML reference and keeping every identifier unique.
struct SbmlIds {
    mapped: HashMap<String, String>,
    reserved: HashSet<String>,
    used: HashSet<String>,
    counters: HashMap<&'static str, usize>,
}

impl SbmlIds {
    fn new(reference: Option<&SbmlReference>) -> Self {
        let mut mapped = HashMap::new();
        for map in reference.iter().flat_map(|r| r.maps.iter()) {
            if map.sbml_id.is_empty() {
                continue;
            }
            mapped
                .entry(map.copasi_key.clone())
                .or_insert_with(|| map.sbml_id.clone());
        }
        let reserved = mapped.values().cloned().collect();
        SbmlIds {
            mapped,
            reserved,
            used: HashSet::new(),
            counters: HashMap::new(),
        }
    }

    fn assign(&mut self, key: &str, prefix: &'static str) -> String {
        if let Some(id) = self.mapped.get(key) {
            if self.used.insert(id.clone()) {
                return id.clone();
            }
            debug!(key, %id, "SBML id already taken; generating a fresh one");
        }
        let counter = self.counters.entry(prefix).or_insert(0);
        loop {
            *counter += 1;
            let id = format!("{prefix}_{counter}");
            if !self.reserved.contains(&id) && self.used.insert(id.clone()) {
                return id;
            }
        }
    }
}

/// Initial values from the active parameter set, keyed by common name,
/// falling back to the serialized initial state, keyed by object key.
#[derive(Default)]
struct InitialValues {
    by_cn: HashMap<String, f64>,
    by_key: HashMap<String, f64>,
}

impl InitialValues {
    fn new(model: &Model) -> Self {
        let mut values = InitialValues::default();

        if let Some(ref sets) = model.parameter_sets {
            let active = sets
                .active_set
                .as_deref()
                .and_then(|key| sets.sets.iter().find(|set| set.key == key))
                .or_else(|| sets.sets.first());
            if let Some(set) = active {
                debug!(set = %set.name, "reading initial values from parameter set");
                for group in set.groups.iter() {
                    values.collect_group(group);
                }
            }
        }

        if let (Some(template), Some(state)) = (&model.state_template, &model.initial_state) {
            for (variable, value) in template
                .variables
                .iter()
                .zip(state.values.split_whitespace())
            {
                match value.parse::<f64>() {
                    Ok(value) => {
                        values
                            .by_key
                            .insert(variable.object_reference.clone(), value);
                    }
                    Err(_) => {
                        debug!(key = %variable.object_reference, value, "unparseable initial state value");
                    }
                }
            }
        }

        values
    }

    fn collect_group(&mut self, group: &ModelParameterGroup) {
        for param in group.parameters.iter() {
            if let Some(value) = param.value {
                self.by_cn.entry(param.cn.clone()).or_insert(value);
            }
        }
        for child in group.groups.iter() {
            self.collect_group(child);
        }
    }

    fn get(&self, cn: &str, key: &str) -> Option<f64> {
        self.by_cn
            .get(cn)
            .or_else(|| self.by_key.get(key))
            .copied()
    }
}

fn problem_value(problem: &Problem, name: &str) -> Option<f64> {
    problem
        .parameters
        .iter()
        .find(|param| param.name == name)
        .and_then(|param| param.value.as_deref())
        .and_then(|value| value.trim().parse::<f64>().ok())
}

fn time_course_problem(problem: &Problem) -> Option<datamodel::TimeCourseProblem> {
    let step_number = problem_value(problem, "StepNumber")?;
    let step_size = problem_value(problem, "StepSize").or_else(|| {
        problem_value(problem, "Duration")
            .filter(|_| step_number > 0.0)
            .map(|duration| duration / step_number)
    })?;
    Some(datamodel::TimeCourseProblem {
        output_start_time: problem_value(problem, "OutputStartTime").unwrap_or(0.0),
        step_number: step_number as u32,
        step_size,
    })
}

fn convert_task(task: &Task) -> datamodel::Task {
    use datamodel::TaskKind;
    let kind = match task.kind.as_str() {
        "timeCourse" => TaskKind::TimeCourse,
        "steadyState" => TaskKind::SteadyState,
        other => TaskKind::Other(other.to_owned()),
    };
    let method = match task.method {
        Some(ref method) => datamodel::Method {
            name: method.name.clone(),
            sub_type: method_sub_type(&method.kind),
        },
        None => datamodel::Method {
            name: String::new(),
            sub_type: datamodel::MethodSubType::Other(String::new()),
        },
    };
    let problem = match (&kind, &task.problem) {
        (TaskKind::TimeCourse, Some(problem)) => {
            let time_course = time_course_problem(problem);
            if time_course.is_none() {
                debug!(task = %task.name, "time course problem without step settings");
            }
            time_course
        }
        _ => None,
    };
    datamodel::Task {
        name: task.name.clone(),
        kind,
        method,
        problem,
    }
}

fn flag(parameters: &[Parameter], name: &str) -> bool {
    parameters
        .iter()
        .find(|param| param.name == name)
        .and_then(|param| param.value.as_deref())
        .is_some_and(|value| matches!(value.trim(), "1" | "true"))
}

fn convert_plot(plot: &PlotSpecification) -> Option<datamodel::PlotSpecification> {
    if plot.kind != PLOT_2D {
        debug!(plot = %plot.name, kind = %plot.kind, "skipping plot that is not a 2D plot");
        return None;
    }
    let items = plot
        .items
        .iter()
        .flat_map(|items| items.items.iter())
        .map(|item| datamodel::PlotItem {
            name: item.name.clone(),
            channels: item
                .channels
                .iter()
                .flat_map(|channels| channels.channels.iter())
                .map(|channel| channel.cn.clone())
                .collect(),
        })
        .collect();
    Some(datamodel::PlotSpecification {
        title: plot.name.clone(),
        log_x: flag(&plot.parameters, "log X"),
        log_y: flag(&plot.parameters, "log Y"),
        items,
    })
}

fn species_refs(refs: &[Stoichiometry]) -> Vec<datamodel::SpeciesReference> {
    refs.iter()
        .map(|r| datamodel::SpeciesReference {
            species: r.metabolite.clone(),
            stoichiometry: r.stoichiometry.unwrap_or(1.0),
        })
        .collect()
}

/// Builds the engine datamodel from a parsed `.cps` file.
pub fn convert(file: File) -> Result<datamodel::Model> {
    let Some(model) = file.model else {
        return import_err!(MissingModel, "file has no Model element".to_owned());
    };
    let cn = model_cn(&model.name);
    let values = InitialValues::new(&model);
    let mut ids = SbmlIds::new(file.sbml_reference.as_ref());

    let mut compartments = vec![];
    for c in model.compartments.iter().flat_map(|l| l.compartments.iter()) {
        let compartment_cn = vector_cn(&cn, "Compartments", &c.name);
        compartments.push(datamodel::Compartment {
            key: c.key.clone(),
            sbml_id: ids.assign(&c.key, "compartment"),
            name: c.name.clone(),
            initial_size: values.get(&compartment_cn, &c.key),
            cn: compartment_cn,
        });
    }

    let metabolites: Vec<&Metabolite> = model
        .metabolites
        .iter()
        .flat_map(|l| l.metabolites.iter())
        .collect();
    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    for m in metabolites.iter() {
        *name_counts.entry(m.name.as_str()).or_default() += 1;
    }

    let mut species = vec![];
    for m in metabolites {
        let Some(compartment) = compartments.iter().find(|c| c.key == m.compartment) else {
            return import_err!(
                Generic,
                format!(
                    "species '{}' is in unknown compartment '{}'",
                    m.name, m.compartment
                )
            );
        };
        let species_cn = vector_cn(&compartment.cn, "Metabolites", &m.name);
        let display_name = if name_counts.get(m.name.as_str()).copied().unwrap_or(0) > 1 {
            format!("{}{{{}}}", m.name, compartment.name)
        } else {
            m.name.clone()
        };
        species.push(datamodel::Species {
            key: m.key.clone(),
            sbml_id: ids.assign(&m.key, "species"),
            name: m.name.clone(),
            display_name,
            compartment: m.compartment.clone(),
            initial_particle_number: values.get(&species_cn, &m.key),
            cn: species_cn,
        });
    }

    let mut parameters = vec![];
    for v in model.model_values.iter().flat_map(|l| l.model_values.iter()) {
        let value_cn = vector_cn(&cn, "Values", &v.name);
        parameters.push(datamodel::Parameter {
            key: v.key.clone(),
            sbml_id: ids.assign(&v.key, "parameter"),
            name: v.name.clone(),
            initial_value: values.get(&value_cn, &v.key),
            cn: value_cn,
        });
    }

    let mut reactions = vec![];
    for r in model.reactions.iter().flat_map(|l| l.reactions.iter()) {
        reactions.push(datamodel::Reaction {
            key: r.key.clone(),
            cn: vector_cn(&cn, "Reactions", &r.name),
            sbml_id: ids.assign(&r.key, "reaction"),
            name: r.name.clone(),
            reversible: r.reversible,
            substrates: r
                .substrates
                .as_ref()
                .map(|l| species_refs(&l.substrates))
                .unwrap_or_default(),
            products: r
                .products
                .as_ref()
                .map(|l| species_refs(&l.products))
                .unwrap_or_default(),
            modifiers: r
                .modifiers
                .iter()
                .flat_map(|l| l.modifiers.iter())
                .map(|m| m.metabolite.clone())
                .collect(),
        });
    }

    let tasks = file
        .tasks
        .iter()
        .flat_map(|l| l.tasks.iter())
        .map(convert_task)
        .collect();
    let plots = file
        .plots
        .iter()
        .flat_map(|l| l.plots.iter())
        .filter_map(convert_plot)
        .collect();

    Ok(datamodel::Model {
        initial_time: values.get(&cn, &model.key).unwrap_or(0.0),
        quantity_unit: model
            .quantity_unit
            .unwrap_or_else(|| DEFAULT_QUANTITY_UNIT.to_owned()),
        avogadro: model.avogadro_constant.unwrap_or(AVOGADRO),
        name: model.name,
        cn,
        compartments,
        species,
        parameters,
        reactions,
        tasks,
        plots,
    })
}

#[cfg(test)]
mod tests {
    use sedml_engine::datamodel::{MethodSubType, TaskKind};

    use super::*;

    const TWO_CELLS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<COPASI xmlns="http://www.copasi.org/static/schema" versionMajor="4" versionMinor="34">
  <Model key="Model_1" name="Two, Cells" quantityUnit="mmol">
    <ListOfCompartments>
      <Compartment key="Compartment_0" name="inside" simulationType="fixed" dimensionality="3"/>
      <Compartment key="Compartment_1" name="outside" simulationType="fixed" dimensionality="3"/>
    </ListOfCompartments>
    <ListOfMetabolites>
      <Metabolite key="Metabolite_0" name="A" simulationType="reactions" compartment="Compartment_0"/>
      <Metabolite key="Metabolite_1" name="A" simulationType="reactions" compartment="Compartment_1"/>
      <Metabolite key="Metabolite_2" name="B[1]" simulationType="reactions" compartment="Compartment_1"/>
    </ListOfMetabolites>
    <ListOfModelValues>
      <ModelValue key="ModelValue_0" name="k" simulationType="fixed"/>
    </ListOfModelValues>
    <ListOfReactions>
      <Reaction key="Reaction_0" name="transport" reversible="true" fast="false">
        <ListOfSubstrates>
          <Substrate metabolite="Metabolite_0" stoichiometry="1"/>
        </ListOfSubstrates>
        <ListOfProducts>
          <Product metabolite="Metabolite_1" stoichiometry="2"/>
        </ListOfProducts>
        <ListOfModifiers>
          <Modifier metabolite="Metabolite_2" stoichiometry="1"/>
        </ListOfModifiers>
      </Reaction>
    </ListOfReactions>
    <StateTemplate>
      <StateTemplateVariable objectReference="Model_1"/>
      <StateTemplateVariable objectReference="Metabolite_0"/>
      <StateTemplateVariable objectReference="Metabolite_1"/>
      <StateTemplateVariable objectReference="Metabolite_2"/>
      <StateTemplateVariable objectReference="Compartment_0"/>
      <StateTemplateVariable objectReference="Compartment_1"/>
      <StateTemplateVariable objectReference="ModelValue_0"/>
    </StateTemplate>
    <InitialState type="initialState">
      2.5 10 20 30 1 4 0.25
    </InitialState>
  </Model>
  <ListOfTasks>
    <Task key="Task_1" name="Steady-State" type="steadyState" scheduled="false">
      <Method name="Enhanced Newton" type="EnhancedNewton"/>
    </Task>
    <Task key="Task_2" name="Time-Course" type="timeCourse" scheduled="false">
      <Problem>
        <Parameter name="AutomaticStepSize" type="bool" value="0"/>
        <Parameter name="Duration" type="float" value="50"/>
        <Parameter name="StepNumber" type="unsignedInteger" value="100"/>
        <Parameter name="OutputStartTime" type="float" value="5"/>
      </Problem>
      <Method name="Stochastic (Direct method)" type="DirectMethod"/>
    </Task>
  </ListOfTasks>
  <ListOfPlots>
    <PlotSpecification name="both" type="Plot2D" active="1">
      <Parameter name="log X" type="bool" value="0"/>
      <Parameter name="log Y" type="bool" value="1"/>
      <ListOfPlotItems>
        <PlotItem name="[A]" type="Curve2D">
          <Parameter name="Line type" type="unsignedInteger" value="0"/>
          <ListOfChannels>
            <ChannelSpec cn="CN=Root,Model=Two\, Cells,Reference=Time"/>
            <ChannelSpec cn="CN=Root,Model=Two\, Cells,Vector=Compartments[inside],Vector=Metabolites[A],Reference=Concentration"/>
          </ListOfChannels>
        </PlotItem>
      </ListOfPlotItems>
    </PlotSpecification>
    <PlotSpecification name="histogram" type="Plot2D">
      <ListOfPlotItems>
        <PlotItem name="hist" type="histoItem1d">
          <ListOfChannels>
            <ChannelSpec cn="CN=Root,Model=Two\, Cells,Vector=Values[k],Reference=Value"/>
          </ListOfChannels>
        </PlotItem>
      </ListOfPlotItems>
    </PlotSpecification>
    <PlotSpecification name="surface" type="SpectogramPlot"/>
  </ListOfPlots>
  <SBMLReference file="two_cells.xml">
    <SBMLMap SBMLid="species_1" COPASIkey="Metabolite_1"/>
    <SBMLMap SBMLid="transport" COPASIkey="Reaction_0"/>
  </SBMLReference>
</COPASI>
"#;

    fn parse(input: &str) -> Result<datamodel::Model> {
        model_from_reader(&mut input.as_bytes())
    }

    #[test]
    fn test_escape_cn() {
        assert_eq!("plain", escape_cn("plain"));
        assert_eq!("Two\\, Cells", escape_cn("Two, Cells"));
        assert_eq!("B\\[1\\]", escape_cn("B[1]"));
        assert_eq!("a\\=b\\\\c", escape_cn("a=b\\c"));
        assert_eq!("CN=Root,Model=New Model", model_cn("New Model"));
    }

    #[test]
    fn test_method_sub_type() {
        assert_eq!(
            MethodSubType::Deterministic,
            method_sub_type("Deterministic(LSODA)")
        );
        assert_eq!(MethodSubType::Stochastic, method_sub_type("Stochastic"));
        assert_eq!(MethodSubType::Stochastic, method_sub_type("DirectMethod"));
        assert_eq!(MethodSubType::Stochastic, method_sub_type("TauLeap"));
        assert_eq!(MethodSubType::Hybrid, method_sub_type("Hybrid (LSODA)"));
        assert_eq!(
            MethodSubType::Other("Euler".to_owned()),
            method_sub_type("Euler")
        );
    }

    #[test]
    fn test_common_names() {
        let model = parse(TWO_CELLS).unwrap();
        assert_eq!("Two, Cells", model.name);
        assert_eq!("CN=Root,Model=Two\\, Cells", model.cn);
        assert_eq!(
            "CN=Root,Model=Two\\, Cells,Vector=Compartments[outside],Vector=Metabolites[B\\[1\\]]",
            model.species[2].cn
        );
        assert_eq!(
            "CN=Root,Model=Two\\, Cells,Vector=Values[k]",
            model.parameters[0].cn
        );
        assert_eq!(
            "CN=Root,Model=Two\\, Cells,Vector=Reactions[transport]",
            model.reactions[0].cn
        );
    }

    #[test]
    fn test_sbml_ids_are_unique() {
        let model = parse(TWO_CELLS).unwrap();
        let compartment_ids: Vec<&str> = model
            .compartments
            .iter()
            .map(|c| c.sbml_id.as_str())
            .collect();
        assert_eq!(vec!["compartment_1", "compartment_2"], compartment_ids);

        // species_1 is reserved by the map, so generation skips it
        let species_ids: Vec<&str> = model.species.iter().map(|s| s.sbml_id.as_str()).collect();
        assert_eq!(vec!["species_2", "species_1", "species_3"], species_ids);
        assert_eq!("parameter_1", model.parameters[0].sbml_id);
        assert_eq!("transport", model.reactions[0].sbml_id);
    }

    #[test]
    fn test_duplicate_species_names() {
        let model = parse(TWO_CELLS).unwrap();
        assert_eq!("A{inside}", model.species[0].display_name);
        assert_eq!("A{outside}", model.species[1].display_name);
        assert_eq!("B[1]", model.species[2].display_name);
        assert_eq!("A", model.species[0].name);
    }

    #[test]
    fn test_initial_state_values() {
        let model = parse(TWO_CELLS).unwrap();
        assert_eq!(2.5, model.initial_time);
        assert_eq!(Some(10.0), model.species[0].initial_particle_number);
        assert_eq!(Some(30.0), model.species[2].initial_particle_number);
        assert_eq!(Some(4.0), model.compartments[1].initial_size);
        assert_eq!(Some(0.25), model.parameters[0].initial_value);
        assert_eq!("mmol", model.quantity_unit);
    }

    #[test]
    fn test_reactions() {
        let model = parse(TWO_CELLS).unwrap();
        let reaction = &model.reactions[0];
        assert!(reaction.reversible);
        assert_eq!("Metabolite_0", reaction.substrates[0].species);
        assert_eq!(2.0, reaction.products[0].stoichiometry);
        assert_eq!(vec!["Metabolite_2".to_owned()], reaction.modifiers);
    }

    #[test]
    fn test_tasks() {
        let model = parse(TWO_CELLS).unwrap();
        assert_eq!(2, model.tasks.len());

        let steady = model.task("Steady-State").unwrap();
        assert_eq!(TaskKind::SteadyState, steady.kind);
        assert!(steady.time_course().is_none());

        let task = model.task("Time-Course").unwrap();
        assert_eq!(MethodSubType::Stochastic, task.method.sub_type);
        let problem = task.time_course().unwrap();
        assert_eq!(100, problem.step_number);
        // derived from the duration
        assert_eq!(0.5, problem.step_size);
        assert_eq!(5.0, problem.output_start_time);
    }

    #[test]
    fn test_plots() {
        let model = parse(TWO_CELLS).unwrap();
        assert_eq!(2, model.plots.len());

        let plot = &model.plots[0];
        assert_eq!("both", plot.title);
        assert!(!plot.log_x);
        assert!(plot.log_y);
        assert_eq!(1, plot.items.len());
        assert_eq!("[A]", plot.items[0].name);
        assert_eq!(
            vec![
                "CN=Root,Model=Two\\, Cells,Reference=Time".to_owned(),
                format!("{},Reference=Concentration", model.species[0].cn),
            ],
            plot.items[0].channels
        );
        assert_eq!(1, model.plots[1].items[0].channels.len());
    }

    #[test]
    fn test_parameter_set_values() {
        let input = r#"<COPASI>
  <Model key="Model_1" name="m">
    <ListOfCompartments>
      <Compartment key="Compartment_0" name="c"/>
    </ListOfCompartments>
    <ListOfModelParameterSets activeSet="ModelParameterSet_2">
      <ModelParameterSet key="ModelParameterSet_1" name="Initial State">
        <ModelParameterGroup cn="String=Initial Time" type="Group">
          <ModelParameter cn="CN=Root,Model=m" value="1" type="Model"/>
        </ModelParameterGroup>
      </ModelParameterSet>
      <ModelParameterSet key="ModelParameterSet_2" name="Perturbed">
        <ModelParameterGroup cn="String=Initial Time" type="Group">
          <ModelParameter cn="CN=Root,Model=m" value="3" type="Model"/>
        </ModelParameterGroup>
        <ModelParameterGroup cn="String=Initial Compartment Sizes" type="Group">
          <ModelParameter cn="CN=Root,Model=m,Vector=Compartments[c]" value="0.5" type="Compartment"/>
        </ModelParameterGroup>
      </ModelParameterSet>
    </ListOfModelParameterSets>
    <StateTemplate>
      <StateTemplateVariable objectReference="Model_1"/>
      <StateTemplateVariable objectReference="Compartment_0"/>
    </StateTemplate>
    <InitialState type="initialState">
      7 8
    </InitialState>
  </Model>
</COPASI>
"#;
        let model = parse(input).unwrap();
        assert_eq!(3.0, model.initial_time);
        assert_eq!(Some(0.5), model.compartments[0].initial_size);
        assert_eq!(DEFAULT_QUANTITY_UNIT, model.quantity_unit);
        assert_eq!(AVOGADRO, model.avogadro);
        assert!(model.tasks.is_empty());
        assert!(model.plots.is_empty());
    }

    #[test]
    fn test_missing_model() {
        let err = parse("<COPASI><ListOfTasks/></COPASI>").unwrap_err();
        assert_eq!(ErrorKind::Import, err.kind);
        assert_eq!(ErrorCode::MissingModel, err.code);
    }

    #[test]
    fn test_malformed_input() {
        let err = parse("<COPASI><Model name=\"m\">").unwrap_err();
        assert_eq!(ErrorKind::Import, err.kind);
        assert_eq!(ErrorCode::XmlDeserialization, err.code);
    }

    #[test]
    fn test_unknown_compartment() {
        let input = r#"<COPASI>
  <Model key="Model_1" name="m">
    <ListOfMetabolites>
      <Metabolite key="Metabolite_0" name="A" compartment="Compartment_9"/>
    </ListOfMetabolites>
  </Model>
</COPASI>"#;
        let err = parse(input).unwrap_err();
        assert_eq!(ErrorKind::Import, err.kind);
        assert!(err.get_details().unwrap().contains("Compartment_9"));
    }
}
