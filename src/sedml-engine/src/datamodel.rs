// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The native simulation model as the exporter sees it.
//!
//! A [`ModelBackend`](crate::backend::ModelBackend) produces a [`Model`] from
//! a file on disk. Every entity carries the tool-internal common name (`cn`)
//! that plot channels refer to, plus the identifier it receives in the
//! exported reaction network (`sbml_id`).

/// Accessors shared by every addressable model entity.
pub trait ModelEntity {
    fn cn(&self) -> &str;
    fn sbml_id(&self) -> &str;
    fn display_name(&self) -> &str;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Compartment {
    pub key: String,
    pub cn: String,
    pub sbml_id: String,
    pub name: String,
    pub initial_size: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Species {
    pub key: String,
    pub cn: String,
    pub sbml_id: String,
    pub name: String,
    /// `name`, or `name{compartment}` when the name is not unique.
    pub display_name: String,
    /// key of the owning compartment
    pub compartment: String,
    pub initial_particle_number: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub key: String,
    pub cn: String,
    pub sbml_id: String,
    pub name: String,
    pub initial_value: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpeciesReference {
    /// key of the referenced species
    pub species: String,
    pub stoichiometry: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reaction {
    pub key: String,
    pub cn: String,
    pub sbml_id: String,
    pub name: String,
    pub reversible: bool,
    pub substrates: Vec<SpeciesReference>,
    pub products: Vec<SpeciesReference>,
    pub modifiers: Vec<String>,
}

macro_rules! impl_model_entity(
    ($ty:ty, $display:ident) => {
        impl ModelEntity for $ty {
            fn cn(&self) -> &str {
                &self.cn
            }

            fn sbml_id(&self) -> &str {
                &self.sbml_id
            }

            fn display_name(&self) -> &str {
                &self.$display
            }
        }
    }
);

impl_model_entity!(Compartment, name);
impl_model_entity!(Species, display_name);
impl_model_entity!(Parameter, name);
impl_model_entity!(Reaction, name);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MethodSubType {
    Deterministic,
    Stochastic,
    Hybrid,
    Other(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Method {
    pub name: String,
    pub sub_type: MethodSubType,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskKind {
    TimeCourse,
    SteadyState,
    Other(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimeCourseProblem {
    pub output_start_time: f64,
    pub step_number: u32,
    pub step_size: f64,
}

impl TimeCourseProblem {
    pub fn output_end_time(&self) -> f64 {
        self.output_start_time + f64::from(self.step_number) * self.step_size
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub name: String,
    pub kind: TaskKind,
    pub method: Method,
    /// present for time-course tasks
    pub problem: Option<TimeCourseProblem>,
}

impl Task {
    pub fn time_course(&self) -> Option<&TimeCourseProblem> {
        if self.kind == TaskKind::TimeCourse {
            self.problem.as_ref()
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlotItem {
    pub name: String,
    /// Raw channel references, generally x then y.
    pub channels: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlotSpecification {
    pub title: String,
    pub log_x: bool,
    pub log_y: bool,
    pub items: Vec<PlotItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub name: String,
    pub cn: String,
    pub initial_time: f64,
    /// e.g. `mol`, `mmol`, `#`
    pub quantity_unit: String,
    /// particles per mole
    pub avogadro: f64,
    pub compartments: Vec<Compartment>,
    pub species: Vec<Species>,
    pub parameters: Vec<Parameter>,
    pub reactions: Vec<Reaction>,
    pub tasks: Vec<Task>,
    pub plots: Vec<PlotSpecification>,
}

impl Model {
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }

    pub fn compartment(&self, key: &str) -> Option<&Compartment> {
        self.compartments.iter().find(|c| c.key == key)
    }

    pub fn species_by_key(&self, key: &str) -> Option<&Species> {
        self.species.iter().find(|s| s.key == key)
    }
}

#[test]
fn test_output_end_time() {
    let problem = TimeCourseProblem {
        output_start_time: 2.0,
        step_number: 10,
        step_size: 0.5,
    };
    assert_eq!(7.0, problem.output_end_time());
}

#[test]
fn test_task_lookup() {
    let task = |name: &str, kind: TaskKind| Task {
        name: name.to_owned(),
        kind,
        method: Method {
            name: "Deterministic (LSODA)".to_owned(),
            sub_type: MethodSubType::Deterministic,
        },
        problem: Some(TimeCourseProblem {
            output_start_time: 0.0,
            step_number: 100,
            step_size: 0.01,
        }),
    };
    let model = Model {
        name: "m".to_owned(),
        cn: "CN=Root,Model=m".to_owned(),
        initial_time: 0.0,
        quantity_unit: "mmol".to_owned(),
        avogadro: 6.02214076e23,
        compartments: vec![],
        species: vec![],
        parameters: vec![],
        reactions: vec![],
        tasks: vec![
            task("Steady-State", TaskKind::SteadyState),
            task("Time-Course", TaskKind::TimeCourse),
        ],
        plots: vec![],
    };

    let steady = model.task("Steady-State").unwrap();
    assert!(steady.time_course().is_none());
    let time_course = model.task("Time-Course").unwrap();
    assert_eq!(100, time_course.time_course().unwrap().step_number);
    assert!(model.task("Scan").is_none());
}
