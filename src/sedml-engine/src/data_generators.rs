// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use tracing::debug;

use crate::registry::VariableRegistry;
use crate::resolve::EntityKind;
use crate::sedml::{DataGenerator, TIME_SYMBOL, Variable, VariableTarget};

const SBML_MODEL_XPATH: &str = "/sbml:sbml/sbml:model";

/// Where a variable of `kind` lives in the exported network. Species point at
/// their concentration and reactions at their flux, the defaults for those
/// elements. `None` for [`EntityKind::Unknown`].
pub fn symbolic_target(kind: EntityKind, id: &str) -> Option<VariableTarget> {
    let (list, element) = match kind {
        EntityKind::Time => return Some(VariableTarget::Symbol(TIME_SYMBOL.to_owned())),
        EntityKind::Species => ("listOfSpecies", "species"),
        EntityKind::Compartment => ("listOfCompartments", "compartment"),
        EntityKind::Parameter => ("listOfParameters", "parameter"),
        EntityKind::Reaction => ("listOfReactions", "reaction"),
        EntityKind::Unknown => return None,
    };
    Some(VariableTarget::XPath(format!(
        "{SBML_MODEL_XPATH}/sbml:{list}/sbml:{element}[@id='{id}']"
    )))
}

/// One data generator per registry entry referenced by an output, in
/// registration order, each reading a single variable of `task_id`.
pub fn build(registry: &VariableRegistry, task_id: &str, symbol: &str) -> Vec<DataGenerator> {
    registry
        .referenced()
        .filter_map(|entry| {
            let Some(target) = symbolic_target(entry.kind, &entry.id) else {
                debug!(id = %entry.id, "no symbolic path for unresolved entry");
                return None;
            };
            Some(DataGenerator {
                id: entry.id.clone(),
                name: entry.name.clone(),
                variables: vec![Variable {
                    id: symbol.to_owned(),
                    task_reference: task_id.to_owned(),
                    target,
                }],
                math: symbol.to_owned(),
            })
        })
        .collect()
}

#[test]
fn test_symbolic_targets() {
    assert_eq!(
        Some(VariableTarget::Symbol("urn:sedml:symbol:time".to_owned())),
        symbolic_target(EntityKind::Time, "time")
    );
    let xpath = |kind| match symbolic_target(kind, "x1") {
        Some(VariableTarget::XPath(xpath)) => xpath,
        other => panic!("expected xpath, got {other:?}"),
    };
    assert_eq!(
        "/sbml:sbml/sbml:model/sbml:listOfSpecies/sbml:species[@id='x1']",
        xpath(EntityKind::Species)
    );
    assert_eq!(
        "/sbml:sbml/sbml:model/sbml:listOfCompartments/sbml:compartment[@id='x1']",
        xpath(EntityKind::Compartment)
    );
    assert_eq!(
        "/sbml:sbml/sbml:model/sbml:listOfParameters/sbml:parameter[@id='x1']",
        xpath(EntityKind::Parameter)
    );
    assert_eq!(
        "/sbml:sbml/sbml:model/sbml:listOfReactions/sbml:reaction[@id='x1']",
        xpath(EntityKind::Reaction)
    );
    assert_eq!(None, symbolic_target(EntityKind::Unknown, "x1"));
}

#[test]
fn test_build() {
    let mut registry = VariableRegistry::new();
    registry.register("time", "Time", EntityKind::Time);
    registry.register("orphan", "orphan", EntityKind::Species);
    registry.register("R1", "conversion", EntityKind::Reaction);
    registry.mark_referenced("R1");
    registry.mark_referenced("time");

    let dgs = build(&registry, "task1", "v");
    assert_eq!(2, dgs.len());

    assert_eq!("time", dgs[0].id);
    assert_eq!("Time", dgs[0].name);
    assert_eq!("R1", dgs[1].id);
    assert_eq!("conversion", dgs[1].name);
    for dg in dgs.iter() {
        assert_eq!("v", dg.math);
        assert_eq!(1, dg.variables.len());
        assert_eq!("v", dg.variables[0].id);
        assert_eq!("task1", dg.variables[0].task_reference);
    }
}
