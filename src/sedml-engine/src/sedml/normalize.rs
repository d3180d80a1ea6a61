// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Final repair pass over an assembled document.
//!
//! Running it twice is the same as running it once.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::sedml::SedDocument;

/// Repairs dangling references and missing or colliding ids.
pub fn normalize(doc: &mut SedDocument) {
    drop_dangling_tasks(doc);
    drop_dangling_data_generators(doc);
    rename_colliding_data_generators(doc);
    drop_dangling_curves(doc);
    assign_output_ids(doc);
}

fn drop_dangling_tasks(doc: &mut SedDocument) {
    let models: HashSet<&str> = doc.models.iter().map(|m| m.id.as_str()).collect();
    let sims: HashSet<&str> = doc.simulations.iter().map(|s| s.id.as_str()).collect();
    doc.tasks.retain(|task| {
        let keep = models.contains(task.model_reference.as_str())
            && sims.contains(task.simulation_reference.as_str());
        if !keep {
            debug!(task = %task.id, "dropping task with dangling reference");
        }
        keep
    });
}

fn drop_dangling_data_generators(doc: &mut SedDocument) {
    let tasks: HashSet<&str> = doc.tasks.iter().map(|t| t.id.as_str()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    doc.data_generators.retain(|dg| {
        let keep = !dg.variables.is_empty()
            && dg
                .variables
                .iter()
                .all(|var| tasks.contains(var.task_reference.as_str()))
            && seen.insert(dg.id.clone());
        if !keep {
            debug!(data_generator = %dg.id, "dropping data generator");
        }
        keep
    });
}

/// Data generator ids share a namespace with models, simulations and tasks;
/// a data generator named e.g. `task1` is renamed and curves follow it.
fn rename_colliding_data_generators(doc: &mut SedDocument) {
    let mut taken: HashSet<String> = doc
        .models
        .iter()
        .map(|m| m.id.clone())
        .chain(doc.simulations.iter().map(|s| s.id.clone()))
        .chain(doc.tasks.iter().map(|t| t.id.clone()))
        .collect();
    let reserved = taken.clone();
    for dg in doc.data_generators.iter() {
        taken.insert(dg.id.clone());
    }

    let mut renames: HashMap<String, String> = HashMap::new();
    for dg in doc.data_generators.iter_mut() {
        if !reserved.contains(&dg.id) {
            continue;
        }
        let new_id = unique_id(&dg.id, &taken);
        debug!(from = %dg.id, to = %new_id, "renaming data generator");
        taken.insert(new_id.clone());
        renames.insert(dg.id.clone(), new_id.clone());
        dg.id = new_id;
    }

    if renames.is_empty() {
        return;
    }
    for curve in doc.outputs.iter_mut().flat_map(|o| o.curves.iter_mut()) {
        if let Some(new_id) = renames.get(&curve.x_data_reference) {
            curve.x_data_reference = new_id.clone();
        }
        if let Some(new_id) = renames.get(&curve.y_data_reference) {
            curve.y_data_reference = new_id.clone();
        }
    }
}

fn drop_dangling_curves(doc: &mut SedDocument) {
    let dgs: HashSet<String> = doc.data_generators.iter().map(|dg| dg.id.clone()).collect();
    for output in doc.outputs.iter_mut() {
        output.curves.retain(|curve| {
            let keep = dgs.contains(&curve.x_data_reference) && dgs.contains(&curve.y_data_reference);
            if !keep {
                debug!(plot = %output.name, "dropping curve with dangling data reference");
            }
            keep
        });
    }
    doc.outputs.retain(|output| !output.curves.is_empty());
}

fn assign_output_ids(doc: &mut SedDocument) {
    let mut taken: HashSet<String> = doc
        .models
        .iter()
        .map(|m| m.id.clone())
        .chain(doc.simulations.iter().map(|s| s.id.clone()))
        .chain(doc.tasks.iter().map(|t| t.id.clone()))
        .chain(doc.data_generators.iter().map(|dg| dg.id.clone()))
        .collect();

    let mut plot_counter = 0;
    for output in doc.outputs.iter_mut() {
        plot_counter += 1;
        let needs_id = match output.id {
            Some(ref id) => !taken.insert(id.clone()),
            None => true,
        };
        if needs_id {
            let id = unique_id(&format!("plot{plot_counter}"), &taken);
            taken.insert(id.clone());
            output.id = Some(id);
        }
        let plot_id = output.id.clone().unwrap_or_default();

        let mut curve_counter = 0;
        for curve in output.curves.iter_mut() {
            curve_counter += 1;
            let needs_id = match curve.id {
                Some(ref id) => !taken.insert(id.clone()),
                None => true,
            };
            if needs_id {
                let id = unique_id(&format!("{plot_id}_curve{curve_counter}"), &taken);
                taken.insert(id.clone());
                curve.id = Some(id);
            }
        }
    }
}

/// `base` if free, otherwise the first free `base_N`.
fn unique_id(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_owned();
    }
    (1..)
        .map(|n| format!("{base}_{n}"))
        .find(|id| !taken.contains(id))
        .unwrap_or_else(|| base.to_owned())
}
