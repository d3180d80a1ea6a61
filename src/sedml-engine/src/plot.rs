// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use tracing::debug;

use crate::datamodel::PlotSpecification;
use crate::registry::VariableRegistry;
use crate::resolve::EntityTable;
use crate::sedml::{Curve, Plot2D};

pub type PlotOutput = Plot2D;

/// Translates one native plot definition.
///
/// Channels of an item are resolved in order; each resolved channel is
/// registered as soon as it resolves, and the first unresolved channel
/// discards the whole item. Only items with exactly two resolved channels
/// become curves. The result may have no curves; ids are left unassigned.
pub fn translate(
    spec: &PlotSpecification,
    table: &EntityTable,
    registry: &mut VariableRegistry,
) -> PlotOutput {
    let mut plot = Plot2D {
        id: None,
        name: spec.title.clone(),
        log_x: spec.log_x,
        log_y: spec.log_y,
        curves: vec![],
    };

    for (i, item) in spec.items.iter().enumerate() {
        let mut refs: Vec<String> = Vec::with_capacity(item.channels.len());
        let mut complete = true;
        for channel in item.channels.iter() {
            let entity = table.resolve(channel);
            let id = match entity.id() {
                Some(id) if entity.is_resolved() => id,
                _ => {
                    debug!(plot = %spec.title, item = i, %channel, "dropping curve with unresolved channel");
                    complete = false;
                    break;
                }
            };
            registry.register(id, entity.name(), entity.kind());
            refs.push(id.to_owned());
        }

        if !complete {
            continue;
        }
        let [x, y] = refs.as_slice() else {
            debug!(plot = %spec.title, item = i, channels = refs.len(), "dropping item without exactly two channels");
            continue;
        };
        registry.mark_referenced(x);
        registry.mark_referenced(y);
        plot.curves.push(Curve {
            id: None,
            x_data_reference: x.clone(),
            y_data_reference: y.clone(),
        });
    }

    plot
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::datamodel::PlotItem;
    use crate::resolve::EntityKind;
    use crate::resolve::tests::{MODEL_CN, parameter_cn, species_cn, test_model};

    fn time() -> String {
        format!("{MODEL_CN},Reference=Time")
    }

    fn conc(name: &str) -> String {
        format!("{},Reference=Concentration", species_cn("cell", name))
    }

    fn rate(name: &str) -> String {
        format!("{},Reference=Rate", species_cn("cell", name))
    }

    fn spec(items: Vec<Vec<String>>) -> PlotSpecification {
        PlotSpecification {
            title: "Concentrations".to_owned(),
            log_x: false,
            log_y: true,
            items: items
                .into_iter()
                .enumerate()
                .map(|(i, channels)| PlotItem {
                    name: format!("item{i}"),
                    channels,
                })
                .collect(),
        }
    }

    #[test]
    fn test_translate_resolved_curve() {
        let model = test_model();
        let table = EntityTable::new(&model);
        let mut registry = VariableRegistry::new();

        let plot = translate(&spec(vec![vec![conc("A"), conc("B")]]), &table, &mut registry);
        assert_eq!("Concentrations", plot.name);
        assert!(!plot.log_x);
        assert!(plot.log_y);
        assert_eq!(
            vec![Curve {
                id: None,
                x_data_reference: "species_1".to_owned(),
                y_data_reference: "species_2".to_owned(),
            }],
            plot.curves
        );
        assert_eq!(2, registry.referenced().count());
    }

    #[test]
    fn test_partially_resolved_item_is_dropped() {
        let model = test_model();
        let table = EntityTable::new(&model);
        let mut registry = VariableRegistry::new();

        let plot = translate(&spec(vec![vec![conc("A"), rate("B")]]), &table, &mut registry);
        assert!(plot.curves.is_empty());
        // A was registered before B failed, but nothing references it
        assert!(registry.contains("species_1"));
        assert!(!registry.contains("species_2"));
        assert_eq!(0, registry.referenced().count());
    }

    #[test]
    fn test_first_failure_stops_item() {
        let model = test_model();
        let table = EntityTable::new(&model);
        let mut registry = VariableRegistry::new();

        translate(&spec(vec![vec![rate("A"), conc("B")]]), &table, &mut registry);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_items_need_exactly_two_channels() {
        let model = test_model();
        let table = EntityTable::new(&model);
        let mut registry = VariableRegistry::new();

        let plot = translate(
            &spec(vec![
                vec![time()],
                vec![time(), conc("A"), conc("B")],
                vec![time(), conc("A")],
            ]),
            &table,
            &mut registry,
        );
        assert_eq!(1, plot.curves.len());
        assert_eq!("time", plot.curves[0].x_data_reference);
        // B was only seen in the three channel item
        assert!(registry.contains("species_2"));
        let referenced: Vec<&str> = registry.referenced().map(|e| e.id.as_str()).collect();
        assert_eq!(vec!["time", "species_1"], referenced);
    }

    #[test]
    fn test_shared_variables_register_once() {
        let model = test_model();
        let table = EntityTable::new(&model);
        let mut registry = VariableRegistry::new();

        let param = format!("{},Reference=Value", parameter_cn("k1"));
        let plot = translate(
            &spec(vec![
                vec![time(), conc("A")],
                vec![time(), conc("B")],
                vec![time(), param],
            ]),
            &table,
            &mut registry,
        );
        assert_eq!(3, plot.curves.len());
        assert_eq!(4, registry.len());
        assert_eq!(EntityKind::Time, registry.get("time").unwrap().kind);
        assert_eq!(EntityKind::Parameter, registry.get("k1").unwrap().kind);
    }

    fn channel_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(time()),
            Just(conc("A")),
            Just(conc("B")),
            Just(conc("missing")),
            Just(rate("A")),
            Just(format!("{},Reference=ParticleNumber", species_cn("cell", "B"))),
            "[A-Za-z,=]{0,20}",
        ]
    }

    proptest! {
        #[test]
        fn surviving_curves_are_bounded_and_resolved(
            items in prop::collection::vec(prop::collection::vec(channel_strategy(), 0..4), 0..8),
        ) {
            let model = test_model();
            let table = EntityTable::new(&model);
            let mut registry = VariableRegistry::new();
            let count = items.len();

            let plot = translate(&spec(items), &table, &mut registry);
            prop_assert!(plot.curves.len() <= count);
            for curve in plot.curves.iter() {
                prop_assert!(!curve.x_data_reference.is_empty());
                prop_assert!(!curve.y_data_reference.is_empty());
                prop_assert!(registry.get(&curve.x_data_reference).unwrap().referenced);
                prop_assert!(registry.get(&curve.y_data_reference).unwrap().referenced);
            }
        }
    }
}
