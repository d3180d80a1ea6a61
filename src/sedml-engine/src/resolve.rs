// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Resolution of plot channels to exported model entities.
//!
//! A channel is a common name of the form `<object path>,<attribute>`, for
//! example `CN=Root,Model=m,Vector=Compartments[cell],Vector=Metabolites[A],Reference=Concentration`.
//! The object path is matched exactly against the common names of the model
//! itself (the time axis) and of its species, compartments, global
//! parameters and reactions.

use std::collections::HashMap;
use std::fmt;

use crate::datamodel::{Model, ModelEntity};

pub const TIME_ID: &str = "time";
pub const TIME_NAME: &str = "Time";
const UNKNOWN_NAME: &str = "unknown";

/// Attribute suffixes naming derived quantities without a stable identity in
/// the exported network.
const DERIVED_SUFFIXES: &[&str] = &["Rate", "ParticleNumber"];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Time,
    Species,
    Compartment,
    Parameter,
    Reaction,
    Unknown,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use EntityKind::*;
        let name = match self {
            Time => "time",
            Species => "species",
            Compartment => "compartment",
            Parameter => "parameter",
            Reaction => "reaction",
            Unknown => "unknown",
        };

        write!(f, "{name}")
    }
}

/// The outcome of resolving a channel. `id` is present exactly when `kind`
/// is not [`EntityKind::Unknown`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRef {
    kind: EntityKind,
    id: Option<String>,
    name: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: &str, name: &str) -> Self {
        if kind == EntityKind::Unknown {
            return EntityRef::unknown();
        }
        EntityRef {
            kind,
            id: Some(id.to_owned()),
            name: name.to_owned(),
        }
    }

    pub fn unknown() -> Self {
        EntityRef {
            kind: EntityKind::Unknown,
            id: None,
            name: UNKNOWN_NAME.to_owned(),
        }
    }

    pub fn time() -> Self {
        EntityRef::new(EntityKind::Time, TIME_ID, TIME_NAME)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the reference names an entity with a usable identifier.
    pub fn is_resolved(&self) -> bool {
        self.kind != EntityKind::Unknown && self.id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }
}

/// A channel split at its last comma.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelPath<'a> {
    pub object_path: &'a str,
    pub attribute: &'a str,
}

impl<'a> ChannelPath<'a> {
    pub fn parse(channel: &'a str) -> Option<Self> {
        let (object_path, attribute) = channel.rsplit_once(',')?;
        Some(ChannelPath {
            object_path,
            attribute,
        })
    }

    /// Rates and particle counts are excluded from the translation.
    pub fn is_derived_quantity(&self) -> bool {
        DERIVED_SUFFIXES
            .iter()
            .any(|suffix| self.attribute.ends_with(suffix))
    }
}

/// Lookup table from object path to entity, built in one pass over the model.
///
/// Common names are assumed unique across entity categories. Should two ever
/// collide, the first inserted wins, in the order time, species,
/// compartments, parameters, reactions.
#[derive(Clone, Debug, Default)]
pub struct EntityTable {
    entries: HashMap<String, EntityRef>,
}

impl EntityTable {
    pub fn new(model: &Model) -> Self {
        let mut table = EntityTable::default();
        table
            .entries
            .insert(model.cn.clone(), EntityRef::time());
        table.insert_all(EntityKind::Species, &model.species);
        table.insert_all(EntityKind::Compartment, &model.compartments);
        table.insert_all(EntityKind::Parameter, &model.parameters);
        table.insert_all(EntityKind::Reaction, &model.reactions);
        table
    }

    fn insert_all<E: ModelEntity>(&mut self, kind: EntityKind, entities: &[E]) {
        for entity in entities {
            self.entries
                .entry(entity.cn().to_owned())
                .or_insert_with(|| EntityRef::new(kind, entity.sbml_id(), entity.display_name()));
        }
    }

    pub fn resolve(&self, channel: &str) -> EntityRef {
        let Some(path) = ChannelPath::parse(channel) else {
            return EntityRef::unknown();
        };
        if path.is_derived_quantity() {
            return EntityRef::unknown();
        }
        self.entries
            .get(path.object_path)
            .cloned()
            .unwrap_or_else(EntityRef::unknown)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves a single channel against `model`. Callers resolving many
/// channels should build an [`EntityTable`] once instead.
pub fn resolve(channel: &str, model: &Model) -> EntityRef {
    EntityTable::new(model).resolve(channel)
}

#[cfg(test)]
pub(crate) mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::datamodel::{Compartment, Parameter, Reaction, Species};

    pub(crate) const MODEL_CN: &str = "CN=Root,Model=Kinetics";

    pub(crate) fn compartment_cn(name: &str) -> String {
        format!("{MODEL_CN},Vector=Compartments[{name}]")
    }

    pub(crate) fn species_cn(compartment: &str, name: &str) -> String {
        format!("{},Vector=Metabolites[{name}]", compartment_cn(compartment))
    }

    pub(crate) fn parameter_cn(name: &str) -> String {
        format!("{MODEL_CN},Vector=Values[{name}]")
    }

    pub(crate) fn reaction_cn(name: &str) -> String {
        format!("{MODEL_CN},Vector=Reactions[{name}]")
    }

    pub(crate) fn species(name: &str, id: &str) -> Species {
        Species {
            key: format!("Metabolite_{name}"),
            cn: species_cn("cell", name),
            sbml_id: id.to_owned(),
            name: name.to_owned(),
            display_name: name.to_owned(),
            compartment: "Compartment_0".to_owned(),
            initial_particle_number: None,
        }
    }

    /// compartment `cell`, species A and B, parameter k1, reaction R1
    pub(crate) fn test_model() -> Model {
        Model {
            name: "Kinetics".to_owned(),
            cn: MODEL_CN.to_owned(),
            initial_time: 0.0,
            quantity_unit: "mmol".to_owned(),
            avogadro: 6.02214076e23,
            compartments: vec![Compartment {
                key: "Compartment_0".to_owned(),
                cn: compartment_cn("cell"),
                sbml_id: "cell".to_owned(),
                name: "cell".to_owned(),
                initial_size: Some(1.0),
            }],
            species: vec![species("A", "species_1"), species("B", "species_2")],
            parameters: vec![Parameter {
                key: "ModelValue_0".to_owned(),
                cn: parameter_cn("k1"),
                sbml_id: "k1".to_owned(),
                name: "k1".to_owned(),
                initial_value: Some(0.1),
            }],
            reactions: vec![Reaction {
                key: "Reaction_0".to_owned(),
                cn: reaction_cn("R1"),
                sbml_id: "R1".to_owned(),
                name: "conversion".to_owned(),
                reversible: false,
                substrates: vec![],
                products: vec![],
                modifiers: vec![],
            }],
            tasks: vec![],
            plots: vec![],
        }
    }

    #[test]
    fn test_channel_path_parse() {
        let path = ChannelPath::parse("CN=Root,Model=m,Reference=Time").unwrap();
        assert_eq!("CN=Root,Model=m", path.object_path);
        assert_eq!("Reference=Time", path.attribute);
        assert!(!path.is_derived_quantity());

        assert!(ChannelPath::parse("no separator").is_none());

        for attribute in [
            "Reference=Rate",
            "Reference=ParticleNumber",
            "Reference=ParticleNumberRate",
            "Reference=InitialParticleNumber",
        ] {
            let channel = format!("{MODEL_CN},{attribute}");
            assert!(ChannelPath::parse(&channel).unwrap().is_derived_quantity());
        }
    }

    #[test]
    fn test_resolve_each_kind() {
        let model = test_model();
        let table = EntityTable::new(&model);
        assert_eq!(6, table.len());

        let time = table.resolve(&format!("{MODEL_CN},Reference=Time"));
        assert_eq!(EntityKind::Time, time.kind());
        assert_eq!(Some("time"), time.id());
        assert_eq!("Time", time.name());

        let a = table.resolve(&format!("{},Reference=Concentration", species_cn("cell", "A")));
        assert_eq!(EntityKind::Species, a.kind());
        assert_eq!(Some("species_1"), a.id());
        assert_eq!("A", a.name());

        let cell = table.resolve(&format!("{},Reference=Volume", compartment_cn("cell")));
        assert_eq!(EntityKind::Compartment, cell.kind());
        assert_eq!(Some("cell"), cell.id());

        let k1 = table.resolve(&format!("{},Reference=Value", parameter_cn("k1")));
        assert_eq!(EntityKind::Parameter, k1.kind());
        assert_eq!(Some("k1"), k1.id());

        let r1 = table.resolve(&format!("{},Reference=Flux", reaction_cn("R1")));
        assert_eq!(EntityKind::Reaction, r1.kind());
        assert_eq!(Some("R1"), r1.id());
        assert_eq!("conversion", r1.name());
    }

    #[test]
    fn test_resolve_unknown() {
        let model = test_model();
        let table = EntityTable::new(&model);

        let missing = table.resolve(&format!("{},Reference=Concentration", species_cn("cell", "Z")));
        assert_eq!(EntityKind::Unknown, missing.kind());
        assert_eq!(None, missing.id());
        assert!(!missing.is_resolved());

        // exact matching only
        let lower = table.resolve("cn=root,model=kinetics,Reference=Time");
        assert_eq!(EntityKind::Unknown, lower.kind());

        let rate = table.resolve(&format!("{},Reference=Rate", species_cn("cell", "A")));
        assert_eq!(EntityKind::Unknown, rate.kind());

        assert_eq!(EntityKind::Unknown, table.resolve("").kind());
    }

    #[test]
    fn test_first_category_wins_on_collision() {
        let mut model = test_model();
        // a parameter sharing species A's common name
        model.parameters.push(Parameter {
            key: "ModelValue_1".to_owned(),
            cn: species_cn("cell", "A"),
            sbml_id: "shadow".to_owned(),
            name: "shadow".to_owned(),
            initial_value: None,
        });
        let r = resolve(&format!("{},Reference=Concentration", species_cn("cell", "A")), &model);
        assert_eq!(EntityKind::Species, r.kind());
        assert_eq!(Some("species_1"), r.id());
    }

    #[test]
    fn test_empty_sbml_id_is_not_resolved() {
        let mut model = test_model();
        model.species[0].sbml_id = String::new();
        let r = resolve(&format!("{},Reference=Concentration", species_cn("cell", "A")), &model);
        assert_eq!(EntityKind::Species, r.kind());
        assert!(!r.is_resolved());
    }

    #[test]
    fn test_unknown_kind_never_carries_id() {
        let r = EntityRef::new(EntityKind::Unknown, "x", "x");
        assert_eq!(None, r.id());
    }

    fn entity_path_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(MODEL_CN.to_owned()),
            Just(species_cn("cell", "A")),
            Just(species_cn("cell", "B")),
            Just(compartment_cn("cell")),
            Just(parameter_cn("k1")),
            Just(reaction_cn("R1")),
            "[A-Za-z=,\\[\\]]{0,24}",
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn derived_quantities_never_resolve(
            path in entity_path_strategy(),
            prefix in "[A-Za-z]{0,12}",
            suffix in prop_oneof![Just("Rate"), Just("ParticleNumber")],
        ) {
            let model = test_model();
            let channel = format!("{path},{prefix}{suffix}");
            let r = resolve(&channel, &model);
            prop_assert_eq!(EntityKind::Unknown, r.kind());
            prop_assert_eq!(None, r.id());
        }

        #[test]
        fn model_path_is_always_time(name in "[A-Za-z0-9 _]{1,16}", attribute in "Reference=[A-Za-z]{1,10}Time") {
            let mut model = test_model();
            model.cn = format!("CN=Root,Model={name}");
            let r = resolve(&format!("{},{attribute}", model.cn), &model);
            prop_assert_eq!(EntityKind::Time, r.kind());
            prop_assert_eq!(Some("time"), r.id());
        }

        #[test]
        fn resolved_iff_known_kind(path in entity_path_strategy(), attribute in "Reference=[A-Za-z]{1,14}") {
            let model = test_model();
            let r = resolve(&format!("{path},{attribute}"), &model);
            prop_assert_eq!(r.kind() != EntityKind::Unknown, r.id().is_some());
        }
    }
}
