// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! SBML Level 2 Version 4 export of a model's reaction network.
//!
//! Only structure and initial values are written; kinetic laws, rules and
//! events are left out.

use quick_xml::Writer;

use sedml_core::xml::{
    ToXml, XmlWriter, format_f64, to_xml_string, write_empty_tag_with_attrs, write_tag_end,
    write_tag_start, write_tag_start_with_attrs,
};
use sedml_engine::common::{Result, export_err};
use sedml_engine::datamodel::{Model, SpeciesReference};
use sedml_engine::sedml::SBML_L2V4_NAMESPACE;

/// used when a model does not carry its own constant
pub const AVOGADRO: f64 = 6.02214076e23;

const SUBSTANCE_UNIT_ID: &str = "substance";
const DEFAULT_MODEL_ID: &str = "model";

/// An SBML unit as (kind, decimal scale).
fn substance_unit(quantity_unit: &str) -> (&'static str, i32) {
    match quantity_unit {
        "#" => ("item", 0),
        "Mol" | "mol" => ("mole", 0),
        "mmol" => ("mole", -3),
        "µmol" | "umol" => ("mole", -6),
        "nmol" => ("mole", -9),
        "pmol" => ("mole", -12),
        "fmol" => ("mole", -15),
        _ => ("mole", 0),
    }
}

/// Converts a particle number to an amount in the model's quantity unit.
pub fn initial_amount(particles: f64, avogadro: f64, quantity_unit: &str) -> f64 {
    match substance_unit(quantity_unit) {
        ("item", _) => particles,
        (_, scale) => particles / avogadro / 10f64.powi(scale),
    }
}

/// Replaces characters not allowed in an SBML SId with `_`.
pub fn sanitize_id(name: &str) -> String {
    let mut id: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if id.is_empty() {
        return DEFAULT_MODEL_ID.to_owned();
    }
    if id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert(0, '_');
    }
    id
}

fn missing<T>(what: &str, key: &str) -> Result<T> {
    export_err!(Generic, format!("reference to unknown {what} '{key}'"))
}

struct SbmlDocument<'a> {
    model: &'a Model,
}

impl SbmlDocument<'_> {
    fn species_id(&self, key: &str) -> Result<&str> {
        match self.model.species_by_key(key) {
            Some(s) => Ok(s.sbml_id.as_str()),
            None => missing("species", key),
        }
    }

    fn write_unit_definitions(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        let (kind, scale) = substance_unit(&self.model.quantity_unit);
        let scale = scale.to_string();
        write_tag_start(writer, "listOfUnitDefinitions")?;
        write_tag_start_with_attrs(writer, "unitDefinition", &[("id", SUBSTANCE_UNIT_ID)])?;
        write_tag_start(writer, "listOfUnits")?;
        write_empty_tag_with_attrs(writer, "unit", &[("kind", kind), ("scale", scale.as_str())])?;
        write_tag_end(writer, "listOfUnits")?;
        write_tag_end(writer, "unitDefinition")?;
        write_tag_end(writer, "listOfUnitDefinitions")
    }

    fn write_compartments(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        if self.model.compartments.is_empty() {
            return Ok(());
        }
        write_tag_start(writer, "listOfCompartments")?;
        for c in self.model.compartments.iter() {
            let size = c.initial_size.map(format_f64);
            let mut attrs = vec![("id", c.sbml_id.as_str()), ("name", c.name.as_str())];
            if let Some(ref size) = size {
                attrs.push(("size", size.as_str()));
            }
            write_empty_tag_with_attrs(writer, "compartment", &attrs)?;
        }
        write_tag_end(writer, "listOfCompartments")
    }

    fn write_species(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        if self.model.species.is_empty() {
            return Ok(());
        }
        write_tag_start(writer, "listOfSpecies")?;
        for s in self.model.species.iter() {
            let Some(compartment) = self.model.compartment(&s.compartment) else {
                return missing("compartment", &s.compartment);
            };
            let amount = s.initial_particle_number.map(|n| {
                format_f64(initial_amount(
                    n,
                    self.model.avogadro,
                    &self.model.quantity_unit,
                ))
            });
            let mut attrs = vec![
                ("id", s.sbml_id.as_str()),
                ("name", s.name.as_str()),
                ("compartment", compartment.sbml_id.as_str()),
            ];
            if let Some(ref amount) = amount {
                attrs.push(("initialAmount", amount.as_str()));
            }
            write_empty_tag_with_attrs(writer, "species", &attrs)?;
        }
        write_tag_end(writer, "listOfSpecies")
    }

    fn write_parameters(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        if self.model.parameters.is_empty() {
            return Ok(());
        }
        write_tag_start(writer, "listOfParameters")?;
        for p in self.model.parameters.iter() {
            let value = p.initial_value.map(format_f64);
            let mut attrs = vec![("id", p.sbml_id.as_str()), ("name", p.name.as_str())];
            if let Some(ref value) = value {
                attrs.push(("value", value.as_str()));
            }
            write_empty_tag_with_attrs(writer, "parameter", &attrs)?;
        }
        write_tag_end(writer, "listOfParameters")
    }

    fn write_species_references(
        &self,
        writer: &mut Writer<XmlWriter>,
        tag_name: &str,
        refs: &[SpeciesReference],
    ) -> Result<()> {
        if refs.is_empty() {
            return Ok(());
        }
        write_tag_start(writer, tag_name)?;
        for r in refs.iter() {
            let stoichiometry = format_f64(r.stoichiometry);
            let attrs = [
                ("species", self.species_id(&r.species)?),
                ("stoichiometry", stoichiometry.as_str()),
            ];
            write_empty_tag_with_attrs(writer, "speciesReference", &attrs)?;
        }
        write_tag_end(writer, tag_name)
    }

    fn write_reactions(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        if self.model.reactions.is_empty() {
            return Ok(());
        }
        write_tag_start(writer, "listOfReactions")?;
        for r in self.model.reactions.iter() {
            let attrs = [
                ("id", r.sbml_id.as_str()),
                ("name", r.name.as_str()),
                ("reversible", if r.reversible { "true" } else { "false" }),
            ];
            write_tag_start_with_attrs(writer, "reaction", &attrs)?;
            self.write_species_references(writer, "listOfReactants", &r.substrates)?;
            self.write_species_references(writer, "listOfProducts", &r.products)?;
            if !r.modifiers.is_empty() {
                write_tag_start(writer, "listOfModifiers")?;
                for key in r.modifiers.iter() {
                    let attrs = [("species", self.species_id(key)?)];
                    write_empty_tag_with_attrs(writer, "modifierSpeciesReference", &attrs)?;
                }
                write_tag_end(writer, "listOfModifiers")?;
            }
            write_tag_end(writer, "reaction")?;
        }
        write_tag_end(writer, "listOfReactions")
    }
}

impl ToXml<XmlWriter> for SbmlDocument<'_> {
    fn write_xml(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        let attrs = [
            ("xmlns", SBML_L2V4_NAMESPACE),
            ("level", "2"),
            ("version", "4"),
        ];
        write_tag_start_with_attrs(writer, "sbml", &attrs)?;

        let model_id = sanitize_id(&self.model.name);
        let attrs = [
            ("id", model_id.as_str()),
            ("name", self.model.name.as_str()),
        ];
        write_tag_start_with_attrs(writer, "model", &attrs)?;
        self.write_unit_definitions(writer)?;
        self.write_compartments(writer)?;
        self.write_species(writer)?;
        self.write_parameters(writer)?;
        self.write_reactions(writer)?;
        write_tag_end(writer, "model")?;

        write_tag_end(writer, "sbml")
    }
}

pub fn model_to_sbml(model: &Model) -> Result<String> {
    to_xml_string(&SbmlDocument { model })
}
