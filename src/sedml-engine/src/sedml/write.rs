// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use quick_xml::Writer;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::common::{Error, Result, serialization_err};
use crate::sedml::{SedDocument, to_sedml};
use sedml_core::xml::{
    ToXml, XmlWriter, to_xml_string, write_empty_tag_with_attrs, write_tag_end,
    write_tag_start_with_attrs,
};

const FORMAT_OMEX_MANIFEST: &str = "http://identifiers.org/combine.specifications/omex-manifest";
const FORMAT_OMEX: &str = "http://identifiers.org/combine.specifications/omex";
const FORMAT_SEDML: &str = "http://identifiers.org/combine.specifications/sed-ml";
const FORMAT_SBML: &str = "http://identifiers.org/combine.specifications/sbml";
const MANIFEST_NAME: &str = "manifest.xml";

fn archive_error<T>(err: zip::result::ZipError) -> Result<T> {
    serialization_err!(Archive, err.to_string())
}

/// True if `path`'s extension ends with `archive_extension`, e.g. `sedx`.
pub fn is_archive_path(path: &Path, archive_extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.ends_with(archive_extension))
}

/// Writes `contents` next to `path` and moves it into place once complete.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = temp_sibling(path)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| Error::from(err.error))?;
    Ok(())
}

fn temp_sibling(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    Ok(NamedTempFile::new_in(dir)?)
}

/// Writes the document as a plain SED-ML file.
pub fn write_to(doc: &SedDocument, path: &Path) -> Result<()> {
    let xml = to_sedml(doc)?;
    debug!(path = %path.display(), "writing SED-ML document");
    write_atomically(path, xml.as_bytes())
}

struct Manifest<'a> {
    entries: Vec<(&'a str, &'static str, bool)>,
}

impl ToXml<XmlWriter> for Manifest<'_> {
    fn write_xml(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        write_tag_start_with_attrs(writer, "omexManifest", &[("xmlns", FORMAT_OMEX_MANIFEST)])?;
        write_empty_tag_with_attrs(writer, "content", &[("location", "."), ("format", FORMAT_OMEX)])?;
        for (location, format, master) in self.entries.iter() {
            let location = format!("./{location}");
            let mut attrs = vec![("location", location.as_str()), ("format", *format)];
            if *master {
                attrs.push(("master", "true"));
            }
            write_empty_tag_with_attrs(writer, "content", &attrs)?;
        }
        write_tag_end(writer, "omexManifest")
    }
}

/// Writes a COMBINE archive holding a manifest, the document as
/// `<stem>.sedml`, and each model's inline content under its source name.
pub fn write_to_archive(doc: &SedDocument, path: &Path) -> Result<()> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("experiment");
    let sedml_name = format!("{stem}.sedml");
    let xml = to_sedml(doc)?;

    let models: Vec<(&str, &str)> = doc
        .models
        .iter()
        .filter_map(|model| match model.content {
            Some(ref content) => Some((model.source.as_str(), content.as_str())),
            None => {
                warn!(model = %model.id, "model has no inline content; leaving it out of the archive");
                None
            }
        })
        .collect();

    let mut manifest = Manifest {
        entries: vec![
            (MANIFEST_NAME, FORMAT_OMEX_MANIFEST, false),
            (sedml_name.as_str(), FORMAT_SEDML, true),
        ],
    };
    for &(source, _) in models.iter() {
        manifest.entries.push((source, FORMAT_SBML, false));
    }
    let manifest_xml = to_xml_string(&manifest)?;

    debug!(path = %path.display(), entries = models.len() + 2, "writing archive");
    let file = temp_sibling(path)?;
    let mut zip = ZipWriter::new(file.reopen()?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(MANIFEST_NAME, options).or_else(archive_error)?;
    zip.write_all(manifest_xml.as_bytes())?;
    zip.start_file(sedml_name.as_str(), options).or_else(archive_error)?;
    zip.write_all(xml.as_bytes())?;
    for (source, content) in models {
        zip.start_file(source, options).or_else(archive_error)?;
        zip.write_all(content.as_bytes())?;
    }
    let written: File = zip.finish().or_else(archive_error)?;
    written.sync_all()?;

    file.persist(path).map_err(|err| Error::from(err.error))?;
    Ok(())
}
