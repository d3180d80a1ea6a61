// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Thin helpers over quick-xml's event writer, shared by the SED-ML and
//! SBML writers.

use std::io::{Cursor, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::common::{Error, ErrorCode, ErrorKind, Result};

pub trait ToXml<W: Write> {
    fn write_xml(&self, writer: &mut Writer<W>) -> Result<()>;
}

pub type XmlWriter = Cursor<Vec<u8>>;

pub fn xml_error(err: std::io::Error) -> Error {
    Error::new(
        ErrorKind::Serialization,
        ErrorCode::XmlSerialization,
        Some(err.to_string()),
    )
}

pub fn new_writer() -> Writer<XmlWriter> {
    Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2)
}

pub fn write_decl(writer: &mut Writer<XmlWriter>) -> Result<()> {
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)
}

/// Serializes `value` as a standalone XML document with a declaration.
pub fn to_xml_string<T: ToXml<XmlWriter>>(value: &T) -> Result<String> {
    let mut writer = new_writer();
    write_decl(&mut writer)?;
    value.write_xml(&mut writer)?;

    let mut result = writer.into_inner().into_inner();
    result.push(b'\n');

    String::from_utf8(result).map_err(|_err| {
        Error::new(
            ErrorKind::Serialization,
            ErrorCode::XmlSerialization,
            Some("problem converting to UTF-8".to_owned()),
        )
    })
}

pub fn write_tag_start(writer: &mut Writer<XmlWriter>, tag_name: &str) -> Result<()> {
    write_tag_start_with_attrs(writer, tag_name, &[])
}

pub fn write_tag_start_with_attrs(
    writer: &mut Writer<XmlWriter>,
    tag_name: &str,
    attrs: &[(&str, &str)],
) -> Result<()> {
    let mut elem = BytesStart::new(tag_name);
    for attr in attrs.iter() {
        elem.push_attribute(*attr);
    }
    writer.write_event(Event::Start(elem)).map_err(xml_error)
}

pub fn write_tag_end(writer: &mut Writer<XmlWriter>, tag_name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(tag_name)))
        .map_err(xml_error)
}

pub fn write_tag_text(writer: &mut Writer<XmlWriter>, content: &str) -> Result<()> {
    writer
        .write_event(Event::Text(BytesText::new(content)))
        .map_err(xml_error)
}

pub fn write_tag(writer: &mut Writer<XmlWriter>, tag_name: &str, content: &str) -> Result<()> {
    write_tag_with_attrs(writer, tag_name, content, &[])
}

pub fn write_tag_with_attrs(
    writer: &mut Writer<XmlWriter>,
    tag_name: &str,
    content: &str,
    attrs: &[(&str, &str)],
) -> Result<()> {
    write_tag_start_with_attrs(writer, tag_name, attrs)?;

    write_tag_text(writer, content)?;

    write_tag_end(writer, tag_name)
}

/// Writes a self-closing `<tag_name attr="..."/>` element.
pub fn write_empty_tag_with_attrs(
    writer: &mut Writer<XmlWriter>,
    tag_name: &str,
    attrs: &[(&str, &str)],
) -> Result<()> {
    let mut elem = BytesStart::new(tag_name);
    for attr in attrs.iter() {
        elem.push_attribute(*attr);
    }
    writer.write_event(Event::Empty(elem)).map_err(xml_error)
}

/// Formats a floating point attribute value; integral values print without
/// a trailing `.0`.
pub fn format_f64(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
struct Greeting {
    lang: String,
    text: String,
}

#[cfg(test)]
impl ToXml<XmlWriter> for Greeting {
    fn write_xml(&self, writer: &mut Writer<XmlWriter>) -> Result<()> {
        write_tag_start_with_attrs(writer, "greeting", &[("lang", &self.lang)])?;
        write_tag(writer, "text", &self.text)?;
        write_empty_tag_with_attrs(writer, "sep", &[("kind", "line")])?;
        write_tag_end(writer, "greeting")
    }
}

#[test]
fn test_to_xml_string() {
    let greeting = Greeting {
        lang: "en".to_owned(),
        text: "a < b & c".to_owned(),
    };
    let xml = to_xml_string(&greeting).unwrap();

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<greeting lang=\"en\">"));
    assert!(xml.contains("<text>a &lt; b &amp; c</text>"));
    assert!(xml.contains("<sep kind=\"line\"/>"));
    assert!(xml.trim_end().ends_with("</greeting>"));
}

#[test]
fn test_format_f64() {
    assert_eq!("10", format_f64(10.0));
    assert_eq!("0", format_f64(0.0));
    assert_eq!("-3", format_f64(-3.0));
    assert_eq!("0.25", format_f64(0.25));
    assert_eq!("0.0000001", format_f64(1e-7));
    assert_eq!("NaN", format_f64(f64::NAN));
}
