use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::controlled_vocabulary::{CvParamList, CvTerm};
use crate::serializer::SinkError;

/// Indenting XML writer with PSI parameter helpers.
pub struct XmlWriter<W: Write> {
    handle: Writer<W>,
}

impl<W: Write> XmlWriter<W> {
    /// Writer indenting by two spaces.
    pub fn new(inner: W) -> Self {
        Self {
            handle: Writer::new_with_indent(inner, b' ', 2),
        }
    }

    /// `<?xml version="1.0" encoding="utf-8"?>`
    pub fn declaration(&mut self) -> Result<(), SinkError> {
        self.handle
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        Ok(())
    }

    fn element<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
        let mut tag = BytesStart::new(name);
        for &(key, value) in attributes {
            tag.push_attribute((key, value));
        }
        tag
    }

    /// Open an element.
    pub fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), SinkError> {
        let tag = Self::element(name, attributes);
        self.handle.write_event(Event::Start(tag.borrow()))?;
        Ok(())
    }

    /// Write a self-closing element.
    pub fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), SinkError> {
        let tag = Self::element(name, attributes);
        self.handle.write_event(Event::Empty(tag.borrow()))?;
        Ok(())
    }

    /// Close an element.
    pub fn end(&mut self, name: &str) -> Result<(), SinkError> {
        self.handle.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Element holding escaped text only.
    pub fn text_element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) -> Result<(), SinkError> {
        self.start(name, attributes)?;
        self.handle.write_event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    /// `<cvParam>` of a term.
    pub fn cv_param(&mut self, term: &CvTerm) -> Result<(), SinkError> {
        let mut tag = BytesStart::new("cvParam");
        tag.push_attribute(("cvRef", term.cv_ref()));
        tag.push_attribute(("accession", term.accession.as_str()));
        tag.push_attribute(("name", term.name.as_str()));
        tag.push_attribute(("value", term.value.as_deref().unwrap_or("")));
        if let (Some(unit_cv), Some(accession), Some(name)) =
            (term.unit_cv_ref(), term.unit_accession.as_deref(), term.unit_name.as_deref())
        {
            tag.push_attribute(("unitCvRef", unit_cv));
            tag.push_attribute(("unitAccession", accession));
            tag.push_attribute(("unitName", name));
        }
        self.handle.write_event(Event::Empty(tag))?;
        Ok(())
    }

    /// `<cvParam>` of every term in order.
    pub fn cv_params(&mut self, params: &CvParamList) -> Result<(), SinkError> {
        for term in params.iter() {
            self.cv_param(term)?;
        }
        Ok(())
    }

    /// `<userParam>` with a string value.
    pub fn user_param(&mut self, name: &str, value: &str) -> Result<(), SinkError> {
        self.empty("userParam", &[("name", name), ("value", value), ("type", "xsd:string")])
    }

    /// Underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        self.handle.get_mut()
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.handle.into_inner()
    }
}
