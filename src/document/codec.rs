//! XML codec for the media server configuration file.
//!
//! # Responsibilities
//! - Parse configuration text into a [`Document`]
//! - Serialize a [`Document`] back to text, compact or indented
//! - Check well-formedness without building a tree
//!
//! # Design Decisions
//! - Comments, processing instructions and the declaration are not kept
//! - Text is trimmed after unescaping and whitespace-only text is dropped, so
//!   no parsed text node starts or ends with whitespace and
//!   `parse(serialize(doc)) == doc` holds for parsed documents
//! - Adjacent text fragments (split by comments or CDATA) are merged

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::document::model::{Attribute, Document, Element, Node};
use crate::document::{DocumentError, DocumentResult};

/// Indent width used by pretty serialization.
pub const INDENT_STEP: usize = 2;

/// Parse configuration text into a document.
pub fn parse(text: &str) -> DocumentResult<Document> {
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| syntax_error(e, reader.buffer_position()))?;

        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(DocumentError::Parse("multiple root elements".to_string()));
                }
                stack.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DocumentError::Parse("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| syntax_error(e, reader.buffer_position()))?;
                push_text(&mut stack, text.trim())?;
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| DocumentError::Parse(format!("invalid UTF-8 in CDATA: {}", e)))?;
                push_text(&mut stack, text.trim())?;
            }
            Event::Eof => break,
            // Declaration, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DocumentError::Parse(format!("unclosed element <{}>", open.name)));
    }

    root.map(Document::new)
        .ok_or_else(|| DocumentError::Parse("document has no root element".to_string()))
}

/// Serialize a document to text.
///
/// Output always starts with an XML declaration. Pretty mode indents each
/// nesting level by [`INDENT_STEP`] spaces.
pub fn serialize(doc: &Document, pretty: bool) -> DocumentResult<String> {
    let mut writer = if pretty {
        Writer::new_with_indent(Vec::new(), b' ', INDENT_STEP)
    } else {
        Writer::new(Vec::new())
    };

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_failed)?;
    write_element(&mut writer, &doc.root)?;

    String::from_utf8(writer.into_inner()).map_err(|e| DocumentError::Serialize(e.to_string()))
}

/// Serialize a single element as a fragment, without an XML declaration.
pub fn serialize_element(element: &Element, pretty: bool) -> DocumentResult<String> {
    let mut writer = if pretty {
        Writer::new_with_indent(Vec::new(), b' ', INDENT_STEP)
    } else {
        Writer::new(Vec::new())
    };
    write_element(&mut writer, element)?;

    String::from_utf8(writer.into_inner()).map_err(|e| DocumentError::Serialize(e.to_string()))
}

/// Check that `text` is well-formed XML with a single root element.
///
/// Streams the input once; no tree is built.
pub fn validate_syntax(text: &str) -> DocumentResult<()> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| syntax_error(e, reader.buffer_position()))?;

        match event {
            Event::Start(start) => {
                check_attributes(&start)?;
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            Event::Empty(start) => {
                check_attributes(&start)?;
                if depth == 0 {
                    roots += 1;
                }
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| DocumentError::Parse("unexpected closing tag".to_string()))?;
            }
            Event::Text(text) => {
                if depth == 0 {
                    return Err(DocumentError::Parse("text outside root element".to_string()));
                }
                text.unescape()
                    .map_err(|e| syntax_error(e, reader.buffer_position()))?;
            }
            Event::CData(_) if depth == 0 => {
                return Err(DocumentError::Parse("text outside root element".to_string()));
            }
            Event::Eof => break,
            _ => {}
        }
        if roots > 1 {
            return Err(DocumentError::Parse("multiple root elements".to_string()));
        }
    }

    if depth > 0 {
        return Err(DocumentError::Parse("unclosed element at end of input".to_string()));
    }
    if roots == 0 {
        return Err(DocumentError::Parse("document has no root element".to_string()));
    }
    Ok(())
}

fn syntax_error(err: impl std::fmt::Display, position: impl std::fmt::Display) -> DocumentError {
    DocumentError::Parse(format!("{} (at byte {})", err, position))
}

fn write_failed(err: impl std::fmt::Display) -> DocumentError {
    DocumentError::Serialize(err.to_string())
}

fn element_from_start(start: &BytesStart<'_>) -> DocumentResult<Element> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| DocumentError::Parse(format!("invalid UTF-8 in element name: {}", e)))?
        .to_string();
    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| DocumentError::Parse(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| DocumentError::Parse(format!("invalid UTF-8 in attribute name: {}", e)))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| DocumentError::Parse(e.to_string()))?
            .into_owned();
        element.attributes.push(Attribute { name: key, value });
    }

    Ok(element)
}

fn check_attributes(start: &BytesStart<'_>) -> DocumentResult<()> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DocumentError::Parse(e.to_string()))?;
        attr.unescape_value()
            .map_err(|e| DocumentError::Parse(e.to_string()))?;
    }
    Ok(())
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> DocumentResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(element));
            Ok(())
        }
        None if root.is_some() => Err(DocumentError::Parse("multiple root elements".to_string())),
        None => {
            *root = Some(element);
            Ok(())
        }
    }
}

fn push_text(stack: &mut [Element], text: &str) -> DocumentResult<()> {
    if text.is_empty() {
        return Ok(());
    }
    let parent = stack
        .last_mut()
        .ok_or_else(|| DocumentError::Parse("text outside root element".to_string()))?;

    match parent.children.last_mut() {
        Some(Node::Text(existing)) => existing.push_str(text),
        _ => parent.children.push(Node::Text(text.to_string())),
    }
    Ok(())
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &Element) -> DocumentResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for attr in &element.attributes {
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_failed);
    }

    writer.write_event(Event::Start(start)).map_err(write_failed)?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) => writer.write_event(Event::Text(BytesText::new(t))).map_err(write_failed)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_failed)
}
