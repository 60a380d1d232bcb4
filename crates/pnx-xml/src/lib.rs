//! Load topology export XML into a minimal element tree using quick-xml.
//!
//! The tree keeps element names (namespace prefixes removed), their text and
//! their children in document order. Attributes are not retained: every
//! field of the export schema is carried as element text.

pub mod clean;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

pub use clean::{clean, decode, strip_char_refs, strip_control_chars};

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("xml: {0}")]
    Xml(String),
    #[error("encoding: {0}")]
    Encoding(String),
}

/// One element of the parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Local element name.
    pub name: String,
    /// Concatenated, trimmed text content directly under this element.
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Element::default()
        }
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// All direct children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Text of the first direct child named `name`, or `""` when absent.
    pub fn child_text(&self, name: &str) -> &str {
        self.child(name).map_or("", |child| child.text.as_str())
    }

    /// Every element reached by following `path` from this element, fanning
    /// out over repeated names at each step.
    pub fn select<'a>(&'a self, path: &[&str]) -> Vec<&'a Element> {
        let mut current = vec![self];
        for step in path {
            current = current
                .into_iter()
                .flat_map(|node| node.children.iter().filter(move |c| c.name == *step))
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }
}

/// Total text lookup: text of the first element at `path` below `node`.
///
/// A missing element anywhere along the path yields `""`, never an error.
pub fn lookup<'a>(node: &'a Element, path: &[&str]) -> &'a str {
    let mut current = node;
    for step in path {
        match current.child(step) {
            Some(next) => current = next,
            None => return "",
        }
    }
    current.text.as_str()
}

/// Parse a complete document and return its root element.
pub fn parse(xml: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(element_from_start(&e)),
            Ok(Event::Empty(e)) => attach(&mut stack, &mut root, element_from_start(&e))?,
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::Xml("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|err| {
                    XmlError::Xml(format!("at byte {}: {err}", reader.buffer_position()))
                })?;
                push_text(&mut stack, &text)?;
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                push_text(&mut stack, &text)?;
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(XmlError::Xml(format!(
                    "at byte {}: {err}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Xml(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    let root = root.ok_or_else(|| XmlError::Xml("document has no root element".into()))?;
    debug!(root = %root.name, children = root.children.len(), "parsed document");
    Ok(root)
}

fn element_from_start(event: &BytesStart<'_>) -> Element {
    Element::new(String::from_utf8_lossy(event.local_name().as_ref()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError::Xml(format!(
            "second root element <{}>",
            element.name
        )));
    }
    *root = Some(element);
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(XmlError::Xml("text outside the root element".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
        <Export>
            <DeviceCollection>
                <Device>
                    <NameOfStation>SW1</NameOfStation>
                    <IpAddress>10.0.0.1</IpAddress>
                    <Role/>
                    <Interfaces>
                        <PnInterface><PortList>
                            <Port><PortID>1</PortID></Port>
                            <Port><PortID>2</PortID></Port>
                        </PortList></PnInterface>
                        <PnInterface><PortList>
                            <Port><PortID>3</PortID></Port>
                        </PortList></PnInterface>
                    </Interfaces>
                </Device>
            </DeviceCollection>
        </Export>
    "#;

    #[test]
    fn parse_builds_tree() {
        let root = parse(SAMPLE).expect("parse xml");
        assert_eq!(root.name, "Export");
        let device = root
            .child("DeviceCollection")
            .and_then(|c| c.child("Device"))
            .expect("device");
        assert_eq!(device.child_text("NameOfStation"), "SW1");
        assert_eq!(device.child_text("Role"), "");
        assert_eq!(device.child_text("Missing"), "");
    }

    #[test]
    fn select_fans_out_over_repeated_elements() {
        let root = parse(SAMPLE).expect("parse xml");
        let device = root.select(&["DeviceCollection", "Device"])[0];
        let ports = device.select(&["Interfaces", "PnInterface", "PortList", "Port"]);
        let ids: Vec<&str> = ports.iter().map(|p| p.child_text("PortID")).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert!(device.select(&["Modules", "Module"]).is_empty());
    }

    #[test]
    fn lookup_is_total() {
        let root = parse(SAMPLE).expect("parse xml");
        assert_eq!(
            lookup(&root, &["DeviceCollection", "Device", "IpAddress"]),
            "10.0.0.1"
        );
        assert_eq!(lookup(&root, &["DeviceCollection", "Nope", "IpAddress"]), "");
    }

    #[test]
    fn entities_and_cdata_are_decoded() {
        let root = parse("<A><B>x &amp; y</B><C><![CDATA[<raw>]]></C></A>").expect("parse xml");
        assert_eq!(root.child_text("B"), "x & y");
        assert_eq!(root.child_text("C"), "<raw>");
    }

    #[test]
    fn namespace_prefixes_are_dropped() {
        let root = parse(r#"<ns:A xmlns:ns="urn:x"><ns:B>1</ns:B></ns:A>"#).expect("parse xml");
        assert_eq!(root.name, "A");
        assert_eq!(root.child_text("B"), "1");
    }

    #[test]
    fn malformed_documents_fail() {
        assert!(matches!(parse("<A><B></A>"), Err(XmlError::Xml(_))));
        assert!(matches!(parse("<A>"), Err(XmlError::Xml(_))));
        assert!(matches!(parse(""), Err(XmlError::Xml(_))));
        assert!(matches!(parse("<A/><B/>"), Err(XmlError::Xml(_))));
    }

    #[test]
    fn cleaned_char_refs_parse() {
        let raw = "<A><B>ab&#x0;c&#7;</B></A>";
        let root = parse(&clean(raw)).expect("parse cleaned xml");
        assert_eq!(root.child_text("B"), "abc");
    }
}
