//! Generic XML decoding for Platform responses
//!
//! Responses are decoded into a loose tree of [`XmlValue`]s:
//! - an element with attributes or child elements becomes a map; attributes
//!   and children share the map, and any non-blank text goes under `content`
//! - a text-only element becomes its text (blank text becomes `""`)
//! - a child name that repeats becomes a list, and names listed in
//!   `force_array` are always lists so single results read like many
//!
//! The returned map keeps the root element as its only key.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;

use crate::error::{Error, Result};

/// Key that holds an element's text when it also has attributes or children.
pub const CONTENT_KEY: &str = "content";

pub type XmlMap = BTreeMap<String, XmlValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum XmlValue {
    Text(String),
    Map(XmlMap),
    List(Vec<XmlValue>),
}

impl XmlValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            XmlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&XmlMap> {
        match self {
            XmlValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// View a value as a slice of values: a list as itself, anything else
    /// as a single element.
    pub fn as_slice(&self) -> &[XmlValue] {
        match self {
            XmlValue::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// Look up a child of a map value.
    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        self.as_map()?.get(key)
    }

    /// Text of this value, or of the first element if it is a list, or of
    /// the `content` key if it is a map.
    pub fn text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(s) => Some(s),
            XmlValue::List(items) => items.first()?.text(),
            XmlValue::Map(m) => m.get(CONTENT_KEY)?.as_str(),
        }
    }

    /// Map form of an element, wrapping bare text as `{content: text}`.
    /// An empty element gives an empty map.
    pub fn to_map(&self) -> XmlMap {
        match self {
            XmlValue::Map(m) => m.clone(),
            XmlValue::Text(s) if s.is_empty() => XmlMap::new(),
            XmlValue::Text(s) => {
                let mut m = XmlMap::new();
                m.insert(CONTENT_KEY.to_string(), XmlValue::Text(s.clone()));
                m
            }
            XmlValue::List(items) => items.first().map(XmlValue::to_map).unwrap_or_default(),
        }
    }

    /// `true` for empty text or an empty map.
    pub fn is_empty(&self) -> bool {
        match self {
            XmlValue::Text(s) => s.is_empty(),
            XmlValue::Map(m) => m.is_empty(),
            XmlValue::List(items) => items.is_empty(),
        }
    }
}

/// An element still being read
struct Frame {
    name: String,
    children: XmlMap,
    text: String,
}

impl Frame {
    fn new(e: &BytesStart) -> Result<Self> {
        let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let mut children = XmlMap::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| Error::Xml(format!("bad attribute in <{}>: {}", name, err)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let raw = String::from_utf8_lossy(attr.value.as_ref());
            children.insert(key, XmlValue::Text(decode_xml_entities(&raw)));
        }
        Ok(Self {
            name,
            children,
            text: String::new(),
        })
    }

    fn finish(mut self) -> (String, XmlValue) {
        let has_text = !self.text.trim().is_empty();
        let value = if self.children.is_empty() {
            if has_text {
                XmlValue::Text(self.text)
            } else {
                XmlValue::Text(String::new())
            }
        } else {
            if has_text {
                self.children
                    .insert(CONTENT_KEY.to_string(), XmlValue::Text(self.text));
            }
            XmlValue::Map(self.children)
        };
        (self.name, value)
    }
}

fn insert_child(map: &mut XmlMap, name: String, value: XmlValue, force_array: &[&str]) {
    match map.remove(&name) {
        Some(XmlValue::List(mut items)) => {
            items.push(value);
            map.insert(name, XmlValue::List(items));
        }
        Some(existing) => {
            map.insert(name, XmlValue::List(vec![existing, value]));
        }
        None => {
            let value = if force_array.contains(&name.as_str()) {
                XmlValue::List(vec![value])
            } else {
                value
            };
            map.insert(name, value);
        }
    }
}

/// Decode `xml` into a map holding the root element.
pub fn parse(xml: &str, force_array: &[&str]) -> Result<XmlMap> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root = XmlMap::new();

    loop {
        let position = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(Frame::new(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let (name, value) = Frame::new(e)?.finish();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.children, name, value, force_array),
                    None => insert_child(&mut root, name, value, force_array),
                }
            }
            Ok(Event::End(_)) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| Error::Xml(format!("unexpected closing tag at byte {}", position)))?;
                let (name, value) = frame.finish();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.children, name, value, force_array),
                    None => insert_child(&mut root, name, value, force_array),
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(frame) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(&e);
                    frame.text.push_str(&decode_xml_entities(&raw));
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(frame) = stack.last_mut() {
                    let entity = format!("&{};", String::from_utf8_lossy(&e));
                    frame.text.push_str(&decode_xml_entities(&entity));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("XML error at byte {}: {}", position, e)));
            }
            // Declarations, comments, processing instructions
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::Xml(format!("unclosed element <{}>", open.name)));
    }
    if root.is_empty() {
        return Err(Error::Xml("document has no root element".to_string()));
    }
    Ok(root)
}

/// Decode the predefined XML entities and numeric character references in
/// one pass. Unknown or malformed references are kept as written.
pub fn decode_xml_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 12)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                result.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                result.push('&');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_nested_elements() {
        let doc = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<shows>
  <page>1</page>
  <show>
    <id>89675</id>
    <name>My show</name>
    <description></description>
  </show>
</shows>"#,
            &[],
        )
        .unwrap();

        let shows = doc.get("shows").unwrap();
        assert_eq!(shows.get("page").and_then(XmlValue::as_str), Some("1"));
        let show = shows.get("show").unwrap();
        assert_eq!(show.get("name").and_then(XmlValue::as_str), Some("My show"));
        assert_eq!(show.get("description").and_then(XmlValue::as_str), Some(""));
    }

    #[test]
    fn test_force_array_and_repeats() {
        let xml = "<r><one><id>1</id></one><two>a</two><two>b</two></r>";

        let plain = parse(xml, &[]).unwrap();
        let r = plain.get("r").unwrap();
        assert!(matches!(r.get("one"), Some(XmlValue::Map(_))));
        assert_eq!(
            r.get("two"),
            Some(&XmlValue::List(vec![XmlValue::Text("a".into()), XmlValue::Text("b".into())]))
        );

        let forced = parse(xml, &["one"]).unwrap();
        let one = forced.get("r").unwrap().get("one").unwrap();
        assert_eq!(one.as_slice().len(), 1);
        assert!(matches!(one, XmlValue::List(_)));
    }

    #[test]
    fn test_attributes_and_content() {
        let doc = parse(
            r#"<field><value id="123"> Drama </value><param name="key">abc</param><empty/></field>"#,
            &[],
        )
        .unwrap();
        let field = doc.get("field").unwrap();
        let value = field.get("value").unwrap();
        assert_eq!(value.get("id").and_then(XmlValue::as_str), Some("123"));
        assert_eq!(value.get("content").and_then(XmlValue::as_str), Some(" Drama "));
        assert_eq!(value.text(), Some(" Drama "));
        assert_eq!(field.get("empty"), Some(&XmlValue::Text(String::new())));
    }

    #[test]
    fn test_entities_and_cdata() {
        let doc = parse(
            "<p><a>Tom &amp; Jerry &lt;3 &#65;&#x42;</a><b><![CDATA[<embed src=\"x\"/>]]></b></p>",
            &[],
        )
        .unwrap();
        let p = doc.get("p").unwrap();
        assert_eq!(p.get("a").and_then(XmlValue::as_str), Some("Tom & Jerry <3 AB"));
        assert_eq!(p.get("b").and_then(XmlValue::as_str), Some("<embed src=\"x\"/>"));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(parse("<a><b></a>", &[]), Err(Error::Xml(_))));
        assert!(matches!(parse("<a>", &[]), Err(Error::Xml(_))));
        assert!(matches!(parse("not xml at all", &[]), Err(Error::Xml(_))));
    }

    #[test]
    fn test_decode_entities_single_pass() {
        assert_eq!(decode_xml_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_xml_entities("a & b"), "a & b");
        assert_eq!(decode_xml_entities("&bogus;"), "&bogus;");
        assert_eq!(decode_xml_entities("plain"), "plain");
    }
}
