//! Dotted-path navigation into a configuration document.
//!
//! Paths start with the root element name, e.g. `Server.Bind.Providers.RTMP.Port`.
//! A final `@name` segment addresses an attribute: `Server.@version`.

use crate::document::model::{Document, Element};
use crate::document::{DocumentError, DocumentResult};

/// Find the element at `path`, if every segment exists.
pub fn find_element<'a>(doc: &'a Document, path: &str) -> Option<&'a Element> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    if first != doc.root.name {
        return None;
    }
    segments.try_fold(&doc.root, |element, segment| {
        if segment.starts_with('@') {
            None
        } else {
            element.child(segment)
        }
    })
}

/// Read the text (or attribute) at `path`, falling back to `default`.
pub fn get_path(doc: &Document, path: &str, default: &str) -> String {
    let value = match split_attribute(path) {
        (element_path, Some(attribute)) => find_element(doc, element_path)
            .and_then(|e| e.attribute(attribute))
            .map(str::to_string),
        (element_path, None) => find_element(doc, element_path).map(Element::text),
    };
    value.unwrap_or_else(|| default.to_string())
}

/// Write `value` at `path`, creating intermediate elements as needed.
pub fn set_path(doc: &mut Document, path: &str, value: &str) -> DocumentResult<()> {
    let invalid = |reason: &str| DocumentError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid("empty segment"));
    }
    if segments[0] != doc.root.name {
        return Err(invalid(&format!("root element is <{}>", doc.root.name)));
    }

    let Some((last, middle)) = segments[1..].split_last() else {
        doc.root.set_text(value);
        return Ok(());
    };

    let mut current = &mut doc.root;
    for segment in middle {
        if segment.starts_with('@') {
            return Err(invalid("attribute segment must be last"));
        }
        current = current.ensure_child(segment);
    }

    match last.strip_prefix('@') {
        Some("") => Err(invalid("attribute name is empty")),
        Some(attribute) => {
            current.set_attribute(attribute, value);
            Ok(())
        }
        None => {
            current.ensure_child(last).set_text(value);
            Ok(())
        }
    }
}

fn split_attribute(path: &str) -> (&str, Option<&str>) {
    match path.rsplit_once('.') {
        Some((prefix, last)) if last.starts_with('@') => (prefix, Some(&last[1..])),
        _ => (path, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::codec::parse;

    fn doc() -> Document {
        parse(r#"<Server version="8"><Bind><Providers><RTMP><Port>1935</Port></RTMP></Providers></Bind></Server>"#)
            .unwrap()
    }

    #[test]
    fn test_get_path_reads_text_and_attributes() {
        let doc = doc();
        assert_eq!(get_path(&doc, "Server.Bind.Providers.RTMP.Port", "0"), "1935");
        assert_eq!(get_path(&doc, "Server.@version", "unknown"), "8");
    }

    #[test]
    fn test_get_path_defaults() {
        let doc = doc();
        assert_eq!(get_path(&doc, "Server.Bind.Providers.SRT.Port", "9999"), "9999");
        assert_eq!(get_path(&doc, "Other.Bind", "d"), "d");
        assert_eq!(get_path(&doc, "Server.@version.Port", "d"), "d");
        assert_eq!(get_path(&doc, "Server..Bind", "d"), "d");
        assert_eq!(get_path(&doc, "Server.@missing", "d"), "d");
    }

    #[test]
    fn test_set_path_creates_intermediates() {
        let mut doc = doc();
        set_path(&mut doc, "Server.Bind.Providers.SRT.Port", "9999").unwrap();
        set_path(&mut doc, "Server.Bind.Providers.RTMP.Port", "1936").unwrap();
        set_path(&mut doc, "Server.@version", "9").unwrap();

        assert_eq!(get_path(&doc, "Server.Bind.Providers.SRT.Port", ""), "9999");
        assert_eq!(get_path(&doc, "Server.Bind.Providers.RTMP.Port", ""), "1936");
        assert_eq!(get_path(&doc, "Server.@version", ""), "9");
        let providers = find_element(&doc, "Server.Bind.Providers").unwrap();
        assert_eq!(providers.children_named("RTMP").count(), 1);
    }

    #[test]
    fn test_set_path_rejects_bad_paths() {
        let mut doc = doc();
        for bad in ["", "Other.Bind", "Server.@x.Port", "Server..Bind", "Server.@"] {
            assert!(
                matches!(set_path(&mut doc, bad, "v"), Err(DocumentError::InvalidPath { .. })),
                "expected invalid path for {:?}",
                bad
            );
        }
    }
}
