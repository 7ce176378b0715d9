//! Minimal XML inspection: the root element of a well-formed document.

use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

/// Local name and resolved namespace of a document's root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlRoot {
    pub name: String,
    /// Empty when the root element is not bound to a namespace.
    pub namespace: String,
}

/// Reads the whole document and returns its root element.
///
/// Returns `None` when the content has no element or is not well-formed
/// (mismatched end tags, broken markup). Only elements are checked, the
/// content of the document is discarded.
pub fn parse_root(content: &[u8]) -> Option<XmlRoot> {
    let mut reader = NsReader::from_reader(content);
    let mut root = None;

    loop {
        match reader.read_resolved_event() {
            Ok((namespace, Event::Start(element) | Event::Empty(element))) if root.is_none() => {
                let namespace = match namespace {
                    ResolveResult::Bound(ns) => String::from_utf8_lossy(ns.as_ref()).into_owned(),
                    _ => String::new(),
                };
                root = Some(XmlRoot {
                    name: String::from_utf8_lossy(element.local_name().as_ref()).into_owned(),
                    namespace,
                });
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::trace!(%err, "content is not well-formed XML");
                return None;
            }
        }
    }

    root
}
