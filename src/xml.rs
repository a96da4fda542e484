//! # XML Document Loading
//!
//! Parses an XML report description into a [`DocumentTree`]. The root
//! element (any name) becomes the document root and carries the page setup
//! attributes; child elements map to the node vocabulary, with `tr`/`td`
//! accepted for rows and cells. Elements outside the vocabulary are kept as
//! `Other` nodes — never drawn, still traversed.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{FolioError, Result};
use crate::model::{DocumentTree, NodeId, NodeKind};

/// Parse an XML string into a document tree.
pub fn parse_document(xml: &str) -> Result<DocumentTree> {
    let mut reader = Reader::from_str(xml);
    let mut tree = DocumentTree::new();
    // Open-element stack; the document root sits at the bottom.
    let mut stack: Vec<NodeId> = Vec::new();
    let mut saw_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let node = open_element(&mut tree, &stack, &mut saw_root, &e);
                stack.push(node);
            }
            Event::Empty(e) => {
                open_element(&mut tree, &stack, &mut saw_root, &e);
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(t) => {
                if let Some(&top) = stack.last() {
                    let text = t.unescape().map_err(quick_xml::Error::from)?;
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        tree.push_text(top, trimmed);
                    }
                }
            }
            Event::CData(t) => {
                if let Some(&top) = stack.last() {
                    let text = String::from_utf8_lossy(t.as_ref()).to_string();
                    if !text.trim().is_empty() {
                        tree.push_text(top, text.trim());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(FolioError::MalformedDocument(
            "document has no root element".to_string(),
        ));
    }
    Ok(tree)
}

/// Materialize an element: the first one becomes the document root, every
/// other is appended under the innermost open element. Returns the node the
/// element maps to.
fn open_element(
    tree: &mut DocumentTree,
    stack: &[NodeId],
    saw_root: &mut bool,
    e: &BytesStart,
) -> NodeId {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let node = if !*saw_root {
        *saw_root = true;
        tree.root()
    } else {
        let kind = NodeKind::from_element_name(&name);
        if matches!(kind, NodeKind::Other(_)) {
            log::warn!("unknown element <{name}>, kept but never drawn");
        }
        let node = tree.create(kind);
        let parent = stack.last().copied().unwrap_or_else(|| tree.root());
        tree.append_child(parent, node);
        node
    };
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = String::from_utf8_lossy(&attr.value).to_string();
        tree.set_attr(node, &key, value);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_report() {
        let tree = parse_document(
            r#"<report width="210" height="297" left="20">
                 <move absY="10"/>
                 <text align="center">Annual Report</text>
                 <newpage/>
               </report>"#,
        )
        .unwrap();

        assert_eq!(tree.attr(tree.root(), "left"), Some("20"));
        let children = tree.children(tree.root()).to_vec();
        assert_eq!(children.len(), 3);
        assert_eq!(tree.kind(children[0]), &NodeKind::Move);
        assert_eq!(tree.kind(children[1]), &NodeKind::Text);
        assert_eq!(tree.text(children[1]), "Annual Report");
        assert_eq!(tree.attr(children[1], "align"), Some("center"));
        assert_eq!(tree.kind(children[2]), &NodeKind::NewPage);
    }

    #[test]
    fn test_parse_table_vocabulary_and_aliases() {
        let tree = parse_document(
            r#"<report>
                 <table lineheight="4">
                   <columns>
                     <column width="50">Account</column>
                   </columns>
                   <data>
                     <tr><td>1000</td></tr>
                   </data>
                 </table>
               </report>"#,
        )
        .unwrap();

        let table = tree.first_child(tree.root()).unwrap();
        assert_eq!(tree.kind(table), &NodeKind::Table);
        let blocks = tree.children(table).to_vec();
        assert_eq!(tree.kind(blocks[0]), &NodeKind::Columns);
        assert_eq!(tree.kind(blocks[1]), &NodeKind::Data);
        let column = tree.first_child(blocks[0]).unwrap();
        assert_eq!(tree.kind(column), &NodeKind::Column);
        assert_eq!(tree.text(column), "Account");
        let row = tree.first_child(blocks[1]).unwrap();
        assert_eq!(tree.kind(row), &NodeKind::Row);
        let cell = tree.first_child(row).unwrap();
        assert_eq!(tree.kind(cell), &NodeKind::Cell);
        assert_eq!(tree.text(cell), "1000");
    }

    #[test]
    fn test_unknown_elements_become_other() {
        let tree = parse_document("<report><watermark>draft</watermark></report>").unwrap();
        let child = tree.first_child(tree.root()).unwrap();
        assert_eq!(
            tree.kind(child),
            &NodeKind::Other("watermark".to_string())
        );
    }

    #[test]
    fn test_entities_unescape() {
        let tree = parse_document("<report><text>Profit &amp; Loss</text></report>").unwrap();
        let text = tree.first_child(tree.root()).unwrap();
        assert_eq!(tree.text(text), "Profit & Loss");
    }

    #[test]
    fn test_empty_input_is_malformed() {
        assert!(matches!(
            parse_document("  "),
            Err(FolioError::MalformedDocument(_))
        ));
    }
}
