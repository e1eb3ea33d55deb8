//! Reference-key highlighting.
//!
//! After a document is opened from a reference search, every element whose cross reference
//! is in the requested key set is emphasized and the view scrolls to the first match in
//! document order.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

pub use crate::model::Region;
use crate::model::{LocalDocumentModel, ReferenceKey};

/// An element as seen through a document view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewElement {
    /// Stable element id within the view (graph id, or a positional fallback).
    pub id: String,
    pub label: String,
    pub reference: Option<ReferenceKey>,
    pub bounds: Region,
}

/// Editor-side view of an opened document.
pub trait DocumentView: Send + Sync {
    /// Elements in document order.
    fn elements(&self) -> Vec<ViewElement>;
    fn emphasize(&self, element_id: &str);
    fn scroll_to(&self, region: Region);
}

/// Emphasize all elements whose reference is in `keys`.
///
/// Returns the bounds of the first match, or `None` when nothing matched (including an
/// empty key set). Scrolling is left to the caller.
pub fn highlight(view: &dyn DocumentView, keys: &HashSet<ReferenceKey>) -> Option<Region> {
    if keys.is_empty() {
        return None;
    }
    let mut first = None;
    for element in view.elements() {
        let hit = element.reference.as_ref().is_some_and(|r| keys.contains(r));
        if hit {
            view.emphasize(&element.id);
            first.get_or_insert(element.bounds);
        }
    }
    first
}

#[derive(Debug, Default)]
struct ViewMarks {
    emphasized: Vec<String>,
    scrolled_to: Option<Region>,
}

/// A `DocumentView` over a converted model that records emphasis and scrolling.
///
/// Used by headless hosts; the recorded marks are what a renderer would draw.
#[derive(Debug, Clone)]
pub struct ModelView {
    elements: Arc<Vec<ViewElement>>,
    marks: Arc<Mutex<ViewMarks>>,
}

impl ModelView {
    pub fn new(model: &LocalDocumentModel) -> Self {
        let elements = model
            .elements
            .iter()
            .enumerate()
            .map(|(i, node)| ViewElement {
                id: node.graph_id.clone().unwrap_or_else(|| format!("node-{i}")),
                label: node.label.clone(),
                reference: node.reference.clone(),
                bounds: node.bounds,
            })
            .collect();
        Self {
            elements: Arc::new(elements),
            marks: Arc::new(Mutex::new(ViewMarks::default())),
        }
    }

    pub fn emphasized(&self) -> Vec<String> {
        self.marks.lock().emphasized.clone()
    }

    pub fn scrolled_to(&self) -> Option<Region> {
        self.marks.lock().scrolled_to
    }

    pub fn element(&self, id: &str) -> Option<ViewElement> {
        self.elements.iter().find(|e| e.id == id).cloned()
    }
}

impl DocumentView for ModelView {
    fn elements(&self) -> Vec<ViewElement> {
        self.elements.as_ref().clone()
    }

    fn emphasize(&self, element_id: &str) {
        let mut marks = self.marks.lock();
        if !marks.emphasized.iter().any(|e| e == element_id) {
            marks.emphasized.push(element_id.to_string());
        }
    }

    fn scroll_to(&self, region: Region) {
        self.marks.lock().scrolled_to = Some(region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataNode;

    fn node(id: &str, key: Option<(&str, &str)>, x: f64) -> DataNode {
        DataNode {
            graph_id: Some(id.to_string()),
            label: id.to_string(),
            reference: key.map(|(ns, i)| ReferenceKey::new(ns, i)),
            bounds: Region::new(x, 0.0, 10.0, 10.0),
        }
    }

    fn view() -> ModelView {
        ModelView::new(&LocalDocumentModel {
            identifier: None,
            name: "t".into(),
            species: "Homo sapiens".into(),
            elements: vec![
                node("A", Some(("Entrez Gene", "X")), 1.0),
                node("B", Some(("Entrez Gene", "Y")), 2.0),
                node("C", Some(("Entrez Gene", "X")), 3.0),
                node("D", None, 4.0),
            ],
            gpml: String::new(),
        })
    }

    #[test]
    fn marks_all_matches_and_returns_first() {
        let v = view();
        let keys = HashSet::from([ReferenceKey::new("Entrez Gene", "X")]);
        let first = highlight(&v, &keys);
        assert_eq!(v.emphasized(), vec!["A".to_string(), "C".to_string()]);
        assert_eq!(first, Some(Region::new(1.0, 0.0, 10.0, 10.0)));
        assert_eq!(v.scrolled_to(), None);
    }

    #[test]
    fn no_match_marks_nothing() {
        let v = view();
        let keys = HashSet::from([ReferenceKey::new("Entrez Gene", "Z")]);
        assert_eq!(highlight(&v, &keys), None);
        assert!(v.emphasized().is_empty());
    }

    #[test]
    fn namespace_is_part_of_the_match() {
        let v = view();
        let keys = HashSet::from([ReferenceKey::new("Ensembl", "X")]);
        assert_eq!(highlight(&v, &keys), None);
    }

    #[test]
    fn empty_key_set_is_a_no_op() {
        let v = view();
        assert_eq!(highlight(&v, &HashSet::new()), None);
        assert!(v.emphasized().is_empty());
    }

    #[test]
    fn unnamed_nodes_get_positional_ids() {
        let mut n = node("x", None, 0.0);
        n.graph_id = None;
        let v = ModelView::new(&LocalDocumentModel {
            identifier: None,
            name: String::new(),
            species: String::new(),
            elements: vec![n],
            gpml: String::new(),
        });
        assert_eq!(v.elements()[0].id, "node-0");
    }
}
