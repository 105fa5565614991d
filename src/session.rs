//! The active graph view: one graph state and the layout run animating it.
//!
//! At most one session is alive. [`SessionSlot`] owns it and disposes the
//! previous session before a new one takes its place.

use crate::data::RepostRecord;
use crate::error::SelectionError;
use crate::graph::{aggregate, GraphData, GraphState, LayoutRun};
use std::collections::HashSet;

pub struct GraphSession {
    pub graph: GraphState,
    pub layout: LayoutRun,
    /// Categories this graph was built from, sorted for display
    pub categories: Vec<String>,
    disposed: bool,
}

impl GraphSession {
    pub fn start(data: GraphData, selected: &HashSet<String>) -> Self {
        let mut categories: Vec<String> = selected.iter().cloned().collect();
        categories.sort();

        let graph = GraphState::new(data);
        tracing::info!(
            "Session started: {} nodes, {} edges ({})",
            graph.node_count(),
            graph.edge_count(),
            categories.join(", ")
        );
        let layout = LayoutRun::start(graph.node_count());

        Self {
            graph,
            layout,
            categories,
            disposed: false,
        }
    }

    /// Advance the layout one frame. Returns whether it is still running.
    pub fn tick(&mut self) -> bool {
        self.layout.tick(&mut self.graph)
    }

    pub fn select(&mut self, node: Option<usize>) {
        self.graph.selected_node = node;
    }

    /// Stop the layout and drop interaction state.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.layout.stop();
        self.graph.hovered_node = None;
        self.graph.selected_node = None;
        self.disposed = true;
        tracing::info!("Session disposed ({} nodes)", self.graph.node_count());
    }

    #[cfg(test)]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Aggregate the selection and start a session for it.
///
/// Fails without side effects when nothing is selected or the selection
/// produces no nodes or no edges.
pub fn build_session(
    records: &[RepostRecord],
    selected: &HashSet<String>,
) -> Result<GraphSession, SelectionError> {
    if selected.is_empty() {
        return Err(SelectionError::NoCategorySelected);
    }
    let data = aggregate(records, selected);
    if data.is_empty() {
        tracing::info!("Selection produced an empty graph");
        return Err(SelectionError::EmptyGraph);
    }
    Ok(GraphSession::start(data, selected))
}

/// Single owner of the active session
#[derive(Default)]
pub struct SessionSlot {
    current: Option<GraphSession>,
}

impl SessionSlot {
    /// Install `next`, disposing and returning the session it replaces.
    pub fn replace(&mut self, next: GraphSession) -> Option<GraphSession> {
        let previous = self.clear();
        self.current = Some(next);
        previous
    }

    /// Dispose and remove the current session, if any.
    pub fn clear(&mut self) -> Option<GraphSession> {
        let mut previous = self.current.take()?;
        previous.dispose();
        Some(previous)
    }

    pub fn current(&self) -> Option<&GraphSession> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut GraphSession> {
        self.current.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }
}

impl Drop for SessionSlot {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Post, SourceInfo};

    fn record(source: &str, target: &str, category: &str) -> RepostRecord {
        RepostRecord {
            source: Some(source.into()),
            target: Some(target.into()),
            source_info: Some(SourceInfo {
                category: Some(category.into()),
                ..Default::default()
            }),
            target_info: None,
            post: Post::default(),
        }
    }

    fn selection(categories: &[&str]) -> HashSet<String> {
        categories.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn rejects_empty_selection() {
        let records = vec![record("a", "b", "news")];
        let err = build_session(&records, &HashSet::new()).err();
        assert_eq!(err, Some(SelectionError::NoCategorySelected));
    }

    #[test]
    fn rejects_selection_without_edges() {
        let records = vec![record("a", "a", "news"), record("b", "c", "tech")];
        let err = build_session(&records, &selection(&["news"])).err();
        assert_eq!(err, Some(SelectionError::EmptyGraph));
    }

    #[test]
    fn builds_session_for_matching_selection() {
        let records = vec![record("a", "b", "news"), record("c", "b", "tech")];
        let session = build_session(&records, &selection(&["tech", "news"])).unwrap();
        assert_eq!(session.graph.node_count(), 3);
        assert_eq!(session.graph.edge_count(), 2);
        assert_eq!(session.categories, vec!["news", "tech"]);
        assert!(session.layout.is_running());
        assert!(!session.is_disposed());
    }

    #[test]
    fn replacing_disposes_previous() {
        let records = vec![record("a", "b", "news")];
        let mut slot = SessionSlot::default();
        assert!(slot.replace(build_session(&records, &selection(&["news"])).unwrap()).is_none());

        if let Some(s) = slot.current_mut() {
            s.select(Some(0));
        }

        let previous = slot
            .replace(build_session(&records, &selection(&["news"])).unwrap())
            .unwrap();
        assert!(previous.is_disposed());
        assert!(!previous.layout.is_running());
        assert_eq!(previous.graph.selected_node, None);

        let current = slot.current().unwrap();
        assert!(!current.is_disposed());
        assert!(current.layout.is_running());
    }

    #[test]
    fn clear_disposes_and_empties_slot() {
        let records = vec![record("a", "b", "news")];
        let mut slot = SessionSlot::default();
        slot.replace(build_session(&records, &selection(&["news"])).unwrap());

        let cleared = slot.clear().unwrap();
        assert!(cleared.is_disposed());
        assert!(!slot.is_active());
        assert!(slot.clear().is_none());
    }
}
