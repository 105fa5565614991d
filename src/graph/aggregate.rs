//! Turns repost records into channel nodes and deduplicated edges.
//!
//! Only records whose source category is selected take part. Node metadata is
//! merged last-write-wins across those records: a source occurrence writes
//! every `source_info` field, a target occurrence writes only the display
//! fields that `target_info` carries.

use super::color::color_for;
use super::types::{node_size, ChannelEdge, ChannelNode, GraphData, IncomingRepost};
use crate::data::{RepostRecord, SourceInfo, TargetInfo};
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// Distinct source categories, in first-seen order.
pub fn extract_categories(records: &[RepostRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|r| r.category())
        .filter(|c| seen.insert(*c))
        .map(str::to_string)
        .collect()
}

/// Aggregate with thread-local randomness for the initial coordinates.
pub fn aggregate(records: &[RepostRecord], selected: &HashSet<String>) -> GraphData {
    aggregate_with_rng(records, selected, &mut rand::thread_rng())
}

/// Build the filtered graph. `rng` only feeds the initial `x`/`y` of nodes.
pub fn aggregate_with_rng<R: Rng + ?Sized>(
    records: &[RepostRecord],
    selected: &HashSet<String>,
    rng: &mut R,
) -> GraphData {
    if selected.is_empty() {
        return GraphData::default();
    }

    let retained: Vec<&RepostRecord> = records
        .iter()
        .filter(|r| r.category().is_some_and(|c| selected.contains(c)))
        .collect();

    let mut nodes = NodeAccumulator::default();
    for record in &retained {
        if let Some(source) = record.source_id() {
            // Retained records always carry source_info (the category lives there)
            let empty = SourceInfo::default();
            nodes.merge_source(source, record.source_info.as_ref().unwrap_or(&empty));
        }
        if let Some(target) = record.target_id() {
            let empty = TargetInfo::default();
            nodes.merge_target(target, record.target_info.as_ref().unwrap_or(&empty));
        }
        if let Some((source, target)) = record.edge_endpoints() {
            nodes.count_repost(source, target, record);
        }
    }

    let mut edges: Vec<ChannelEdge> = Vec::new();
    let mut edge_index: HashMap<(&str, &str), usize> = HashMap::new();
    for record in &retained {
        let Some((source, target)) = record.edge_endpoints() else {
            continue;
        };
        let i = *edge_index.entry((source, target)).or_insert_with(|| {
            edges.push(ChannelEdge {
                source: source.to_string(),
                target: target.to_string(),
                posts: Vec::new(),
            });
            edges.len() - 1
        });
        edges[i].posts.push(record.post.clone());
    }

    let nodes: Vec<ChannelNode> = nodes
        .nodes
        .into_iter()
        .map(|mut node| {
            node.size = node_size(node.outgoing_count);
            node.color = color_for(&node.id);
            node.x = rng.gen::<f32>();
            node.y = rng.gen::<f32>();
            node
        })
        .collect();

    tracing::debug!(
        "Aggregated {} of {} records into {} nodes, {} edges",
        retained.len(),
        records.len(),
        nodes.len(),
        edges.len()
    );

    GraphData { nodes, edges }
}

/// Nodes in first-seen order with an id lookup.
#[derive(Default)]
struct NodeAccumulator {
    nodes: Vec<ChannelNode>,
    index: HashMap<String, usize>,
}

impl NodeAccumulator {
    fn entry(&mut self, id: &str) -> &mut ChannelNode {
        let i = match self.index.get(id) {
            Some(&i) => i,
            None => {
                self.nodes.push(ChannelNode::bare(id));
                self.index.insert(id.to_string(), self.nodes.len() - 1);
                self.nodes.len() - 1
            }
        };
        &mut self.nodes[i]
    }

    fn merge_source(&mut self, id: &str, info: &SourceInfo) {
        let node = self.entry(id);
        node.label = label_or_id(info.title.as_deref(), id);
        node.url = info.link.clone();
        node.participants = info.participants_cnt;
        node.peer_type = info.peer_type.clone();
        node.category = info.category.clone();
        node.about = info.about.clone();
        node.rkn_verification = info.rkn_verification.clone();
        node.country = info.country.clone();
        node.language = info.language.clone();
        node.red_label = info.red_label;
        node.black_label = info.black_label;
    }

    fn merge_target(&mut self, id: &str, info: &TargetInfo) {
        let node = self.entry(id);
        node.label = label_or_id(info.title.as_deref(), id);
        node.url = info.link.clone();
        node.participants = info.participants_cnt;
        node.about = info.about.clone();
    }

    /// Both endpoints were merged before this is called, so they exist.
    fn count_repost(&mut self, source: &str, target: &str, record: &RepostRecord) {
        self.entry(target).incoming_reposts.push(IncomingRepost {
            from: source.to_string(),
            post: record.post.clone(),
        });
        self.entry(source).outgoing_count += 1;
    }
}

fn label_or_id(title: Option<&str>, id: &str) -> String {
    match title {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Post;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn post(date: i64) -> Post {
        Post {
            date: Some(date),
            link: Some(format!("t.me/post/{}", date)),
            ..Default::default()
        }
    }

    fn record(source: Option<&str>, target: Option<&str>, category: &str, date: i64) -> RepostRecord {
        RepostRecord {
            source: source.map(String::from),
            target: target.map(String::from),
            source_info: Some(SourceInfo {
                title: source.map(|s| format!("{} title", s)),
                category: Some(category.to_string()),
                ..Default::default()
            }),
            target_info: Some(TargetInfo {
                title: target.map(|t| format!("{} title", t)),
                ..Default::default()
            }),
            post: post(date),
        }
    }

    fn filter(categories: &[&str]) -> HashSet<String> {
        categories.iter().map(|c| c.to_string()).collect()
    }

    fn run(records: &[RepostRecord], categories: &[&str]) -> GraphData {
        aggregate_with_rng(records, &filter(categories), &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn single_record_end_to_end() {
        let records = vec![RepostRecord {
            source: Some("A".into()),
            target: Some("B".into()),
            source_info: Some(SourceInfo {
                category: Some("news".into()),
                title: Some("Alpha".into()),
                ..Default::default()
            }),
            target_info: Some(TargetInfo {
                title: Some("Beta".into()),
                ..Default::default()
            }),
            post: Post {
                date: Some(0),
                link: Some("x".into()),
                ..Default::default()
            },
        }];

        let data = run(&records, &["news"]);
        assert_eq!(data.nodes.len(), 2);

        let a = data.node("A").unwrap();
        assert_eq!(a.label, "Alpha");
        assert_eq!(a.outgoing_count, 1);
        assert!(a.incoming_reposts.is_empty());
        assert_eq!(a.category.as_deref(), Some("news"));

        let b = data.node("B").unwrap();
        assert_eq!(b.label, "Beta");
        assert_eq!(b.outgoing_count, 0);
        assert_eq!(b.incoming_reposts.len(), 1);
        assert_eq!(b.incoming_reposts[0].from, "A");
        assert_eq!(b.incoming_reposts[0].post, records[0].post);
        assert_eq!(b.category, None);

        assert_eq!(data.edges.len(), 1);
        assert_eq!(data.edges[0].key(), "A->B");
        assert_eq!(data.edges[0].posts, vec![records[0].post.clone()]);
    }

    #[test]
    fn empty_filter_yields_empty_graph() {
        let records = vec![record(Some("A"), Some("B"), "news", 1)];
        let data = run(&records, &[]);
        assert!(data.nodes.is_empty());
        assert!(data.edges.is_empty());
    }

    #[test]
    fn unmatched_category_yields_empty_graph() {
        let records = vec![record(Some("A"), Some("B"), "news", 1)];
        let data = run(&records, &["sports"]);
        assert!(data.nodes.is_empty());
        assert!(data.edges.is_empty());
    }

    #[test]
    fn filtered_records_contribute_nothing() {
        let mut hidden = record(Some("C"), Some("B"), "sports", 2);
        hidden.target_info = Some(TargetInfo {
            title: Some("Hidden title".into()),
            ..Default::default()
        });
        let records = vec![record(Some("A"), Some("B"), "news", 1), hidden];

        let data = run(&records, &["news"]);
        assert!(data.node("C").is_none());
        let b = data.node("B").unwrap();
        assert_eq!(b.label, "B title");
        assert_eq!(b.incoming_reposts.len(), 1);
        assert_eq!(data.edges.len(), 1);
    }

    #[test]
    fn self_loop_creates_node_without_counts() {
        let records = vec![
            record(Some("A"), Some("A"), "news", 1),
            record(Some("A"), Some("B"), "news", 2),
        ];
        let data = run(&records, &["news"]);

        let a = data.node("A").unwrap();
        assert_eq!(a.outgoing_count, 1);
        assert!(a.incoming_reposts.is_empty());
        assert_eq!(data.edges.len(), 1);
        assert!(data.edge("A", "A").is_none());
    }

    #[test]
    fn lone_self_loop_still_creates_node() {
        let records = vec![record(Some("A"), Some("A"), "news", 1)];
        let data = run(&records, &["news"]);
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.nodes[0].outgoing_count, 0);
        assert_eq!(data.nodes[0].size, 3.0);
        assert!(data.edges.is_empty());
        assert!(data.is_empty());
    }

    #[test]
    fn missing_endpoint_creates_node_but_no_edge() {
        let records = vec![
            record(Some("A"), None, "news", 1),
            record(None, Some("B"), "news", 2),
        ];
        let data = run(&records, &["news"]);
        assert_eq!(data.nodes.len(), 2);
        assert!(data.edges.is_empty());
        assert!(data.nodes.iter().all(|n| n.outgoing_count == 0 && n.incoming_reposts.is_empty()));
    }

    #[test]
    fn empty_ids_are_not_channels() {
        let records = vec![
            record(Some(""), Some("B"), "news", 1),
            record(Some("A"), Some(""), "news", 2),
        ];
        let data = run(&records, &["news"]);

        let ids: Vec<_> = data.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert!(data.edges.is_empty());
        assert!(data.nodes.iter().all(|n| n.outgoing_count == 0 && n.incoming_reposts.is_empty()));
    }

    #[test]
    fn duplicate_pairs_collapse_in_input_order() {
        let records = vec![
            record(Some("A"), Some("B"), "news", 1),
            record(Some("C"), Some("B"), "news", 2),
            record(Some("A"), Some("B"), "news", 3),
            record(Some("B"), Some("A"), "news", 4),
        ];
        let data = run(&records, &["news"]);

        let keys: Vec<String> = data.edges.iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec!["A->B", "C->B", "B->A"]);

        let ab = data.edge("A", "B").unwrap();
        let dates: Vec<_> = ab.posts.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![Some(1), Some(3)]);
    }

    #[test]
    fn counts_match_retained_records() {
        let records = vec![
            record(Some("A"), Some("B"), "news", 1),
            record(Some("A"), Some("C"), "news", 2),
            record(Some("A"), Some("B"), "tech", 3),
            record(Some("D"), Some("B"), "sports", 4),
            record(Some("C"), Some("B"), "news", 5),
            record(Some("B"), Some("B"), "news", 6),
        ];
        let selected = ["news", "tech"];
        let data = run(&records, &selected);

        let retained: Vec<_> = records
            .iter()
            .filter(|r| r.category().is_some_and(|c| selected.contains(&c)))
            .filter_map(|r| r.edge_endpoints())
            .collect();

        for node in &data.nodes {
            let out = retained.iter().filter(|(s, _)| *s == node.id).count();
            let inc = retained.iter().filter(|(_, t)| *t == node.id).count();
            assert_eq!(node.outgoing_count, out, "outgoing for {}", node.id);
            assert_eq!(node.incoming_reposts.len(), inc, "incoming for {}", node.id);
            assert_eq!(node.size, node_size(out));
        }

        let b = data.node("B").unwrap();
        let from: Vec<_> = b.incoming_reposts.iter().map(|r| r.from.as_str()).collect();
        assert_eq!(from, vec!["A", "A", "C"]);
    }

    #[test]
    fn every_edge_endpoint_has_a_node() {
        let records = vec![
            record(Some("A"), Some("B"), "news", 1),
            record(Some("B"), Some("C"), "news", 2),
            record(Some("C"), Some("D"), "tech", 3),
        ];
        let data = run(&records, &["news", "tech"]);
        for edge in &data.edges {
            assert!(data.node(&edge.source).is_some());
            assert!(data.node(&edge.target).is_some());
        }
    }

    #[test]
    fn last_write_wins_per_field() {
        let mut first = record(Some("A"), Some("B"), "news", 1);
        first.source_info.as_mut().unwrap().country = Some("RU".into());
        first.source_info.as_mut().unwrap().red_label = Some(true);
        let mut second = record(Some("A"), Some("C"), "news", 2);
        second.source_info.as_mut().unwrap().title = Some("Renamed".into());
        second.source_info.as_mut().unwrap().country = None;

        let data = run(&[first, second], &["news"]);
        let a = data.node("A").unwrap();
        assert_eq!(a.label, "Renamed");
        assert_eq!(a.country, None);
        assert_eq!(a.red_label, None);
    }

    #[test]
    fn target_occurrence_keeps_source_only_fields() {
        let mut as_source = record(Some("A"), Some("B"), "news", 1);
        as_source.source_info.as_mut().unwrap().rkn_verification = Some("verified".into());
        let mut as_target = record(Some("C"), Some("A"), "news", 2);
        as_target.target_info = Some(TargetInfo {
            title: Some("A from target".into()),
            link: Some("t.me/a".into()),
            participants_cnt: Some(10),
            about: Some("about A".into()),
        });

        let data = run(&[as_source, as_target], &["news"]);
        let a = data.node("A").unwrap();
        assert_eq!(a.label, "A from target");
        assert_eq!(a.url.as_deref(), Some("t.me/a"));
        assert_eq!(a.participants, Some(10));
        assert_eq!(a.about.as_deref(), Some("about A"));
        assert_eq!(a.category.as_deref(), Some("news"));
        assert_eq!(a.rkn_verification.as_deref(), Some("verified"));
    }

    #[test]
    fn missing_title_or_target_info_falls_back_to_id() {
        let mut r = record(Some("A"), Some("B"), "news", 1);
        r.source_info.as_mut().unwrap().title = Some(String::new());
        r.target_info = None;
        let data = run(&[r], &["news"]);
        assert_eq!(data.node("A").unwrap().label, "A");
        assert_eq!(data.node("B").unwrap().label, "B");
    }

    #[test]
    fn derived_attributes() {
        let records: Vec<_> = (0..9)
            .map(|i| record(Some("hub"), Some(&format!("t{}", i)), "news", i))
            .collect();
        let data = run(&records, &["news"]);
        let hub = data.node("hub").unwrap();
        assert_eq!(hub.outgoing_count, 9);
        assert!((hub.size - 9.907_755).abs() < 1e-4);
        assert_eq!(hub.color, color_for("hub"));
        for node in &data.nodes {
            assert!((0.0..1.0).contains(&node.x));
            assert!((0.0..1.0).contains(&node.y));
        }
    }

    #[test]
    fn nodes_in_first_seen_order() {
        let records = vec![
            record(Some("C"), Some("A"), "news", 1),
            record(Some("B"), Some("C"), "news", 2),
        ];
        let data = run(&records, &["news"]);
        let ids: Vec<_> = data.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn categories_are_distinct() {
        let mut no_category = record(Some("X"), Some("Y"), "ignored", 0);
        no_category.source_info.as_mut().unwrap().category = None;
        let records = vec![
            record(Some("A"), Some("B"), "news", 1),
            no_category,
            record(Some("C"), Some("B"), "tech", 2),
            record(Some("D"), Some("B"), "news", 3),
            RepostRecord::default(),
        ];
        assert_eq!(extract_categories(&records), vec!["news", "tech"]);
        assert!(extract_categories(&[]).is_empty());
    }

    #[test]
    fn empty_category_is_not_offered() {
        let records = vec![
            record(Some("A"), Some("B"), "", 1),
            record(Some("C"), Some("B"), "news", 2),
        ];
        assert_eq!(extract_categories(&records), vec!["news"]);
    }
}
