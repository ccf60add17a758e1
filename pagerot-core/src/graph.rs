use pagerot_client::PageRecord;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use tracing::debug;

/// Directed reference graph over one snapshot.
///
/// Lifecycle is create-compute-discard: built fresh per run, never updated
/// incrementally.
pub struct ReferenceGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
    dangling: HashMap<String, usize>,
}

/// Build the reference graph for a snapshot. Pure function of its input:
/// a first pass collects the node set, a second pass adds an edge per
/// declared reference whose target exists in the snapshot and tallies the
/// rest as dangling.
pub fn build_graph(pages: &[PageRecord]) -> ReferenceGraph {
    let mut graph = DiGraph::new();
    let mut index: HashMap<String, NodeIndex> = HashMap::with_capacity(pages.len());
    for page in pages {
        if !index.contains_key(&page.id) {
            let node = graph.add_node(page.id.clone());
            index.insert(page.id.clone(), node);
        }
    }

    let mut dangling: HashMap<String, usize> = HashMap::new();
    for page in pages {
        let Some(&from) = index.get(&page.id) else {
            continue;
        };
        for target in &page.outgoing_refs {
            match index.get(target) {
                Some(&to) => {
                    graph.add_edge(from, to, ());
                }
                None => {
                    *dangling.entry(target.clone()).or_insert(0) += 1;
                }
            }
        }
    }

    debug!(
        "graph: {} nodes, {} edges, {} dangling targets",
        graph.node_count(),
        graph.edge_count(),
        dangling.len()
    );
    ReferenceGraph {
        graph,
        index,
        dangling,
    }
}

impl ReferenceGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Incoming edge count, self-references included.
    pub fn in_degree(&self, id: &str) -> usize {
        self.index
            .get(id)
            .map(|&node| self.graph.edges_directed(node, Direction::Incoming).count())
            .unwrap_or(0)
    }

    /// Incoming edges from other pages. A self-reference is an edge, but it
    /// does not count here: a page linked only by itself is still isolated.
    pub fn inbound_from_others(&self, id: &str) -> usize {
        self.index
            .get(id)
            .map(|&node| {
                self.graph
                    .edges_directed(node, Direction::Incoming)
                    .filter(|edge| edge.source() != node)
                    .count()
            })
            .unwrap_or(0)
    }

    /// A known page no other page references.
    pub fn is_isolated(&self, id: &str) -> bool {
        self.contains(id) && self.inbound_from_others(id) == 0
    }

    /// References whose target is absent from the snapshot, keyed by target
    /// id. Diagnostics only; dangling references never create edges.
    pub fn dangling(&self) -> &HashMap<String, usize> {
        &self.dangling
    }

    pub fn dangling_total(&self) -> usize {
        self.dangling.values().sum()
    }
}
