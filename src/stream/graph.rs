//! Runtime stream representation using a directed graph.
//!
//! A `StreamGraph` is the read snapshot the scheduler traverses: it is built
//! once from a [`StreamModel`] when a run is created and never mutated
//! afterwards, so editor changes made mid-run cannot retroactively affect
//! that run's traversal.

use std::collections::HashMap;

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use tracing::warn;

use crate::{
    Result,
    model::StreamModel,
    stream::{
        nexus::{Nexus, NexusId, NexusKind},
        synapse::Synapse,
    },
};

/// Immutable stream snapshot as a directed graph.
///
/// The graph enables:
/// - Trigger discovery (entry points for traversal)
/// - Ordered outgoing-synapse lookup (FIFO seeding order = declaration order)
/// - Defensive node resolution (dangling references are skipped, not fatal)
#[derive(Clone)]
pub struct StreamGraph {
    /// Directed graph storing nexuses and synapses.
    graph: DiGraph<Nexus, Synapse>,
    /// Nexus id -> graph index lookup.
    index: HashMap<NexusId, NodeIndex>,
}

impl StreamGraph {
    /// get nexus by id
    pub fn get_node(
        &self,
        id: &NexusId,
    ) -> Option<&Nexus> {
        self.index.get(id).map(|idx| &self.graph[*idx])
    }

    /// all trigger nexuses, in declaration order
    pub fn trigger_nodes(&self) -> Vec<&Nexus> {
        self.graph.node_indices().map(|idx| &self.graph[idx]).filter(|n| n.kind == NexusKind::Trigger).collect()
    }

    /// outgoing synapses of a nexus, in declaration order
    pub fn outgoing_synapses(
        &self,
        id: &NexusId,
    ) -> Vec<&Synapse> {
        let Some(idx) = self.index.get(id) else {
            return Vec::new();
        };

        // edges_directed iterates most-recently-added first; sort by edge
        // index to restore declaration order for FIFO seeding.
        let mut edges: Vec<_> = self.graph.edges_directed(*idx, Direction::Outgoing).collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| e.weight()).collect()
    }

    /// all nexus ids, in declaration order
    pub fn node_ids(&self) -> Vec<NexusId> {
        self.graph.node_indices().map(|idx| self.graph[idx].id.clone()).collect()
    }

    /// number of nexuses
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// number of synapses
    pub fn synapse_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Output a human-readable representation of the stream graph
    #[allow(unused)]
    pub fn schema(&self) -> String {
        let mut lines = Vec::new();

        lines.push("=== Stream Graph ===".to_string());
        lines.push(format!("Nexuses: {}, Synapses: {}", self.graph.node_count(), self.graph.edge_count()));
        lines.push(String::new());

        lines.push("--- Nexuses ---".to_string());
        for idx in self.graph.node_indices() {
            let nexus = &self.graph[idx];
            lines.push(format!(
                "[{}] {} (kind: {}, subtype: {})",
                nexus.id,
                nexus.label,
                nexus.kind.as_ref(),
                nexus.subtype.as_ref()
            ));
        }
        lines.push(String::new());

        lines.push("--- Synapses ---".to_string());
        for idx in self.graph.edge_indices() {
            let synapse = &self.graph[idx];
            lines.push(format!(
                "{} --[{}]--> {} (id: {})",
                synapse.source, synapse.source_handle, synapse.target, synapse.id
            ));
        }

        lines.join("\n")
    }
}

impl TryFrom<&StreamModel> for StreamGraph {
    type Error = crate::StreamError;

    fn try_from(model: &StreamModel) -> Result<Self> {
        let mut graph: DiGraph<Nexus, Synapse> = DiGraph::new();
        let mut index = HashMap::new();

        for nexus_model in model.nexuses.iter() {
            let nexus = Nexus::new(nexus_model)?;
            let nid = nexus.id.clone();
            let node_idx = graph.add_node(nexus);
            index.insert(nid, node_idx);
        }

        for synapse_model in model.synapses.iter() {
            let mut synapse = Synapse::new(synapse_model);

            // Dangling endpoints are an editor artifact, not a fatal error;
            // the synapse is dropped from the snapshot.
            let (Some(source), Some(target)) = (index.get(&synapse.source), index.get(&synapse.target)) else {
                warn!(synapse = %synapse.id, source = %synapse.source, target = %synapse.target, "skipping synapse with dangling endpoint");
                continue;
            };

            synapse.source_handle = graph[*source].resolve_handle(&synapse.source_handle);
            graph.add_edge(*source, *target, synapse);
        }

        Ok(Self {
            graph,
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NexusModel, SynapseModel};
    use crate::stream::NexusSubtype;

    fn nexus(
        id: &str,
        kind: NexusKind,
    ) -> NexusModel {
        NexusModel {
            id: id.to_string(),
            kind,
            subtype: NexusSubtype::Logger,
            ..Default::default()
        }
    }

    fn synapse(
        id: &str,
        source: &str,
        target: &str,
    ) -> SynapseModel {
        SynapseModel {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            source_handle: None,
        }
    }

    fn model() -> StreamModel {
        StreamModel {
            id: "s1".to_string(),
            name: "test".to_string(),
            desc: String::new(),
            nexuses: vec![
                nexus("t1", NexusKind::Trigger),
                nexus("a1", NexusKind::Action),
                nexus("a2", NexusKind::Action),
            ],
            synapses: vec![synapse("s1", "t1", "a1"), synapse("s2", "t1", "a2")],
        }
    }

    #[test]
    fn test_trigger_nodes() {
        let graph = StreamGraph::try_from(&model()).unwrap();
        let triggers = graph.trigger_nodes();
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].id, "t1");
    }

    #[test]
    fn test_outgoing_synapses_declaration_order() {
        let graph = StreamGraph::try_from(&model()).unwrap();
        let outgoing: Vec<_> = graph.outgoing_synapses(&"t1".to_string()).iter().map(|s| s.target.clone()).collect();
        assert_eq!(outgoing, vec!["a1".to_string(), "a2".to_string()]);
    }

    #[test]
    fn test_dangling_synapse_skipped() {
        let mut m = model();
        m.synapses.push(synapse("s3", "t1", "ghost"));

        let graph = StreamGraph::try_from(&m).unwrap();
        assert_eq!(graph.synapse_count(), 2);
        assert!(graph.get_node(&"ghost".to_string()).is_none());
    }

    #[test]
    fn test_unknown_handle_normalized_to_first_port() {
        let mut m = model();
        m.synapses[0].source_handle = Some("nonexistent".to_string());

        let graph = StreamGraph::try_from(&m).unwrap();
        let outgoing = graph.outgoing_synapses(&"t1".to_string());
        assert_eq!(outgoing[0].source_handle, "default");
    }
}
