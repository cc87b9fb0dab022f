//! Same-dialogue topology built from [`DialogueNode::successors`].
//!
//! Edges only exist between nodes of one dialogue; dangling references and
//! jumps into other dialogues contribute no edge.

use std::collections::{HashMap, HashSet};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;

use crate::aggregates::Dialogue;
use crate::entities::{DialogueNode, NodeKind};
use crate::ids::NodeId;
use crate::value_objects::{JumpTarget, NodeRef};

/// The node id a successor reference names inside `dialogue`, if it is a
/// same-dialogue reference at all. Existence is not checked.
pub fn local_target<'r>(
    dialogue: &Dialogue,
    node: &DialogueNode,
    target: &'r NodeRef,
) -> Option<&'r str> {
    if node.kind() != NodeKind::Jump {
        return Some(target.as_str());
    }
    match target.jump_target() {
        JumpTarget::Local(id) => Some(id),
        JumpTarget::External {
            dialogue: other,
            node: id,
        } if other == dialogue.id().as_str() => Some(id),
        JumpTarget::External { .. } => None,
    }
}

pub struct Topology<'a> {
    dialogue: &'a Dialogue,
    graph: DiGraph<&'a NodeId, ()>,
    index: HashMap<&'a str, NodeIndex>,
}

impl<'a> Topology<'a> {
    pub fn build(dialogue: &'a Dialogue) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for id in dialogue.node_ids() {
            index.insert(id.as_str(), graph.add_node(id));
        }
        for node in dialogue.nodes() {
            let from = index[node.id().as_str()];
            for target in node.successors() {
                let to = local_target(dialogue, node, target).and_then(|id| index.get(id));
                if let Some(&to) = to {
                    graph.add_edge(from, to, ());
                }
            }
        }
        Self {
            dialogue,
            graph,
            index,
        }
    }

    /// Ids reachable from the dialogue's entry node (entry included).
    pub fn reachable(&self) -> HashSet<&'a NodeId> {
        let mut seen = HashSet::new();
        let Some(entry) = self.dialogue.entry_node() else {
            return seen;
        };
        let Some(&start) = self.index.get(entry.id().as_str()) else {
            return seen;
        };
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(visited) = dfs.next(&self.graph) {
            seen.insert(self.graph[visited]);
        }
        seen
    }

    /// Loops among reachable nodes, each in insertion order, ordered by their
    /// earliest node.
    ///
    /// A loop is a strongly connected component with more than one node, or a
    /// single node with an edge to itself.
    pub fn cycles(&self) -> Vec<Vec<NodeId>> {
        let reachable = self.reachable();
        let order: HashMap<&str, usize> = self
            .dialogue
            .node_ids()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let mut cycles: Vec<Vec<NodeId>> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => self.graph.contains_edge(*single, *single),
                _ => true,
            })
            .map(|component| {
                let mut ids: Vec<NodeId> = component
                    .into_iter()
                    .map(|ix| self.graph[ix])
                    .filter(|id| reachable.contains(id))
                    .cloned()
                    .collect();
                ids.sort_by_key(|id| order[id.as_str()]);
                ids
            })
            .filter(|ids| !ids.is_empty())
            .collect();
        cycles.sort_by_key(|ids| order[ids[0].as_str()]);
        cycles
    }
}

/// Informational loop report for a dialogue. Loops are legal (a choice may
/// lead back to earlier content); this never blocks anything.
pub fn cycle_report(dialogue: &Dialogue) -> Vec<Vec<NodeId>> {
    Topology::build(dialogue).cycles()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ChoiceNode, ChoiceOption, JumpNode, NodeDraft, NodePayload, SayNode};
    use crate::ids::DialogueId;

    fn say(id: &str, next: &str) -> NodeDraft {
        NodeDraft::new(NodePayload::Say(SayNode {
            speaker: String::new(),
            text: String::new(),
            next: Some(NodeRef::from(next)),
        }))
        .with_id(id)
        .unwrap()
    }

    fn dialogue(drafts: Vec<NodeDraft>) -> Dialogue {
        let mut d = Dialogue::new(DialogueId::new("loop").unwrap(), "Loop");
        for draft in drafts {
            d.add_node(draft).unwrap();
        }
        d
    }

    #[test]
    fn choice_back_to_start_is_reported_as_cycle() {
        let d = dialogue(vec![
            say("a", "menu"),
            NodeDraft::new(NodePayload::Choice(ChoiceNode {
                choices: vec![ChoiceOption::new("again", "a"), ChoiceOption::new("leave", "end")],
            }))
            .with_id("menu")
            .unwrap(),
            NodeDraft::of_kind(NodeKind::End).with_id("end").unwrap(),
        ]);

        let cycles = cycle_report(&d);

        assert_eq!(cycles.len(), 1);
        let names: Vec<&str> = cycles[0].iter().map(NodeId::as_str).collect();
        assert_eq!(names, vec!["a", "menu"]);
    }

    #[test]
    fn unreachable_loops_are_not_reported() {
        let d = dialogue(vec![
            NodeDraft::of_kind(NodeKind::End).with_id("start").unwrap(),
            say("x", "y"),
            say("y", "x"),
        ]);
        assert!(cycle_report(&d).is_empty());
    }

    #[test]
    fn own_dialogue_jump_is_a_local_edge() {
        let d = dialogue(vec![
            NodeDraft::new(NodePayload::Jump(JumpNode {
                jump_target: Some(NodeRef::from("loop/b")),
            }))
            .with_id("a")
            .unwrap(),
            NodeDraft::of_kind(NodeKind::End).with_id("b").unwrap(),
        ]);

        let reachable = Topology::build(&d).reachable();

        assert_eq!(reachable.len(), 2);
    }

    #[test]
    fn dangling_targets_add_no_edges() {
        let d = dialogue(vec![say("a", "missing")]);
        let reachable = Topology::build(&d).reachable();
        assert_eq!(reachable.len(), 1);
        assert!(cycle_report(&d).is_empty());
    }
}
