//! Structural validation of dialogue graphs
//!
//! [`validate`] never mutates the dialogue and never fails: an invalid graph is
//! a normal editing state, so findings come back as plain data.
//!
//! # Checks, in output order
//!
//! 1. Dangling reference (error): a successor names no existing node. Jumps may
//!    name `<dialogue>/<node>` in the project.
//! 2. Unknown speaker (warning): a `say` speaker is neither in the dialogue's
//!    character list nor in the project's characters.
//! 3. Unreachable node (warning): not reachable from the entry node.
//! 4. No reachable end (warning): no `end` node is reachable from the entry.
//! 5. Self-loop (error): every branch of a node leads straight back to it.
//!
//! Within one check, findings follow node insertion order.

mod topology;

use std::fmt;

use crate::aggregates::{Dialogue, Project};
use crate::entities::{DialogueNode, NodeKind};
use crate::ids::{DialogueId, NodeId};
use crate::value_objects::{JumpTarget, NodeRef};

pub use topology::{cycle_report, local_target, Topology};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    DanglingReference,
    UnknownSpeaker,
    Unreachable,
    NoReachableEnd,
    SelfLoop,
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            Self::DanglingReference | Self::SelfLoop => Severity::Error,
            Self::UnknownSpeaker | Self::Unreachable | Self::NoReachableEnd => Severity::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DanglingReference => "dangling-reference",
            Self::UnknownSpeaker => "unknown-speaker",
            Self::Unreachable => "unreachable",
            Self::NoReachableEnd => "no-reachable-end",
            Self::SelfLoop => "self-loop",
        }
    }
}

/// One validation finding, tied to the node it is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub node_id: NodeId,
    pub message: String,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, node_id: &NodeId, message: String) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            node_id: node_id.clone(),
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity,
            self.kind.as_str(),
            self.node_id,
            self.message
        )
    }
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Validate one dialogue against its project.
///
/// The dialogue does not have to be registered in `project`; the project is
/// only consulted for characters and cross-dialogue jump targets.
pub fn validate(dialogue: &Dialogue, project: &Project) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    check_dangling(dialogue, project, &mut diagnostics);
    check_speakers(dialogue, project, &mut diagnostics);
    check_reachability(dialogue, &mut diagnostics);
    check_self_loops(dialogue, &mut diagnostics);
    diagnostics
}

/// Validate every dialogue of the project, in registry order.
pub fn validate_project(project: &Project) -> Vec<(DialogueId, Vec<Diagnostic>)> {
    project
        .dialogues()
        .map(|dialogue| (dialogue.id().clone(), validate(dialogue, project)))
        .collect()
}

fn resolves(dialogue: &Dialogue, project: &Project, node: &DialogueNode, target: &NodeRef) -> bool {
    match local_target(dialogue, node, target) {
        Some(id) => dialogue.contains_node(id),
        None => project.resolve_jump(target.jump_target()).is_some(),
    }
}

fn check_dangling(dialogue: &Dialogue, project: &Project, out: &mut Vec<Diagnostic>) {
    for node in dialogue.nodes() {
        for target in node.successors() {
            if resolves(dialogue, project, node, target) {
                continue;
            }
            let message = match target.jump_target() {
                JumpTarget::External { dialogue: other, .. }
                    if node.kind() == NodeKind::Jump && other != dialogue.id().as_str() =>
                {
                    format!("jump target '{}' does not resolve in the project", target)
                }
                _ => format!("successor '{}' does not exist", target),
            };
            out.push(Diagnostic::new(
                DiagnosticKind::DanglingReference,
                node.id(),
                message,
            ));
        }
    }
}

fn check_speakers(dialogue: &Dialogue, project: &Project, out: &mut Vec<Diagnostic>) {
    for node in dialogue.nodes() {
        let Some(speaker) = node.payload().speaker() else {
            continue;
        };
        let known = dialogue.characters().iter().any(|c| c.as_str() == speaker)
            || project.has_character(speaker);
        if !known {
            out.push(Diagnostic::new(
                DiagnosticKind::UnknownSpeaker,
                node.id(),
                format!("speaker '{}' is not a known character", speaker),
            ));
        }
    }
}

fn check_reachability(dialogue: &Dialogue, out: &mut Vec<Diagnostic>) {
    let Some(entry) = dialogue.entry_node() else {
        return;
    };
    let reachable = Topology::build(dialogue).reachable();

    for node in dialogue.nodes() {
        if !reachable.contains(node.id()) {
            out.push(Diagnostic::new(
                DiagnosticKind::Unreachable,
                node.id(),
                format!("not reachable from entry node '{}'", entry.id()),
            ));
        }
    }

    let ends = dialogue
        .nodes()
        .any(|node| node.kind() == NodeKind::End && reachable.contains(node.id()));
    if !ends {
        out.push(Diagnostic::new(
            DiagnosticKind::NoReachableEnd,
            entry.id(),
            "no end node is reachable from the entry; the dialogue never concludes".to_string(),
        ));
    }
}

/// Every branch slot is set and leads back to the node itself. An unset
/// branch falls through (like an `end`), so it is an exit, not a stall.
fn is_self_loop(dialogue: &Dialogue, node: &DialogueNode) -> bool {
    let branches = node.branches();
    !branches.is_empty()
        && branches.into_iter().all(|slot| {
            slot.and_then(|target| local_target(dialogue, node, target))
                .is_some_and(|id| id == node.id().as_str())
        })
}

fn check_self_loops(dialogue: &Dialogue, out: &mut Vec<Diagnostic>) {
    for node in dialogue.nodes() {
        if is_self_loop(dialogue, node) {
            out.push(Diagnostic::new(
                DiagnosticKind::SelfLoop,
                node.id(),
                "every branch leads back to this node; flow can never progress".to_string(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        Character, ChoiceNode, ChoiceOption, IfNode, JumpNode, NodeDraft, NodePayload, SayNode,
    };
    use crate::ids::CharacterId;

    fn say(id: &str, speaker: &str, next: Option<&str>) -> NodeDraft {
        NodeDraft::new(NodePayload::Say(SayNode {
            speaker: speaker.into(),
            text: "...".into(),
            next: next.map(NodeRef::from),
        }))
        .with_id(id)
        .unwrap()
    }

    fn end(id: &str) -> NodeDraft {
        NodeDraft::of_kind(NodeKind::End).with_id(id).unwrap()
    }

    fn build(id: &str, drafts: Vec<NodeDraft>) -> Dialogue {
        let mut d = Dialogue::new(DialogueId::new(id).unwrap(), id);
        for draft in drafts {
            d.add_node(draft).unwrap();
        }
        d
    }

    fn errors(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
        diagnostics.iter().filter(|d| d.is_error()).collect()
    }

    fn of_kind(diagnostics: &[Diagnostic], kind: DiagnosticKind) -> Vec<&str> {
        diagnostics
            .iter()
            .filter(|d| d.kind == kind)
            .map(|d| d.node_id.as_str())
            .collect()
    }

    #[test]
    fn clean_dialogue_has_no_findings() {
        let d = build("intro", vec![say("a", "", Some("b")), say("b", "", Some("c")), end("c")]);
        assert!(validate(&d, &Project::new("/p")).is_empty());
    }

    #[test]
    fn empty_dialogue_has_no_findings() {
        let d = build("empty", vec![]);
        assert!(validate(&d, &Project::new("/p")).is_empty());
    }

    mod dangling {
        use super::*;

        #[test]
        fn missing_next_yields_exactly_one_error() {
            let d = build("intro", vec![say("a", "", Some("missing"))]);

            let diagnostics = validate(&d, &Project::new("/p"));
            let errs = errors(&diagnostics);

            assert_eq!(errs.len(), 1);
            assert_eq!(errs[0].kind, DiagnosticKind::DanglingReference);
            assert_eq!(errs[0].node_id.as_str(), "a");
            assert!(errs[0].message.contains("missing"));
        }

        #[test]
        fn removed_node_leaves_dangling_error_not_fixup() {
            let mut d = build("intro", vec![say("a", "", Some("b")), say("b", "", None)]);
            d.remove_node("b").unwrap();

            let diagnostics = validate(&d, &Project::new("/p"));

            assert_eq!(of_kind(&diagnostics, DiagnosticKind::DanglingReference), vec!["a"]);
            assert_eq!(
                d.get_node("a").unwrap().successors(),
                vec![&NodeRef::from("b")]
            );
        }

        #[test]
        fn cross_dialogue_jump_resolves_against_project() {
            let mut project = Project::new("/p");
            project.add_dialogue(build("outro", vec![end("fin")])).unwrap();
            let d = build(
                "intro",
                vec![
                    NodeDraft::new(NodePayload::Jump(JumpNode {
                        jump_target: Some(NodeRef::from("outro/fin")),
                    }))
                    .with_id("go")
                    .unwrap(),
                    NodeDraft::new(NodePayload::Jump(JumpNode {
                        jump_target: Some(NodeRef::from("outro/nowhere")),
                    }))
                    .with_id("lost")
                    .unwrap(),
                ],
            );

            let diagnostics = validate(&d, &project);

            assert_eq!(of_kind(&diagnostics, DiagnosticKind::DanglingReference), vec!["lost"]);
        }

        #[test]
        fn only_jumps_may_cross_dialogues() {
            let mut project = Project::new("/p");
            project.add_dialogue(build("outro", vec![end("fin")])).unwrap();
            let d = build("intro", vec![say("a", "", Some("outro/fin"))]);

            let diagnostics = validate(&d, &project);

            assert_eq!(of_kind(&diagnostics, DiagnosticKind::DanglingReference), vec!["a"]);
        }

        #[test]
        fn stale_fields_of_inactive_kinds_are_ignored() {
            let mut d = build("intro", vec![say("a", "", Some("missing"))]);
            d.retype_node("a", NodeKind::End).unwrap();

            let diagnostics = validate(&d, &Project::new("/p"));

            assert!(diagnostics.is_empty());
        }
    }

    mod speakers {
        use super::*;

        #[test]
        fn unknown_speaker_is_a_warning() {
            let mut project = Project::new("/p");
            project
                .add_character(Character::new(CharacterId::new("alice").unwrap(), "Alice"))
                .unwrap();
            let mut d = build(
                "intro",
                vec![
                    say("a", "alice", Some("b")),
                    say("b", "bob", Some("c")),
                    say("c", "carol", Some("d")),
                    end("d"),
                ],
            );
            d.add_character_ref(CharacterId::new("carol").unwrap());

            let diagnostics = validate(&d, &project);

            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].kind, DiagnosticKind::UnknownSpeaker);
            assert_eq!(diagnostics[0].severity, Severity::Warning);
            assert_eq!(diagnostics[0].node_id.as_str(), "b");
        }
    }

    mod reachability {
        use super::*;

        #[test]
        fn isolated_node_is_flagged_but_path_is_not() {
            let d = build(
                "intro",
                vec![say("A", "", Some("B")), say("B", "", Some("END")), end("END"), say("C", "", None)],
            );

            let diagnostics = validate(&d, &Project::new("/p"));

            assert_eq!(of_kind(&diagnostics, DiagnosticKind::Unreachable), vec!["C"]);
            assert!(errors(&diagnostics).is_empty());
        }

        #[test]
        fn explicit_entry_changes_the_root() {
            let mut d = build("intro", vec![say("a", "", Some("b")), end("b")]);
            d.set_entry(Some("b")).unwrap();

            let diagnostics = validate(&d, &Project::new("/p"));

            assert_eq!(of_kind(&diagnostics, DiagnosticKind::Unreachable), vec!["a"]);
        }

        #[test]
        fn missing_reachable_end_is_reported_on_entry() {
            let d = build("intro", vec![say("a", "", Some("b")), say("b", "", None), end("orphan")]);

            let diagnostics = validate(&d, &Project::new("/p"));

            assert_eq!(of_kind(&diagnostics, DiagnosticKind::NoReachableEnd), vec!["a"]);
            assert_eq!(of_kind(&diagnostics, DiagnosticKind::Unreachable), vec!["orphan"]);
        }

        #[test]
        fn loops_through_choices_are_not_errors() {
            let d = build(
                "intro",
                vec![
                    say("a", "", Some("menu")),
                    NodeDraft::new(NodePayload::Choice(ChoiceNode {
                        choices: vec![ChoiceOption::new("again", "a"), ChoiceOption::new("bye", "z")],
                    }))
                    .with_id("menu")
                    .unwrap(),
                    end("z"),
                ],
            );

            assert!(validate(&d, &Project::new("/p")).is_empty());
            assert_eq!(cycle_report(&d).len(), 1);
        }
    }

    mod self_loops {
        use super::*;

        #[test]
        fn next_to_self_is_one_self_loop_error() {
            let d = build("intro", vec![say("a", "", Some("a"))]);

            let diagnostics = validate(&d, &Project::new("/p"));
            let errs = errors(&diagnostics);

            assert_eq!(errs.len(), 1);
            assert_eq!(errs[0].kind, DiagnosticKind::SelfLoop);
            assert_eq!(errs[0].node_id.as_str(), "a");
        }

        fn if_node(then_node: Option<&str>, else_node: Option<&str>) -> NodeDraft {
            NodeDraft::new(NodePayload::If(IfNode {
                condition: "flag".into(),
                then_node: then_node.map(NodeRef::from),
                else_node: else_node.map(NodeRef::from),
            }))
            .with_id("i")
            .unwrap()
        }

        #[test]
        fn if_with_both_branches_to_self_is_a_stall() {
            let d = build("intro", vec![if_node(Some("i"), Some("i"))]);
            let diagnostics = validate(&d, &Project::new("/p"));
            assert_eq!(of_kind(&diagnostics, DiagnosticKind::SelfLoop), vec!["i"]);
        }

        #[test]
        fn if_with_one_unset_branch_falls_through() {
            let d = build("intro", vec![if_node(Some("i"), None)]);
            let diagnostics = validate(&d, &Project::new("/p"));
            assert!(of_kind(&diagnostics, DiagnosticKind::SelfLoop).is_empty());
        }

        #[test]
        fn if_with_an_exit_is_not_a_stall() {
            let d = build("intro", vec![if_node(Some("i"), Some("e")), end("e")]);
            assert!(validate(&d, &Project::new("/p")).is_empty());
        }
    }

    #[test]
    fn diagnostics_follow_check_order() {
        let d = build(
            "intro",
            vec![say("a", "ghost", Some("a")), say("b", "", Some("missing"))],
        );

        let kinds: Vec<DiagnosticKind> = validate(&d, &Project::new("/p"))
            .into_iter()
            .map(|d| d.kind)
            .collect();

        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::DanglingReference,
                DiagnosticKind::UnknownSpeaker,
                DiagnosticKind::Unreachable,
                DiagnosticKind::NoReachableEnd,
                DiagnosticKind::SelfLoop,
            ]
        );
    }

    #[test]
    fn display_names_severity_kind_and_node() {
        let d = build("intro", vec![say("a", "", Some("a"))]);
        let diagnostics = validate(&d, &Project::new("/p"));
        let rendered = diagnostics
            .iter()
            .find(|d| d.kind == DiagnosticKind::SelfLoop)
            .map(ToString::to_string)
            .unwrap();
        assert!(rendered.starts_with("error [self-loop] a:"));
    }
}
