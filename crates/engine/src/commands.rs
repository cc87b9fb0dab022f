//! `talegraph` subcommands.
//!
//! Each command writes its report to `out` and returns whether the project is
//! clean, which the binary turns into the exit status.

use std::io::Write;

use anyhow::Context;
use talegraph_domain::{cycle_report, has_errors, validate_project, Project};

use crate::infrastructure::ports::{ProjectLoad, ProjectStore};

pub const USAGE: &str = "Usage: talegraph <command> [project-root]

Commands:
  validate  Report load failures and graph diagnostics
  cycles    List reachable cycles per dialogue
  outline   Print every node with a one-line preview
  format    Re-save every dialogue in normalised layout";

fn report_failures(load: &ProjectLoad, out: &mut impl Write) -> anyhow::Result<()> {
    for failure in &load.failures {
        writeln!(out, "load failed: {}", failure.error)?;
    }
    Ok(())
}

fn load_project(store: &impl ProjectStore, root: &std::path::Path) -> anyhow::Result<ProjectLoad> {
    store
        .load_project(root)
        .with_context(|| format!("loading project at {}", root.display()))
}

pub fn validate(
    store: &impl ProjectStore,
    root: &std::path::Path,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let load = load_project(store, root)?;
    report_failures(&load, out)?;

    let mut clean = load.is_clean();
    let mut total = 0;
    for (dialogue, diagnostics) in validate_project(&load.project) {
        for diagnostic in &diagnostics {
            writeln!(out, "{}: {}", dialogue, diagnostic)?;
        }
        total += diagnostics.len();
        clean &= !has_errors(&diagnostics);
    }

    writeln!(
        out,
        "{} dialogue(s), {} diagnostic(s), {} load failure(s)",
        load.project.dialogues().count(),
        total,
        load.failures.len()
    )?;
    tracing::info!(clean, diagnostics = total, "Validation finished");
    Ok(clean)
}

pub fn cycles(
    store: &impl ProjectStore,
    root: &std::path::Path,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let load = load_project(store, root)?;
    report_failures(&load, out)?;

    for dialogue in load.project.dialogues() {
        for cycle in cycle_report(dialogue) {
            let ids: Vec<&str> = cycle.iter().map(|id| id.as_str()).collect();
            writeln!(out, "{}: {}", dialogue.id(), ids.join(" -> "))?;
        }
    }
    Ok(load.is_clean())
}

pub fn outline(
    store: &impl ProjectStore,
    root: &std::path::Path,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let load = load_project(store, root)?;
    report_failures(&load, out)?;
    write_outline(&load.project, out)?;
    Ok(load.is_clean())
}

fn write_outline(project: &Project, out: &mut impl Write) -> anyhow::Result<()> {
    for dialogue in project.dialogues() {
        writeln!(out, "{} ({})", dialogue.id(), dialogue.title())?;
        let entry = dialogue.entry_node().map(|node| node.id());
        for node in dialogue.nodes() {
            let marker = if Some(node.id()) == entry { "*" } else { " " };
            writeln!(
                out,
                "{} {} [{}] {}",
                marker,
                node.id(),
                node.kind(),
                node.payload().summary()
            )?;
        }
    }
    Ok(())
}

/// Re-save every dialogue that loaded. Files that failed to load are left alone.
pub fn format(
    store: &impl ProjectStore,
    root: &std::path::Path,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let mut load = load_project(store, root)?;
    report_failures(&load, out)?;

    let mut clean = load.is_clean();
    for dialogue in load.project.dialogues_mut() {
        match store.save_dialogue(dialogue) {
            Ok(()) => writeln!(out, "formatted {}", dialogue.id())?,
            Err(e) => {
                writeln!(out, "save failed: {}", e)?;
                clean = false;
            }
        }
    }
    Ok(clean)
}
