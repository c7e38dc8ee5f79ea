//! Debate tree visualization.
//!
//! This is a derived view built from the core's output (statements + label
//! map); the reverse id → label lookup lives here, not in the parser.
//!
//! Output formats:
//! - Graphviz DOT
//! - PDF (DOT piped through the external `dot` binary)
//! - JSON (for custom frontends)

use anyhow::{anyhow, Context, Result};
use argmap_kialo::{LabelMap, Statement, StatementId};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

pub const WRAP_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VizFormat {
    Dot,
    Pdf,
    Json,
}

impl VizFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dot" | "gv" => Ok(Self::Dot),
            "pdf" => Ok(Self::Pdf),
            "json" => Ok(Self::Json),
            other => Err(anyhow!(
                "unknown viz format `{other}` (expected dot|pdf|json)"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub label: String,
    pub statement: StatementId,
    /// Display text: `"<label> [<id>]"`, newline, wrapped claim text.
    pub text: String,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TreeView {
    pub nodes: Vec<TreeNode>,
    pub root: Option<usize>,
}

/// Greedy word wrap by character count; words longer than `max_len` get a
/// line of their own.
pub fn wrap_text(text: &str, max_len: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= max_len {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

/// Build the tree of retrieved statements (generated ones are not drawn).
///
/// A statement whose id no longer appears in the label map (its label was
/// reused later in the export) is shown under the empty label.
pub fn build_tree(statements: &[Statement], label_map: &LabelMap) -> TreeView {
    let label_of: HashMap<StatementId, String> = label_map
        .iter()
        .map(|(label, id)| (id, label.to_string()))
        .collect();

    let mut view = TreeView::default();
    // label -> node, in first-seen order; a repeated label replaces the node.
    let mut by_label: Vec<(String, usize)> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();

    for st in statements.iter().filter(|s| !s.is_generated()) {
        let label = label_of.get(&st.id).cloned().unwrap_or_default();
        let text = wrap_text(&st.text.replace('"', "'"), WRAP_WIDTH);

        let node = view.nodes.len();
        view.nodes.push(TreeNode {
            label: label.clone(),
            statement: st.id,
            text: format!("{label} [{}]\n{text}", st.id),
            children: Vec::new(),
        });

        match slot.get(&label) {
            Some(&i) => by_label[i].1 = node,
            None => {
                slot.insert(label.clone(), by_label.len());
                by_label.push((label, node));
            }
        }
    }

    let node_for: HashMap<&str, usize> = by_label
        .iter()
        .map(|(label, node)| (label.as_str(), *node))
        .collect();

    for (label, node) in &by_label {
        match label.rsplit_once('.') {
            Some((parent, _)) => {
                if let Some(&parent_node) = node_for.get(parent) {
                    view.nodes[parent_node].children.push(*node);
                }
            }
            None => view.root = Some(*node),
        }
    }

    view
}

impl TreeView {
    /// Nodes reachable from the root, parents before children.
    pub fn reachable(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n].children.iter().rev().copied());
        }
        out
    }
}

pub fn render_dot(view: &TreeView) -> String {
    fn dot_escape(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }

    let mut out = String::new();
    out.push_str("digraph tree {\n");
    out.push_str("  node [shape=box, fontname=\"Helvetica\"];\n");
    out.push_str("  edge [fontname=\"Helvetica\"];\n\n");

    let reachable = view.reachable();
    for &n in &reachable {
        out.push_str(&format!(
            "  n{n} [label=\"{}\"];\n",
            dot_escape(&view.nodes[n].text)
        ));
    }
    if !reachable.is_empty() {
        out.push('\n');
    }
    for &n in &reachable {
        for child in &view.nodes[n].children {
            out.push_str(&format!("  n{n} -> n{child};\n"));
        }
    }

    out.push_str("}\n");
    out
}

pub fn render_json(view: &TreeView) -> Result<String> {
    Ok(serde_json::to_string_pretty(view)?)
}

/// Render `dot_source` to PDF with Graphviz. The DOT file is kept next to the
/// PDF for inspection.
pub fn render_pdf(dot_source: &str, out: &Path) -> Result<()> {
    let dot_path = out.with_extension("dot");
    std::fs::write(&dot_path, dot_source)
        .with_context(|| format!("writing {}", dot_path.display()))?;

    let status = Command::new("dot")
        .arg("-Tpdf")
        .arg("-Gdpi=150")
        .arg(&dot_path)
        .arg("-o")
        .arg(out)
        .status()
        .map_err(|e| anyhow!("failed to run Graphviz `dot` (is it installed?): {e}"))?;
    if !status.success() {
        return Err(anyhow!("`dot` exited with {status}"));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use argmap_kialo::{parse_lines, RuleNegator, SourceName};

    fn view(lines: &[&str]) -> TreeView {
        let parsed = parse_lines(lines, SourceName::kialo(1), "", &RuleNegator).unwrap();
        build_tree(&parsed.document.statements, &parsed.label_map)
    }

    #[test]
    fn wraps_at_word_boundaries() {
        assert_eq!(wrap_text("aaa bbb ccc", 7), "aaa bbb\nccc");
        assert_eq!(wrap_text("a-very-long-word x", 4), "a-very-long-word\nx");
        assert_eq!(wrap_text("", 10), "");
    }

    #[test]
    fn wrap_counts_characters_not_bytes() {
        // 3 + 1 + 3 chars fit in 7 even though "été" is 5 bytes.
        assert_eq!(wrap_text("été été", 7), "été été");
        assert_eq!(wrap_text("été été x", 7), "été été\nx");
    }

    #[test]
    fn tree_links_children_to_parents_and_skips_generated() {
        let v = view(&[
            "", "T", "1.", "", "Thesis: Root is \"quoted\".", "1.1.", "", "Pro: Child one.",
            "1.2.", "", "Con: Child two.",
        ]);
        assert_eq!(v.nodes.len(), 3);
        let root = v.root.expect("root");
        assert_eq!(v.nodes[root].label, "1");
        assert_eq!(v.nodes[root].children, vec![1, 2]);
        assert!(v.nodes[root].text.starts_with("1 [st-1]\n"));
        assert!(v.nodes[root].text.contains("'quoted'"));
    }

    #[test]
    fn dot_output_contains_nodes_and_edges() {
        let v = view(&["", "T", "1.", "", "Thesis: Root.", "1.1.", "", "Pro: Child."]);
        let dot = render_dot(&v);
        assert!(dot.starts_with("digraph tree {"));
        assert!(dot.contains("n0 [label=\"1 [st-1]\\nRoot.\"];"));
        assert!(dot.contains("n0 -> n1;"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn detached_subtrees_are_not_drawn() {
        let v = view(&["", "T", "1.", "", "Thesis: Root.", "2.1.", "", "Pro: Lost."]);
        assert_eq!(v.reachable(), vec![0]);
        assert!(!render_dot(&v).contains("Lost"));
    }

    #[test]
    fn format_parsing() {
        assert_eq!(VizFormat::parse("DOT").unwrap(), VizFormat::Dot);
        assert_eq!(VizFormat::parse("pdf").unwrap(), VizFormat::Pdf);
        assert!(VizFormat::parse("svg").is_err());
    }
}
