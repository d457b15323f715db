use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use crate::models::graph::{Edge, Graph, Node, NodeKind};
use crate::models::options::OutputFormat;
use crate::utils::error::{DiagramError, Result};

/// Render a graph as text in one of the text formats
pub fn render(graph: &Graph, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Mermaid => render_mermaid(graph),
        OutputFormat::Dot | OutputFormat::Png => render_dot(graph),
        OutputFormat::Terminal => render_terminal(graph),
    }
}

fn escape_mermaid_label(label: &str) -> String {
    label.replace('`', "").replace('\n', " ").replace('"', "\\\"")
}

/// Mermaid `flowchart TD` with nodes aliased `n1..nN` in sorted ID order
pub fn render_mermaid(graph: &Graph) -> Result<String> {
    let aliases: HashMap<&str, String> = graph
        .sorted_node_ids()
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id, format!("n{}", i + 1)))
        .collect();

    let mut out = String::from("flowchart TD\n");
    for (id, node) in &graph.nodes {
        let alias = &aliases[id.as_str()];
        let _ = writeln!(out, "    {alias}[\"{}\"]", escape_mermaid_label(&node.label));
    }
    for edge in graph.sorted_edges() {
        let (Some(from), Some(to)) = (aliases.get(edge.from.as_str()), aliases.get(edge.to.as_str())) else {
            return Err(DiagramError::runtime("graph edge references unknown node"));
        };
        let _ = writeln!(out, "    {from} --> {to}");
    }
    Ok(out.trim().to_string())
}

fn quote_dot(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', " ");
    format!("\"{escaped}\"")
}

fn dot_style(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Target => "shape=box",
        NodeKind::ExternalProduct => "shape=ellipse,style=dashed",
    }
}

/// Graphviz `digraph` laid out left to right
pub fn render_dot(graph: &Graph) -> Result<String> {
    let mut out = String::from("digraph dependencies {\n  rankdir=LR;\n");
    for node in graph.nodes.values() {
        let _ = writeln!(
            out,
            "  {} [label={},{}];",
            quote_dot(&node.id),
            quote_dot(&node.label),
            dot_style(node.kind)
        );
    }
    for edge in graph.sorted_edges() {
        if graph.node(&edge.from).is_none() {
            return Err(DiagramError::runtime("graph edge references unknown from node"));
        }
        if graph.node(&edge.to).is_none() {
            return Err(DiagramError::runtime("graph edge references unknown to node"));
        }
        let _ = writeln!(out, "  {} -> {};", quote_dot(&edge.from), quote_dot(&edge.to));
    }
    out.push('}');
    Ok(out.trim().to_string())
}

struct Child<'a> {
    edge: Edge,
    node: &'a Node,
}

fn terminal_label(label: &str) -> String {
    label.replace('\n', " ")
}

fn by_label_then_id(a: &Node, b: &Node) -> std::cmp::Ordering {
    a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id))
}

/// ASCII forest rooted at targets nothing else depends on.
///
/// Targets only reachable through cycles become extra roots. A node already on
/// the current path is printed once more with `(*)` and not expanded.
pub fn render_terminal(graph: &Graph) -> Result<String> {
    let mut targets: Vec<&Node> = graph
        .nodes
        .values()
        .filter(|node| node.kind == NodeKind::Target)
        .collect();
    targets.sort_by(|a, b| by_label_then_id(a, b));

    let mut incoming: HashMap<&str, usize> = targets.iter().map(|n| (n.id.as_str(), 0)).collect();
    let mut target_children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut children: HashMap<&str, Vec<Child<'_>>> = HashMap::new();

    for edge in graph.sorted_edges() {
        let Some(from) = graph.node(&edge.from) else {
            return Err(DiagramError::runtime("graph edge references unknown from node"));
        };
        let Some(to) = graph.node(&edge.to) else {
            return Err(DiagramError::runtime("graph edge references unknown to node"));
        };
        if from.kind == NodeKind::Target && to.kind == NodeKind::Target {
            if let Some(count) = incoming.get_mut(to.id.as_str()) {
                *count += 1;
            }
            target_children.entry(from.id.as_str()).or_default().push(to.id.as_str());
        }
        children.entry(from.id.as_str()).or_default().push(Child { edge, node: to });
    }
    for list in children.values_mut() {
        list.sort_by(|a, b| {
            by_label_then_id(a.node, b.node).then_with(|| a.edge.kind.as_str().cmp(b.edge.kind.as_str()))
        });
    }

    let mut roots: Vec<&str> = targets
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| incoming.get(id).copied().unwrap_or_default() == 0)
        .collect();

    let mut covered = HashSet::new();
    for root in &roots {
        mark_covered(*root, &target_children, &mut covered);
    }
    for node in &targets {
        let id = node.id.as_str();
        if !covered.contains(id) {
            roots.push(id);
            mark_covered(id, &target_children, &mut covered);
        }
    }

    if roots.is_empty() {
        return Ok("(empty)".to_string());
    }

    let mut out = String::new();
    for (i, root) in roots.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        if let Some(node) = graph.node(root) {
            out.push_str(&terminal_label(&node.label));
        }
        let mut on_path = HashSet::from([*root]);
        write_children(&mut out, &children, &mut on_path, root, "");
    }
    Ok(out)
}

fn mark_covered<'a>(id: &'a str, target_children: &HashMap<&'a str, Vec<&'a str>>, covered: &mut HashSet<&'a str>) {
    if !covered.insert(id) {
        return;
    }
    if let Some(next) = target_children.get(id) {
        for child in next {
            mark_covered(*child, target_children, covered);
        }
    }
}

fn write_children<'a>(
    out: &mut String,
    children: &HashMap<&str, Vec<Child<'a>>>,
    on_path: &mut HashSet<&'a str>,
    node_id: &str,
    prefix: &str,
) {
    let Some(list) = children.get(node_id) else {
        return;
    };
    for (i, child) in list.iter().enumerate() {
        let last = i + 1 == list.len();
        let (branch, indent) = if last { ("\\-- ", "    ") } else { ("|-- ", "|   ") };
        let label = terminal_label(&child.node.label);
        let id = child.node.id.as_str();

        if on_path.contains(id) {
            let _ = write!(out, "\n{prefix}{branch}{label} (*)");
            continue;
        }
        let _ = write!(out, "\n{prefix}{branch}{label}");
        on_path.insert(id);
        write_children(out, children, on_path, id, &format!("{prefix}{indent}"));
        on_path.remove(id);
    }
}
