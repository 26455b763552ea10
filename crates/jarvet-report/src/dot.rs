use jarvet_core::pipeline::AnalysisReport;

/// Generate a GraphViz DOT digraph of the archive dependency relation.
/// Edges that participate in a cycle are highlighted.
pub fn generate_graph(report: &AnalysisReport) -> String {
    let mut out = String::new();
    out.push_str("digraph archives {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, style=filled, fillcolor=white];\n\n");

    for archive in report.depends_on.keys() {
        let id = sanitize_dot_id(archive);
        if report.liveness.unused.contains(archive) {
            out.push_str(&format!(
                "  {id} [label=\"{archive}\", fillcolor=\"#fff3e0\"];\n"
            ));
        } else {
            out.push_str(&format!("  {id} [label=\"{archive}\"];\n"));
        }
    }
    out.push('\n');

    for (from, deps) in &report.depends_on {
        let from_id = sanitize_dot_id(from);
        for to in deps {
            let to_id = sanitize_dot_id(to);
            let in_cycle = report
                .circular
                .get(from)
                .is_some_and(|partners| partners.contains(to));
            if in_cycle {
                out.push_str(&format!("  {from_id} -> {to_id} [color=red, penwidth=2];\n"));
            } else {
                out.push_str(&format!("  {from_id} -> {to_id};\n"));
            }
        }
    }

    out.push_str("}\n");
    out
}

fn sanitize_dot_id(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("n_{sanitized}")
}
