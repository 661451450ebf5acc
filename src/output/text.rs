//! Plain-text stack trace rendering for the terminal.

use super::links::LinkResolver;
use crate::parser::schema::Trace;

/// Render a trace, one block per frame entry
///
/// Each entry is numbered `group.index`, followed by the language tag when
/// known, then the source location and its link on an indented line.
pub fn render_text(trace: &Trace, links: &LinkResolver) -> String {
    let mut out = String::from("Stacktrace\n");

    if trace.is_empty() {
        out.push_str("  (no frames)\n");
        return out;
    }

    for (group, index, frame) in trace.entries() {
        out.push_str(&format!("{:>4}.{} {}", group, index, frame.demangled_name));
        if !frame.language.is_empty() {
            out.push_str(&format!(" [{}]", frame.language));
        }
        out.push('\n');

        out.push_str(&format!("         {}:{}", frame.full_path, frame.line));
        if let Some(link) = links.link_for(&frame.full_path, frame.line) {
            out.push_str(&format!("\n         {}", link));
        }
        out.push('\n');
    }

    out
}
