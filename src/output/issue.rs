//! Pre-filled issue reports.

use super::links::LinkResolver;
use crate::parser::schema::Trace;

impl LinkResolver {
    /// Markdown backtrace, one bullet per frame entry
    pub fn format_markdown(&self, trace: &Trace) -> String {
        let mut markdown = String::from("stack backtrace:\n");

        for (_, _, frame) in trace.entries() {
            match self.link_for(&frame.full_path, frame.line) {
                Some(link) => {
                    markdown.push_str(&format!("   - [`{}`]({})\n", frame.demangled_name, link))
                }
                None => markdown.push_str(&format!("   - `{}`\n", frame.demangled_name)),
            }
        }

        markdown
    }

    /// Issue form URL with the backtrace pre-filled
    ///
    /// **Public** - attached to every symbolicated response
    ///
    /// # Arguments
    /// * `trace` - symbolicated trace
    /// * `version` / `target` - the request's build identity
    /// * `encoded_trace` - the original encoded trace string
    /// * `view_url` - where this trace can be viewed
    pub fn build_issue_url(
        &self,
        trace: &Trace,
        version: &str,
        target: &str,
        encoded_trace: &str,
        view_url: &str,
    ) -> String {
        let body = format!(
            "Deno {} on {}.\n\nA panic occurred in Deno.\n\n{}\nEncoded trace: `{}`\n\n<sub>View trace: [here]({})</sub>",
            version,
            target,
            self.format_markdown(trace),
            encoded_trace,
            view_url
        );

        format!(
            "{}?body={}&labels=bug",
            self.issue_tracker,
            urlencoding::encode(&body)
        )
    }
}
