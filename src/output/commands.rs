//! GitHub Actions workflow commands written to stdout.
//!
//! See <https://docs.github.com/en/actions/using-workflows/workflow-commands-for-github-actions>.

use std::io::{self, Write};

/// Escape a command message.
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a command property value.
pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// Render a workflow command line such as `::error::message`.
pub fn format_command(command: &str, properties: &[(&str, &str)], message: &str) -> String {
    let mut line = format!("::{command}");
    if !properties.is_empty() {
        let props: Vec<String> = properties
            .iter()
            .map(|(k, v)| format!("{k}={}", escape_property(v)))
            .collect();
        line.push(' ');
        line.push_str(&props.join(","));
    }
    line.push_str("::");
    line.push_str(&escape_data(message));
    line
}

pub fn debug(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{}", format_command("debug", &[], message))
}

pub fn error(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{}", format_command("error", &[], message))
}
