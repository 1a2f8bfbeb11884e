//! Display formatting for CLI output
//!
//! Diagnostics go to stderr, states and schemas to stdout so the output
//! can be piped into the next command.

use console::style;
use crdform_core::{Diagnostic, Diagnostics, Severity};
use crdform_kube::{ResourceResponse, ResourceTypeInfo};
use serde::Serialize;

use crate::error::{CliError, Result};

/// Print every diagnostic to stderr
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        eprintln!("{}", format_diagnostic(diagnostic));
    }
}

fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let header = match diagnostic.severity {
        Severity::Error => format!(
            "{} {}",
            style("✗").red().bold(),
            style(&diagnostic.summary).red().bold()
        ),
        Severity::Warning => format!(
            "{} {}",
            style("⚠").yellow(),
            style(&diagnostic.summary).yellow()
        ),
    };

    let mut out = header;
    if let Some(attribute) = &diagnostic.attribute {
        out.push_str(&format!(" {}", style(format!("at {}", attribute)).dim()));
    }
    for line in diagnostic.detail.lines() {
        out.push_str(&format!("\n    {}", line));
    }
    out
}

/// Pretty-print a value as JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::internal(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Report a lifecycle response: state on stdout, diagnostics on stderr
pub fn finish(operation: &str, response: &ResourceResponse) -> Result<()> {
    print_diagnostics(&response.diagnostics);

    if let Some(state) = &response.state {
        print_json(state)?;
    }

    let errors = response.diagnostics.errors().count();
    if errors > 0 {
        return Err(CliError::Operation {
            operation: operation.to_string(),
            errors,
        });
    }
    Ok(())
}

/// Aligned table of resource types
pub fn print_resource_types(types: &[ResourceTypeInfo]) {
    if types.is_empty() {
        println!("No resource types registered");
        return;
    }

    let width = types
        .iter()
        .map(|t| t.type_name.len())
        .max()
        .unwrap_or(0)
        .max("TYPE".len());

    println!(
        "{:<width$}  {:<32}  {:<24}  {}",
        style("TYPE").bold(),
        style("API VERSION").bold(),
        style("KIND").bold(),
        style("SCOPE").bold(),
        width = width
    );
    for info in types {
        let line = format!(
            "{:<width$}  {:<32}  {:<24}  {}",
            info.type_name,
            info.api_version,
            info.kind,
            info.scope,
            width = width
        );
        if info.deprecation.is_some() {
            println!("{} {}", line, style("(deprecated)").yellow());
        } else {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_diagnostic() {
        console::set_colors_enabled(false);
        let diagnostic = Diagnostic::error("Missing required attribute", "The attribute is required.")
            .at("spec.secret_name");
        insta::assert_snapshot!(format_diagnostic(&diagnostic), @r###"
        ✗ Missing required attribute at spec.secret_name
            The attribute is required.
        "###);
    }

    #[test]
    fn test_finish_with_errors() {
        let response = ResourceResponse::error("Error from Kubernetes API", "forbidden");
        let err = finish("Create", &response).unwrap_err();
        assert_eq!(err.to_string(), "Create failed with 1 error(s)");
    }
}
