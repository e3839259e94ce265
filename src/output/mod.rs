mod progress;
mod styling;
mod tables;

use std::io;

use crate::providers::azure::ValidationResult;
use crate::runner::{Disposition, Execution};

pub use progress::PollProgress;
pub use styling::bright_red;

use styling::{bright, bright_green, bright_yellow, cyan, dim, magenta_bold};
use tables::{color_coded_level_cell, create_table, cyan_header};

/// Prints the banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🚀 pipeline-runner"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Azure DevOps pipeline provisioning and validation")
    );
}

fn render_validation_results(results: &[ValidationResult]) -> String {
    use std::fmt::Write as _;

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{} {}",
        bright("🧪"),
        bright("Validation Results").underlined()
    );

    if results.is_empty() {
        let _ = write!(output, "  {}", dim("No validation results reported"));
        return output;
    }

    let mut table = create_table();
    table.set_header(cyan_header(&["Result", "Message"]));
    for result in results {
        table.add_row(vec![
            color_coded_level_cell(result.result),
            comfy_table::Cell::new(&result.message),
        ]);
    }
    let _ = write!(output, "{table}");
    output
}

/// Prints the verdict to stderr and, unless the run timed out, its
/// validation results to stdout.
pub fn print_execution(execution: &Execution) {
    let _ = write_execution(execution, &mut io::stderr(), &mut io::stdout());
}

pub fn write_execution(
    execution: &Execution,
    status: &mut impl io::Write,
    results: &mut impl io::Write,
) -> io::Result<()> {
    writeln!(status, "\n{}", render_verdict(execution))?;
    if let Some(url) = execution.outcome.run.web_url() {
        writeln!(status, "  {}", cyan(url))?;
    }

    if execution.outcome.disposition != Disposition::TimedOut {
        writeln!(
            results,
            "{}",
            render_validation_results(&execution.outcome.run.validation_results)
        )?;
    }
    Ok(())
}

fn render_verdict(execution: &Execution) -> String {
    let run = &execution.outcome.run;
    let subject = format!(
        "Run {} of {} in {}",
        run.id, execution.pipeline.name, execution.project.name
    );
    let line = match execution.outcome.disposition {
        Disposition::Succeeded => bright_green(format!("✓ {subject} succeeded")),
        Disposition::Failed => bright_red(format!(
            "✗ {subject} finished with result {}",
            run.result
                .map(|r| format!("{r:?}"))
                .unwrap_or_else(|| "none".to_string())
        )),
        Disposition::TimedOut => bright_yellow(format!(
            "⏱ {subject} timed out after {}s; cancellation requested",
            execution.outcome.elapsed.as_secs()
        )),
    };
    line.to_string()
}
