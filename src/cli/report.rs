//! Human-readable session output

use colored::Colorize;

use crate::common::{Error, Result};
use crate::session::{RunResult, SessionHost, SuiteResult};

/// Prints reports as a colored tree instead of protocol messages
#[derive(Debug, Default)]
pub struct PrettyHost;

impl SessionHost for PrettyHost {
    fn session_started(&mut self) -> Result<()> {
        println!("{}", "Running Jasmine session...".cyan());
        Ok(())
    }

    fn session_finished(&mut self, result: RunResult) -> Result<()> {
        print!("{}", render(&result));
        Ok(())
    }

    fn session_failed(&mut self, error: Error) -> Result<()> {
        println!("\n{} {}", "✗".red().bold(), "Session failed".red().bold());
        println!("  {}", error);
        Ok(())
    }
}

/// Render a run result as an indented tree with a summary line
pub fn render(result: &RunResult) -> String {
    let mut out = String::new();
    render_suite(&result.test_results, 0, &mut out);

    let tally = result.test_results.tally();
    let verdict = if result.passed {
        "Passed".green().bold()
    } else {
        "Failed".red().bold()
    };
    out.push_str(&format!(
        "\n{} {} passed, {} failed, {} skipped ({} total)\n",
        verdict,
        tally.passed,
        tally.failed,
        tally.skipped,
        tally.total()
    ));
    out
}

fn render_suite(suite: &SuiteResult, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let inner = match &suite.name {
        Some(name) => {
            out.push_str(&format!("{}{}\n", indent, name.bold()));
            depth + 1
        }
        None => depth,
    };
    let test_indent = "  ".repeat(inner);

    for test in &suite.tests {
        if test.passed {
            out.push_str(&format!("{}{} {}\n", test_indent, "✓".green(), test.name));
        } else if test.skipped {
            out.push_str(&format!("{}{} {}\n", test_indent, "○".yellow(), test.name.dimmed()));
        } else {
            out.push_str(&format!("{}{} {}\n", test_indent, "✗".red(), test.name));
            if let Some(error) = &test.error {
                for line in error.message.lines() {
                    out.push_str(&format!("{}    {}\n", test_indent, line.dimmed()));
                }
            }
        }
    }

    for child in &suite.suites {
        render_suite(child, inner, out);
    }
}
