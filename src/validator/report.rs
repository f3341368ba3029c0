use std::fmt;

use serde::Serialize;

#[cfg(feature = "colorized_output")]
use console::style;

const TITLE: &str = "Feature File Validation Report";

/// Validation check result status
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum CheckStatus {
    /// Check passed
    Ok,
    /// Check passed with warnings
    Warning(String),
    /// Check failed
    Failed(String),
}

impl CheckStatus {
    fn symbol(&self) -> &'static str {
        match self {
            CheckStatus::Ok => "✓",
            CheckStatus::Warning(_) => "⚠",
            CheckStatus::Failed(_) => "✗",
        }
    }

    fn message(&self) -> Option<(&'static str, &str)> {
        match self {
            CheckStatus::Ok => None,
            CheckStatus::Warning(msg) => Some(("WARNING", msg.as_str())),
            CheckStatus::Failed(msg) => Some(("FAILED", msg.as_str())),
        }
    }
}

/// Individual validation check result
#[derive(Debug, Clone, Serialize)]
pub struct ValidationCheck {
    /// Name of the validation check
    pub name: String,
    /// Result status of the check
    #[serde(flatten)]
    pub status: CheckStatus,
}

impl ValidationCheck {
    pub(crate) fn ok(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Ok,
        }
    }

    pub(crate) fn warning(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Warning(message.into()),
        }
    }

    pub(crate) fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Failed(message.into()),
        }
    }
}

/// Check counts of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// Checks that passed
    pub passed: usize,
    /// Checks that passed with a warning
    pub warnings: usize,
    /// Checks that failed
    pub failed: usize,
}

impl ReportSummary {
    fn verdict(&self) -> &'static str {
        if self.failed > 0 {
            "Validation FAILED"
        } else if self.warnings > 0 {
            "Validation PASSED with warnings"
        } else {
            "Validation PASSED"
        }
    }
}

/// Complete validation report for a feature file
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Path of the file that was validated
    pub file_path: String,
    /// List of individual validation check results
    pub checks: Vec<ValidationCheck>,
}

impl ValidationReport {
    /// Create a new validation report for the given file path
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            checks: Vec::new(),
        }
    }

    /// Add a validation check result to the report
    pub fn add_check(&mut self, check: ValidationCheck) {
        self.checks.push(check);
    }

    /// Count checks by outcome
    pub fn summary(&self) -> ReportSummary {
        self.checks
            .iter()
            .fold(ReportSummary::default(), |mut summary, check| {
                match check.status {
                    CheckStatus::Ok => summary.passed += 1,
                    CheckStatus::Warning(_) => summary.warnings += 1,
                    CheckStatus::Failed(_) => summary.failed += 1,
                }
                summary
            })
    }

    /// Check if any validation checks failed
    pub fn has_failures(&self) -> bool {
        self.summary().failed > 0
    }

    /// Check if any validation checks produced warnings
    pub fn has_warnings(&self) -> bool {
        self.summary().warnings > 0
    }

    /// Format the report with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            let mut output = String::new();
            output.push_str(&format!("{}\n", style(TITLE).bold().cyan()));
            output.push_str(&format!("{}\n", style("=".repeat(TITLE.len())).cyan()));
            output.push_str(&format!("{}: {}\n\n", style("File").bold(), self.file_path));

            for check in &self.checks {
                let name = match check.status {
                    CheckStatus::Ok => style(check.name.as_str()).green(),
                    CheckStatus::Warning(_) => style(check.name.as_str()).yellow(),
                    CheckStatus::Failed(_) => style(check.name.as_str()).red(),
                };
                output.push_str(&format!("[{}] {}", check.status.symbol(), name));
                match (&check.status, check.status.message()) {
                    (CheckStatus::Warning(_), Some((label, msg))) => {
                        output.push_str(&format!(" - {}: {}\n", style(label).yellow().bold(), msg));
                    }
                    (_, Some((label, msg))) => {
                        output.push_str(&format!(" - {}: {}\n", style(label).red().bold(), msg));
                    }
                    (_, None) => output.push('\n'),
                }
            }

            let summary = self.summary();
            output.push_str(&format!(
                "\n{}: {} passed, {} warnings, {} failed\n\n",
                style("Summary").bold(),
                style(summary.passed).green(),
                style(summary.warnings).yellow(),
                style(summary.failed).red()
            ));
            let verdict = style(summary.verdict()).bold();
            let verdict = if summary.failed > 0 {
                verdict.red()
            } else if summary.warnings > 0 {
                verdict.yellow()
            } else {
                verdict.green()
            };
            output.push_str(&format!("{}\n", verdict));
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", TITLE)?;
        writeln!(f, "{}", "=".repeat(TITLE.len()))?;
        writeln!(f, "File: {}", self.file_path)?;
        writeln!(f)?;

        for check in &self.checks {
            write!(f, "[{}] {}", check.status.symbol(), check.name)?;
            match check.status.message() {
                None => writeln!(f)?,
                Some((label, msg)) => writeln!(f, " - {}: {}", label, msg)?,
            }
        }

        let summary = self.summary();
        writeln!(f)?;
        writeln!(
            f,
            "Summary: {} passed, {} warnings, {} failed",
            summary.passed, summary.warnings, summary.failed
        )?;
        writeln!(f)?;
        writeln!(f, "{}", summary.verdict())
    }
}
