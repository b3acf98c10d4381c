pub mod config;
pub mod doctor;
pub mod start;

use serde::Serialize;

/// Exit code for a configuration that fails to load or validate.
pub const EXIT_CONFIG_INVALID: u8 = 2;

/// Printed output of a subcommand plus the process exit code.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

impl CommandResult {
    pub fn text(output: String) -> Self {
        Self { exit_code: 0, output }
    }

    /// Serializes a report as one JSON line.
    pub fn json<T: Serialize>(exit_code: u8, report: &T) -> Self {
        let output = serde_json::to_string(report).unwrap_or_else(|error| {
            serde_json::json!({
                "status": "error",
                "error_class": "serialization",
                "message": error.to_string(),
            })
            .to_string()
        });
        Self { exit_code, output }
    }
}
