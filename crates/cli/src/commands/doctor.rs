use std::fs;
use std::path::Path;

use dealcraft_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_llm_credentials(&config));
            checks.push(check_output_dir(&config.documents.output_dir));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["llm_credentials", "output_dir_writable"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_llm_credentials(config: &AppConfig) -> DoctorCheck {
    let provider = config.llm.provider;
    let has_key =
        config.llm.api_key.as_ref().is_some_and(|key| !key.expose_secret().trim().is_empty());

    let details = match (provider.requires_api_key(), has_key) {
        (true, true) => format!("api key present for `{}`", provider.as_str()),
        (true, false) => format!("`{}` requires llm.api_key", provider.as_str()),
        (false, _) => format!("`{}` runs without an api key", provider.as_str()),
    };
    let ready = !provider.requires_api_key() || has_key;

    DoctorCheck {
        name: "llm_credentials",
        status: if ready { CheckStatus::Pass } else { CheckStatus::Fail },
        details,
    }
}

fn check_output_dir(output_dir: &Path) -> DoctorCheck {
    let probe = output_dir.join(".dealcraft-doctor-probe");
    let result = fs::create_dir_all(output_dir)
        .and_then(|()| fs::write(&probe, b"probe"))
        .and_then(|()| fs::remove_file(&probe));

    match result {
        Ok(()) => DoctorCheck {
            name: "output_dir_writable",
            status: CheckStatus::Pass,
            details: format!("`{}` is writable", output_dir.display()),
        },
        Err(error) => DoctorCheck {
            name: "output_dir_writable",
            status: CheckStatus::Fail,
            details: format!("cannot write to `{}`: {error}", output_dir.display()),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
