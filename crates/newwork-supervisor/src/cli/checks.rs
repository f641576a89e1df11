use super::commands::OutputFormat;
use super::utils::{print_json, status_line};
use newwork_supervisor::{HealthClient, StateStore, SupervisorConfig};
use newwork_types::{NewworkError, NewworkResult};
use serde::Serialize;

#[derive(Serialize)]
struct CheckResult {
    name: &'static str,
    ok: bool,
    detail: String,
}

pub async fn run_checks(config: &SupervisorConfig, full: bool, format: OutputFormat) -> NewworkResult<()> {
    let mut results = Vec::new();

    let url = config.backend.health_url(&config.health.path);
    let client = HealthClient::new(url.clone(), config.health.timeout())?;
    results.push(match client.probe().await {
        Ok(latency) => CheckResult {
            name: "backend health",
            ok: true,
            detail: format!("{} in {}ms", url, latency.as_millis()),
        },
        Err(e) => CheckResult {
            name: "backend health",
            ok: false,
            detail: e.to_string(),
        },
    });

    if full {
        results.push(CheckResult {
            name: "configuration",
            ok: config.validate().is_ok(),
            detail: config
                .validate()
                .err()
                .map(|e| e.to_string())
                .unwrap_or_default(),
        });

        let program = &config.backend.program;
        let resolvable = program.components().count() == 1 || program.exists();
        results.push(CheckResult {
            name: "backend program",
            ok: resolvable,
            detail: program.display().to_string(),
        });

        results.push(match StateStore::open(config.resolved_storage()) {
            Ok(store) => CheckResult {
                name: "state store",
                ok: true,
                detail: format!(
                    "{} (saved state: {})",
                    config.state_db_path().display(),
                    if store.load_app_state().ok().flatten().is_some() { "yes" } else { "no" }
                ),
            },
            Err(e) => CheckResult {
                name: "state store",
                ok: false,
                detail: e.to_string(),
            },
        });
    }

    let failed = results.iter().filter(|r| !r.ok).count();

    match format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Text => {
            for result in &results {
                status_line(format, result.name, result.ok, &result.detail);
            }
            println!();
            println!("{} passed, {} failed", results.len() - failed, failed);
        }
    }

    if failed > 0 {
        return Err(NewworkError::HealthCheck(format!("{} check(s) failed", failed)));
    }
    Ok(())
}
