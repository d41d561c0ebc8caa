use std::error::Error;
use std::path::PathBuf;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from a .env file when present; in CI the
    // variables arrive from the job environment instead.
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let scan_json_path = required_env("SCAN_JSON_PATH")?;
    let output_path = required_env("REPORT_OUTPUT_PATH")?;

    tracing::info!(
        scan = %scan_json_path.display(),
        output = %output_path.display(),
        "generating security report"
    );

    let outcome = report_gen::process_report(&scan_json_path, &output_path).await?;

    tracing::info!(
        findings_count = outcome.summary.total,
        report_path = %output_path.display(),
        "report generated successfully"
    );

    Ok(())
}

fn required_env(name: &str) -> Result<PathBuf, Box<dyn Error>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(PathBuf::from(v)),
        _ => Err(format!("missing required environment variable: {name}").into()),
    }
}
