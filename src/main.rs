mod telemetry;

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine; variables may come from the environment.
    let dotenv = dotenvy::dotenv();

    if let Err(e) = telemetry::init() {
        eprintln!("failed to install tracing subscriber: {e}");
        return ExitCode::FAILURE;
    }

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), ".env loaded"),
        Err(e) if e.not_found() => tracing::debug!("no .env file"),
        Err(e) => {
            tracing::error!(error = %e, "invalid .env file");
            return ExitCode::FAILURE;
        }
    }

    match api::start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            ExitCode::FAILURE
        }
    }
}
