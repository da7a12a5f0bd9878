use std::error::Error;

use mr_reviewer::BotSettings;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine: the process environment may already be set.
    let dotenv = dotenvy::dotenv();

    ai_llm_service::telemetry::init("info");
    if let Err(e) = &dotenv {
        info!(reason = %e, "no .env loaded, using process environment");
    }

    let settings = match BotSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        gitlab = %settings.gitlab.host,
        project = %settings.gitlab.project_path,
        model = %settings.assistant.model,
        workspace = %settings.workspace_base.display(),
        "configuration loaded"
    );

    if let Err(e) = api::start(settings).await {
        error!(error = %e, "server failed");
        return Err(e.into());
    }
    Ok(())
}
