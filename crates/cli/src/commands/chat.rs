//! `anxiousroid chat` — One chat turn from the terminal.

use anxiousroid_agent::ChatOutcome;
use anxiousroid_config::AppConfig;

pub async fn run(
    config: AppConfig,
    user_id: &str,
    platform: &str,
    message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    // Check for API key early — give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set CLAUDE_API_KEY (or ANXIOUSROID_API_KEY), or add api_key to");
        eprintln!("  {}", anxiousroid_config::DEFAULT_CONFIG_FILE);
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let pipeline = anxiousroid_gateway::build_pipeline(&config)?;

    match pipeline.respond(user_id, platform, message).await {
        ChatOutcome::Ok { reply, usage, .. } => {
            println!("{reply}");
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                elapsed_ms = usage.elapsed_ms,
                "Usage"
            );
            Ok(())
        }
        ChatOutcome::ProviderError { code, message } => {
            eprintln!("  ERROR [{code}]: {message}");
            Err(format!("chat failed: {code}").into())
        }
    }
}
