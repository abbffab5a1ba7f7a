//! Replay a moderation script and print the final snapshot
//!
//! Usage: `mofa-moderator <script.yaml>`

use anyhow::{Context, Result};
use mofa_moderator::{replay, Advisor, ModeratorConfig, ReplayScript};
use std::fs;

fn main() -> Result<()> {
    let (config, source) = ModeratorConfig::load().context("Failed to load moderator config")?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();
    source.log();

    let path = std::env::args()
        .nth(1)
        .context("Usage: mofa-moderator <script.yaml>")?;
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read script {}", path))?;
    let script = ReplayScript::from_yaml_str(&content)
        .with_context(|| format!("Invalid script {}", path))?;

    let speakers = if script.speakers.is_empty() {
        config.speakers.clone()
    } else {
        script.speakers.clone()
    };
    log::info!(
        "Replaying {} events for {} speakers from {}",
        script.event_count(),
        speakers.len(),
        path
    );

    let mut engine = config.build_engine(&speakers);
    let advisor = Advisor::from_config(&config.advisory);
    let outcome = replay(&mut engine, &script, &advisor);

    for transition in &outcome.transitions {
        println!(
            "[t={:>6.1}s] {} -> {}: {}",
            transition.at_seconds, transition.from, transition.to, transition.advice
        );
    }
    println!("{}", serde_json::to_string_pretty(&outcome.snapshot)?);

    Ok(())
}
