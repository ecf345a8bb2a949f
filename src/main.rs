use anyhow::Result;
use clap::Parser;
use colored::*;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use sigil::ai;
use sigil::config;
use sigil::context;
use sigil::sanitize;

#[derive(Parser)]
#[command(
    name = "sigil",
    version,
    about = "Turn a natural-language description into a shell command"
)]
struct Cli {
    /// What the command should do, in plain language
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
    description: Vec<String>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{}: {}", "Error".red().bold(), err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let description = cli.description.join(" ");
    let description = description.trim();
    if description.is_empty() {
        anyhow::bail!("no command description provided");
    }

    let config_path = config::get_config_path()?;
    if !config_path.exists() {
        config::Config::create_default(&config_path)?;
        println!("Created default config file at {:?}", config_path);
        println!(
            "Add an API key to the config file (or set ANTHROPIC_API_KEY / OPENAI_API_KEY) and run again."
        );
        return Ok(());
    }
    let config = config::Config::load(&config_path)?;

    let env_context = context::EnvironmentContext::gather().render();
    let listing = context::directory_listing();
    let history_block = context::build_history_block(&config.context);
    let system_prompt = ai::build_system_prompt(&env_context, &listing, &history_block);

    let raw = ai::generate_command(description, &system_prompt, &config).await?;
    let command = sanitize::sanitize(&raw);
    if command.is_empty() {
        anyhow::bail!("model response did not contain a usable command");
    }

    println!("{}", command);
    Ok(())
}
