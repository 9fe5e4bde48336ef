use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use corral::backend::TmuxBackend;
use corral::cli::{Cli, Command};
use corral::config::ProjectConfig;
use corral::shell_completion;
use corral::tools::Tools;

fn render_config_human(config: &ProjectConfig, source: &str) -> String {
    let mut output = String::new();
    output.push_str("Wait\n");
    push_kv(&mut output, "warm_up", format!("{}s", config.wait.warm_up_secs));
    push_kv(
        &mut output,
        "poll_interval",
        format!("{}s", config.wait.poll_interval_secs),
    );
    push_kv(
        &mut output,
        "stability_threshold",
        config.wait.stability_threshold,
    );
    push_kv(&mut output, "ceiling", format!("{}s", config.wait.ceiling_secs));
    push_kv(&mut output, "capture_lines", config.wait.capture_lines);
    output.push('\n');

    output.push_str("Agent\n");
    push_kv(&mut output, "program", &config.agent.program);
    push_kv(
        &mut output,
        "skip_permissions_flag",
        &config.agent.skip_permissions_flag,
    );
    output.push('\n');

    output.push_str("Source Path\n");
    push_kv(&mut output, "path", source);
    output
}

fn push_kv(output: &mut String, key: &str, value: impl std::fmt::Display) {
    output.push_str(&format!("  {key:<22} {value}\n"));
}

fn render_config_json(config: &ProjectConfig, source: &str) -> Result<String> {
    let payload = serde_json::json!({
        "wait": {
            "warm_up_secs": config.wait.warm_up_secs,
            "poll_interval_secs": config.wait.poll_interval_secs,
            "stability_threshold": config.wait.stability_threshold,
            "ceiling_secs": config.wait.ceiling_secs,
            "capture_lines": config.wait.capture_lines,
        },
        "agent": {
            "program": &config.agent.program,
            "skip_permissions_flag": &config.agent.skip_permissions_flag,
        },
        "source_path": source,
    });
    serde_json::to_string_pretty(&payload).context("failed to serialize config to JSON")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "corral=warn",
        1 => "corral=info",
        2 => "corral=debug",
        _ => "corral=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cwd =
        std::env::current_dir().context("failed to get current directory (was it deleted?)")?;
    let (config, config_path) = ProjectConfig::load(&cwd)?;
    match config_path {
        Some(ref p) => info!("loaded config from {}", p.display()),
        None => info!("no .corral/config.toml found, using defaults"),
    }

    let backend = TmuxBackend;
    let tools = Tools::new(&backend, &config);

    match cli.command {
        Command::Spawn {
            name,
            prompt,
            dir,
            skip_permissions,
        } => {
            let workdir = dir.unwrap_or(cwd);
            println!("{}", tools.spawn(&name, &prompt, &workdir, skip_permissions));
        }
        Command::Read { names } => {
            println!("{}", tools.read(&names));
        }
        Command::Send { name, text } => {
            println!("{}", tools.send(&name, &text));
        }
        Command::Kill { name } => {
            println!("{}", tools.kill(&name));
        }
        Command::List => {
            println!("{}", tools.list());
        }
        Command::Config { json } => {
            let source = config_path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(defaults — no .corral/config.toml found)".to_string());
            if json {
                println!("{}", render_config_json(&config, &source)?);
            } else {
                print!("{}", render_config_human(&config, &source));
            }
        }
        Command::Completions { shell } => {
            shell_completion::print(shell)?;
        }
    }

    Ok(())
}
