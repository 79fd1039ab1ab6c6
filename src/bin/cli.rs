//! Microscope CLI
//!
//! Terminal front-end for a Microscope deployment:
//! - Inspect and resolve dashboard routes
//! - Fetch the data behind a screen
//! - Toggle recording and the auto-load preference

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use microscope::config::{generate_default_config, Config};
use microscope::dashboard::{
    ActiveView, ApplicationShell, BootstrapConfig, FileStorage, HttpRemoteControl,
    RouteParams, RouteTarget, Router, Screen,
};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "microscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Monitoring dashboard for background jobs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Dashboard server URL (overrides the config file)
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Config file (default: first of the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the route table
    Routes,

    /// Resolve a location (full path or fragment) to a screen
    Resolve {
        /// e.g. "/microscope/#/processes/42" or "#/queues"
        location: String,
    },

    /// Build a link to a named route
    Href {
        /// Route name (processes, processes-preview, queues, ...)
        name: String,
        /// Value for the `:id` parameter
        #[arg(long)]
        id: Option<String>,
    },

    /// Show server status
    Status,

    /// Toggle request recording on the server
    ToggleRecording,

    /// Toggle auto-loading of new entries
    AutoLoad,

    /// Fetch the data a screen displays
    Show {
        /// Location to resolve
        location: String,
        /// Page for paginated screens
        #[arg(short, long)]
        page: Option<u32>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default()?,
    };
    if let Some(url) = cli.server_url {
        config.client.server_url = url;
    }
    let server_url = config.client.server_url.trim_end_matches('/').to_string();
    let timeout = Duration::from_secs(config.client.request_timeout_secs);
    let client = reqwest::Client::builder().timeout(timeout).build()?;

    match cli.command {
        Commands::Routes => {
            let router = Router::new(&config.bootstrap())?;
            println!("Base: {}", router.base());
            println!();
            println!("{:<24} {:<20} {:<10} {}", "Path", "Name", "Params", "Target");
            println!("{}", "-".repeat(70));

            for entry in router.routes() {
                let target = match entry.target {
                    RouteTarget::Redirect(to) => format!("-> {}", to),
                    RouteTarget::View(_) => "view".to_string(),
                };
                let params: Vec<&str> = entry.param_names().collect();
                println!(
                    "{:<24} {:<20} {:<10} {}",
                    entry.path,
                    entry.name.unwrap_or("-"),
                    if params.is_empty() { "-".to_string() } else { params.join(",") },
                    target
                );
            }
        }

        Commands::Resolve { location } => {
            let mut router = Router::new(&config.bootstrap())?;
            let view = router.sync(&location)?;
            print_view(view);
        }

        Commands::Href { name, id } => {
            let router = Router::new(&config.bootstrap())?;
            let mut params = RouteParams::default();
            if let Some(id) = id {
                params.insert("id", id);
            }
            println!("{}", router.href(&name, &params)?);
        }

        Commands::Status => {
            let response = client.get(format!("{}/health", server_url)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: Value = resp.json().await?;

                    println!("Microscope v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!("Status:    {}", health["status"].as_str().unwrap_or("unknown"));
                    println!("Jobs:      {}", health["jobs"].as_str().unwrap_or("unknown"));
                    println!(
                        "Recording: {}",
                        if health["recording"].as_bool().unwrap_or(false) { "on" } else { "off" }
                    );
                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!("Uptime:    {}", format_duration(uptime));
                    }
                }
                Ok(resp) => bail!("Server returned error: {}", resp.status()),
                Err(e) => {
                    eprintln!("Cannot connect to Microscope at {}", server_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the server is running:");
                    eprintln!("  cargo run --bin microscope");
                    std::process::exit(1);
                }
            }
        }

        Commands::ToggleRecording => {
            let recording = fetch_recording(&client, &server_url).await;
            let mut bootstrap = config.bootstrap();
            bootstrap.recording = recording;

            let mut shell = mount_shell(&config, bootstrap, &server_url, timeout)?;
            let dispatch = shell.toggle_recording();

            // The process exits right after, so this one is awaited.
            dispatch
                .wait_timeout(timeout)
                .await
                .context("Toggle request failed")?;

            println!(
                "Recording is now {}",
                if shell.state().recording { "on" } else { "off" }
            );
        }

        Commands::AutoLoad => {
            let mut shell = mount_shell(&config, config.bootstrap(), &server_url, timeout)?;
            let enabled = shell.toggle_auto_load_new_entries();
            println!(
                "Auto-load new entries: {} ({})",
                if enabled { "on" } else { "off" },
                shell.storage().path().display()
            );
        }

        Commands::Show { location, page } => {
            let bootstrap = config.bootstrap();
            let mut router = Router::new(&bootstrap)?;
            let view = router.sync(&location)?;

            let Some(path) = view.screen.data_path(&bootstrap.api_path, page) else {
                bail!("Nothing to show for {}", view.full_path());
            };

            let response = client
                .get(format!("{}{}", server_url, path))
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                bail!("Request failed ({}): {}", status, text);
            }

            let mut data: Value = response.json().await?;
            if let Screen::ProcessPreview { id } = &view.screen {
                data = select_worker_pool(data, id);
            }

            println!("{}", view.screen.title());
            println!("{}", serde_json::to_string_pretty(&data)?);
        }

        Commands::Config { output } => {
            let config = generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn mount_shell(
    config: &Config,
    bootstrap: BootstrapConfig,
    server_url: &str,
    timeout: Duration,
) -> anyhow::Result<ApplicationShell<FileStorage, HttpRemoteControl>> {
    let storage_path = config
        .client
        .storage_file
        .clone()
        .unwrap_or_else(FileStorage::default_path);
    let storage = FileStorage::open(storage_path);
    let remote = HttpRemoteControl::new(server_url, &bootstrap, timeout)?;
    Ok(ApplicationShell::mount(bootstrap, storage, remote)?)
}

/// Current server-side recording flag, `false` when the server can't say
async fn fetch_recording(client: &reqwest::Client, server_url: &str) -> bool {
    let health: Option<Value> = match client.get(format!("{}/health", server_url)).send().await {
        Ok(resp) => resp.json().await.ok(),
        Err(_) => None,
    };
    health
        .and_then(|h| h["recording"].as_bool())
        .unwrap_or(false)
}

fn print_view(view: &ActiveView) {
    println!("Screen: {}", view.screen.title());
    println!("Route:  {}", view.name.unwrap_or("(none)"));
    println!("Path:   {}", view.full_path());
    for (key, value) in view.params.iter() {
        println!("  {} = {}", key, value);
    }
    if let Some(resource) = view.screen.resource() {
        println!("Data:   {}", resource);
    }
}

/// Narrow a worker pool listing to the pool with the given id
fn select_worker_pool(data: Value, id: &str) -> Value {
    data["entries"]
        .as_array()
        .and_then(|pools| {
            pools
                .iter()
                .find(|pool| pool["worker_pool_id"].as_str() == Some(id))
                .cloned()
        })
        .unwrap_or(Value::Null)
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
