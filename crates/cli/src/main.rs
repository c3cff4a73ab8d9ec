//! Turnstile CLI - Operator interface for the admission daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9640";

#[derive(Parser)]
#[command(name = "turnstile")]
#[command(about = "Turnstile admission queue CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "TURNSTILE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Register for the entrance queue (anonymous unless --user-id is given)
    Enter {
        /// Stable caller identity; omitted for anonymous traffic
        #[arg(short, long)]
        user_id: Option<String>,
    },

    /// Poll entrance queue position for a token
    EnterStatus {
        /// Token returned by `enter`
        token: String,
    },

    /// Register for the order queue
    Order {
        /// Authenticated user id
        user_id: String,
    },

    /// Poll order queue position (renews the lease while admitted)
    OrderStatus {
        user_id: String,
    },

    /// Release an order slot
    Release {
        user_id: String,
    },

    /// Show queue statistics
    Stats,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn print_status(result: &serde_json::Value) {
    let rank = result["rank"].as_i64().unwrap_or(-1);
    let allowed = result["allowed"].as_bool().unwrap_or(false);
    let message = result["message"].as_str().unwrap_or("");

    if allowed {
        println!("{} {}", "✓ admitted".green().bold(), message);
    } else if rank > 0 {
        println!("{} position {}", "… waiting".yellow().bold(), rank);
    } else {
        println!("{} {}", "✗ not registered".red().bold(), message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Enter { user_id } => {
            let params = match user_id {
                Some(id) => json!({ "user_id": id }),
                None => json!({}),
            };

            let result = call_rpc(&cli.rpc_url, "entrance.register.v1", params).await?;
            let token = result["token"].as_str().unwrap_or_default();

            println!("{}", "✓ Registered for entrance".green().bold());
            println!("  {} {}", "token:".bold(), token);
        }

        Commands::EnterStatus { token } => {
            let params = json!({ "token": token });
            let result = call_rpc(&cli.rpc_url, "entrance.status.v1", params).await?;
            print_status(&result);
        }

        Commands::Order { user_id } => {
            let params = json!({ "user_id": user_id });
            call_rpc(&cli.rpc_url, "order.register.v1", params).await?;

            println!(
                "{}",
                format!("✓ {} registered for order queue", user_id)
                    .green()
                    .bold()
            );
        }

        Commands::OrderStatus { user_id } => {
            let params = json!({ "user_id": user_id });
            let result = call_rpc(&cli.rpc_url, "order.status.v1", params).await?;
            print_status(&result);
        }

        Commands::Release { user_id } => {
            let params = json!({ "user_id": user_id });
            call_rpc(&cli.rpc_url, "order.release.v1", params).await?;

            println!("{}", format!("✓ {} released", user_id).green().bold());
        }

        Commands::Stats => {
            println!("{}", "Queue Statistics".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!(
                        "  {} {} waiting / {} active ({})",
                        "Entrance:".bold(),
                        stats["entrance"]["waiting"],
                        stats["entrance"]["active"],
                        stats["entrance"]["policy"].as_str().unwrap_or("?")
                    );
                    println!(
                        "  {} {} waiting / {} active ({})",
                        "Order:".bold(),
                        stats["order"]["waiting"],
                        stats["order"]["active"],
                        stats["order"]["policy"].as_str().unwrap_or("?")
                    );

                    let active = stats["order"]["active"].as_i64().unwrap_or(0);
                    let capacity = stats["order_capacity"].as_i64().unwrap_or(0);
                    if capacity > 0 && active > capacity {
                        println!(
                            "  {} active {} exceeds capacity {}",
                            "⚠ overshoot:".yellow().bold(),
                            active,
                            capacity
                        );
                    }
                    println!();
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
