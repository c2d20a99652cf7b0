// ABOUTME: Entry point for the dirigent CLI application.
// ABOUTME: Parses arguments and dispatches broker operations against a director.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use dirigent::broker::Broker;
use dirigent::config::BrokerConfig;
use dirigent::director::{DirectorClient, HttpDirector};
use dirigent::error::Result;
use dirigent::exec::ProcessExecutor;
use dirigent::types::{BindingId, InstanceId, ParameterSet, PlanId, TaskId};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => BrokerConfig::load(path)?,
        None => {
            let cwd = env::current_dir().expect("Failed to get current directory");
            BrokerConfig::discover(&cwd)?
        }
    };

    let director = HttpDirector::new(&config.director)?;

    match cli.command {
        Commands::Catalog => {
            let broker = Broker::connect(config, director, ProcessExecutor).await?;
            print_json(&broker.catalog());
            Ok(())
        }
        Commands::Provision {
            instance_id,
            plan,
            params,
        } => {
            let caller_params: ParameterSet = match params.as_deref() {
                Some(raw) => {
                    let map: serde_json::Map<String, serde_json::Value> =
                        serde_json::from_str(raw)?;
                    map.into()
                }
                None => ParameterSet::new(),
            };

            let broker = Broker::connect(config, director, ProcessExecutor).await?;
            let task = broker
                .provision(
                    &InstanceId::new(instance_id)?,
                    &PlanId::new(plan)?,
                    caller_params,
                )
                .await?;
            println!("Deployment accepted, task: {task}");
            Ok(())
        }
        Commands::Update { instance_id } => {
            let broker = Broker::connect(config, director, ProcessExecutor).await?;
            let task = broker.update(&InstanceId::new(instance_id)?).await?;
            println!("Update accepted, task: {task}");
            Ok(())
        }
        Commands::Deprovision { instance_id } => {
            let broker = Broker::connect(config, director, ProcessExecutor).await?;
            let task = broker.deprovision(&InstanceId::new(instance_id)?).await?;
            println!("Deletion accepted, task: {task}");
            Ok(())
        }
        Commands::Status { task_id } => {
            // The registry is in-process, so a one-shot CLI polls the task
            // handle directly instead of looking up an instance.
            let state = director.task_status(&TaskId::new(task_id)?).await?;
            print_json(&state.operation());
            Ok(())
        }
        Commands::Bind {
            instance_id,
            binding_id,
        } => {
            let broker = Broker::connect(config, director, ProcessExecutor).await?;
            let credentials = broker
                .bind(&InstanceId::new(instance_id)?, &BindingId::new(binding_id)?)
                .await?;
            print_json(&credentials);
            Ok(())
        }
        Commands::Unbind {
            instance_id,
            binding_id,
        } => {
            let broker = Broker::connect(config, director, ProcessExecutor).await?;
            broker
                .unbind(&InstanceId::new(instance_id)?, &BindingId::new(binding_id)?)
                .await?;
            println!("Unbind complete");
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: failed to serialize output: {e}"),
    }
}
