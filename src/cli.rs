// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dirigent")]
#[command(about = "Service broker that provisions instances through a deployment director")]
#[command(version)]
pub struct Cli {
    /// Path to the broker configuration file (default: discover in cwd)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the service catalog as JSON
    Catalog,

    /// Provision a new service instance
    Provision {
        /// Caller-assigned instance id
        instance_id: String,

        /// Plan id from the broker configuration
        plan: String,

        /// Caller parameters as a JSON object
        #[arg(long)]
        params: Option<String>,
    },

    /// Redeploy an instance provisioned in this session
    Update {
        instance_id: String,
    },

    /// Delete an instance's artifacts and its remote deployment
    Deprovision {
        instance_id: String,
    },

    /// Query the state of a director task
    Status {
        /// Task handle returned by provision/update/deprovision
        task_id: String,
    },

    /// Render and run an instance's bind script, printing credentials
    Bind {
        instance_id: String,
        binding_id: String,
    },

    /// Render and run an instance's unbind script, if configured
    Unbind {
        instance_id: String,
        binding_id: String,
    },
}
