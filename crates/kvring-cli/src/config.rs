//! CLI argument parsing, in the teacher's `clap`-derive style.

use clap::{Parser, Subcommand};

/// Operator tool for a kvring cluster: ring inspection plus ad-hoc
/// put/get/delete against a coordinator built from the given node list.
#[derive(Parser, Debug)]
#[command(name = "kvring", version, about)]
pub struct CliConfig {
    /// Replica nodes in `name=host:port` form, repeatable. Together they
    /// define the ring this invocation talks to.
    #[arg(long = "node", global = true)]
    pub nodes: Vec<String>,

    /// Replication factor (N) for the ring built from `--node`.
    #[arg(long, default_value_t = 3, global = true)]
    pub replication_factor: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a value to W of the key's N replicas.
    Put {
        key: String,
        value: String,
        #[arg(long, default_value_t = 2)]
        w: usize,
    },
    /// Read a value from R of the key's N replicas.
    Get {
        key: String,
        #[arg(long, default_value_t = 2)]
        r: usize,
    },
    /// Delete a key from W of its N replicas.
    Delete {
        key: String,
        #[arg(long, default_value_t = 2)]
        w: usize,
    },
    /// Print ring topology: node count, ownership distribution.
    Describe,
}
