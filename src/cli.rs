//! CLI argument parsing for `cdisc`.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cdisc",
    version,
    about = "Discover a running broker platform into a provisioning inventory",
    after_help = "Examples:\n  cdisc discover --inventory hosts.json --out discovered.json\n  cdisc discover --inventory hosts.json --fixture recorded.json --json\n  cdisc locate \"/usr/bin/connect-distributed /etc/kafka/connect-distributed.properties\"\n  cdisc builders --from-version 7.4\n  cdisc init-config",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Discover(DiscoverArgs),
    Locate(LocateArgs),
    Builders(BuildersArgs),
    InitConfig(InitConfigArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Discover services listed in an inventory and write the result")]
pub struct DiscoverArgs {
    /// Inventory JSON (group -> {hosts, vars})
    #[arg(long, value_name = "PATH")]
    pub inventory: PathBuf,

    /// Discovery config JSON
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Platform version the cluster runs, e.g. 7.2
    #[arg(long, value_name = "VERSION")]
    pub from_version: Option<String>,

    /// Answer gateway actions from a recorded host snapshot instead of ssh
    #[arg(long, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Output path for the discovered inventory (default: stdout)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Emit the per-service report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print the properties files referenced by a launch command")]
pub struct LocateArgs {
    /// Full service launch command line
    #[arg(value_name = "COMMAND_LINE")]
    pub command_line: String,
}

#[derive(Parser, Debug)]
#[command(about = "Show which builder each service resolves to")]
pub struct BuildersArgs {
    /// Discovery config JSON
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "VERSION")]
    pub from_version: Option<String>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Write a discovery config stub")]
pub struct InitConfigArgs {
    /// Output path (default: the user config directory)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}
