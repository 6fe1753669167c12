use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub fn git_version() -> &'static str {
    option_env!("TOOLCTL_GIT_TAG").unwrap_or(concat!("v", env!("CARGO_PKG_VERSION")))
}

pub fn git_commit() -> &'static str {
    option_env!("TOOLCTL_GIT_COMMIT").unwrap_or("unknown")
}

#[derive(Parser)]
#[command(name = "toolctl")]
#[command(about = "Install, upgrade and discover versions of developer tools")]
#[command(version = git_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default is $XDG_CONFIG_HOME/toolctl/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use the local API instead of the remote one
    #[arg(long, global = true, hide = true)]
    pub local: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install one or more tools
    #[command(after_help = "Examples:\n  toolctl install minikube\n  toolctl install kubectl@1.20.13\n  toolctl install kustomize k9s")]
    Install {
        /// Tools to install, optionally pinned (e.g. 'kubectl@1.20.13')
        #[arg(required = true, value_name = "TOOL[@VERSION]")]
        tools: Vec<String>,
    },

    /// Upgrade one or more tools
    #[command(after_help = "Examples:\n  toolctl upgrade minikube\n  toolctl upgrade kustomize k9s")]
    Upgrade {
        #[arg(required = true, value_name = "TOOL")]
        tools: Vec<String>,
    },

    /// Information about one or more tools
    Info {
        #[arg(required = true, value_name = "TOOL")]
        tools: Vec<String>,
    },

    /// List the tools
    #[command(visible_alias = "ls")]
    List {
        /// List all supported tools, including those not installed
        #[arg(short, long)]
        all: bool,
    },

    /// Show the toolctl version
    Version {
        /// Print just the version number
        #[arg(long)]
        short: bool,
    },

    /// Maintain the metadata store
    #[command(hide = true)]
    Api {
        #[command(subcommand)]
        action: ApiAction,
    },
}

#[derive(Subcommand)]
pub enum ApiAction {
    /// Discover new versions of one or more tools
    #[command(after_help = "Examples:\n  toolctl api discover\n  toolctl api discover kubectl --os linux --arch amd64\n  toolctl api discover kubectl@1.20.0\n  toolctl api discover kubectl@earliest")]
    Discover(DiscoverArgs),

    /// Sync the list of supported tools
    Sync,
}

#[derive(Args)]
pub struct DiscoverArgs {
    /// Tools to discover; all known tools when omitted
    #[arg(value_name = "TOOL[@VERSION]")]
    pub tools: Vec<String>,

    /// Operating systems to probe
    #[arg(long, value_delimiter = ',', default_values_t = ["darwin".to_string(), "linux".to_string()])]
    pub os: Vec<String>,

    /// Architectures to probe
    #[arg(long, value_delimiter = ',', default_values_t = ["amd64".to_string(), "arm64".to_string()])]
    pub arch: Vec<String>,
}
