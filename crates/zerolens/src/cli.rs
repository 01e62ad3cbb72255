//! Command-line definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "zerolens",
    version,
    about = "Inspect and manage a locally running ZeroTier service"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Override the auth token file path
    #[arg(long, global = true, env = "ZEROLENS_AUTH_TOKEN_PATH")]
    pub token_path: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Service reachability and node status
    Status,

    /// Inspect joined networks
    Networks(NetworksArgs),

    /// Join a network by hostname, URL, or network ID
    Join(JoinArgs),

    /// Leave a network
    Leave {
        /// 16-hex-character network ID
        network_id: String,
    },

    /// Inspect known peers
    Peers(PeersArgs),

    /// Resolve the network ID published at a hostname
    Resolve {
        /// Fully-qualified domain name carrying a zerotier-net-id TXT record
        hostname: String,
    },

    /// Live node and network summary (Ctrl-C to exit)
    Watch,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct NetworksArgs {
    #[command(subcommand)]
    pub command: Option<NetworksCommand>,
}

#[derive(Debug, Subcommand)]
pub enum NetworksCommand {
    /// List joined networks (default)
    List,
    /// Show one network in detail
    Show {
        /// 16-hex-character network ID
        network_id: String,
    },
}

#[derive(Debug, Args)]
pub struct PeersArgs {
    #[command(subcommand)]
    pub command: Option<PeersCommand>,
}

#[derive(Debug, Subcommand)]
pub enum PeersCommand {
    /// List known peers (default)
    List,
    /// Show one peer in detail
    Show {
        /// 10-hex-character node address
        address: String,
    },
}

#[derive(Debug, Args)]
pub struct JoinArgs {
    /// Network hostname, URL, or 16-hex-character network ID
    pub identifier: String,

    /// Treat the identifier as a raw network ID (skip DNS resolution)
    #[arg(long)]
    pub network_id: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::Cli;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
