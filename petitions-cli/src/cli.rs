use clap::{Parser, Subcommand};

/// Browse petitions from the petitions feed.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct PetitionsCli {
    /// Feed URL, overrides PETITIONS_ENDPOINT
    #[arg(short, long, global = true)]
    pub endpoint: Option<String>,

    /// Number of petitions to request, overrides PETITIONS_LIMIT
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Seconds to wait for the feed before giving up and showing the
    /// loading screen
    #[arg(short, long, global = true, default_value_t = 10)]
    pub wait_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the list of petitions
    List,
    /// Show the details of a single petition
    Show {
        /// Id of the petition
        id: String,
        /// Ask for confirmation below the details
        #[arg(short, long)]
        confirm: bool,
    },
}
