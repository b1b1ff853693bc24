pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "recipebook")]
#[command(about = "Recipe Book - recipe query resolution service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,
    },

    /// Run database migrations
    Migrate,

    /// Resolve a query to a single recipe, generating one if nothing matches
    Resolve {
        /// Free-text query
        query: String,
    },

    /// List stored recipes
    List {
        /// Match title or ingredients
        #[arg(short, long)]
        query: Option<String>,

        /// Only recipes owned by this user
        #[arg(long)]
        user_id: Option<String>,

        /// Only recipes whose title contains this text
        #[arg(short, long)]
        filter: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Show a recipe by ID
    Get {
        /// Recipe ID
        id: String,
    },
}
