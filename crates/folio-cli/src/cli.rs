use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "folio",
    about = "Folio: artist portfolio catalog and admin tools",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(long, global = true, env = "FOLIO_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the gallery server
    Serve(ServeArgs),
    /// List artworks in catalog order
    List(ListArgs),
    /// Show the featured works
    Featured(FeaturedArgs),
    /// Show one artwork
    Show(ShowArgs),
    /// Add an artwork (admin)
    Add(AddArgs),
    /// Change fields of an artwork (admin)
    Update(UpdateArgs),
    /// Remove an artwork (admin)
    Delete(DeleteArgs),
    /// List the known categories
    Categories,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Category label, or "All"
    #[arg(long)]
    pub category: Option<String>,
    /// Only works still for sale
    #[arg(long)]
    pub available: bool,
}

#[derive(Args)]
pub struct FeaturedArgs {
    #[arg(short = 'n', long, default_value = "3")]
    pub limit: usize,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
}

/// Admin credentials: a shared secret, or email and password.
#[derive(Args, Clone, Debug, Default)]
pub struct AuthArgs {
    #[arg(long, env = "FOLIO_ADMIN_SECRET", hide_env_values = true)]
    pub secret: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long, env = "FOLIO_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,
    /// Image file to upload, or an existing image URL
    #[arg(long)]
    pub image: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value = "Abstract")]
    pub category: String,
    #[arg(long, default_value = "")]
    pub medium: String,
    /// Defaults to the current year
    #[arg(long)]
    pub year: Option<String>,
    /// Free text such as "$1,200"
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub featured: bool,
    /// Record the work as already sold
    #[arg(long)]
    pub sold: bool,
    #[command(flatten)]
    pub auth: AuthArgs,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub image: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub medium: Option<String>,
    #[arg(long)]
    pub year: Option<String>,
    #[arg(long, conflicts_with = "clear_price")]
    pub price: Option<String>,
    /// Remove the price
    #[arg(long)]
    pub clear_price: bool,
    #[arg(long)]
    pub featured: Option<bool>,
    #[arg(long)]
    pub available: Option<bool>,
    #[command(flatten)]
    pub auth: AuthArgs,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub id: String,
    #[command(flatten)]
    pub auth: AuthArgs,
}
