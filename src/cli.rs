use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "imagebox")]
#[command(about = "Image search and batch download service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Server(ServerArgs),
    /// Download images for one query into a local folder
    Download(DownloadArgs),
    /// Print the image URLs a query resolves to
    Search(SearchArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (defaults to `server.bind_addr`)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    pub query: String,
    /// Number of images (defaults to `server.default_count`)
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
    /// Base directory; images land in `<dir>/<sanitized query>/`
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    pub query: String,
    #[arg(long, short = 'n', default_value_t = 5)]
    pub count: usize,
}
