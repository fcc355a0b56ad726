use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use geov_types::GeometryKind;

#[derive(Parser)]
#[command(
    name = "geov",
    about = "GeoVersion -- content-addressed geometry store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML store configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory for the journal backend (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Use a process-local in-memory store
    #[arg(long, global = true, conflicts_with = "data_dir")]
    pub memory: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open the store, creating it if needed, and report its state
    Init,
    /// Validate and store a geometry with attributes
    Put(ObjectArgs),
    /// Print the content id of a geometry without storing it
    Hash(ObjectArgs),
    /// Show a stored object
    Get(IdArgs),
    /// Check whether an object is stored
    Exists(IdArgs),
    /// Remove a stored object
    Rm(IdArgs),
    /// Count stored objects
    Count,
    /// List stored object ids
    Ls,
    /// List objects of one geometry kind
    Kind(KindArgs),
    /// List objects lying within a bounding box
    Bbox(BboxArgs),
    /// Rewrite the journal with only live objects
    Compact,
}

#[derive(Args)]
pub struct ObjectArgs {
    /// GeoJSON geometry, e.g. '{"type":"Point","coordinates":[30,60]}'
    #[arg(short, long)]
    pub geometry: String,
    /// JSON object of attributes
    #[arg(short, long)]
    pub attributes: Option<String>,
}

#[derive(Args)]
pub struct IdArgs {
    /// 64-character hex content id
    pub id: String,
}

#[derive(Args)]
pub struct KindArgs {
    /// Point, LineString, Polygon, ...
    pub kind: GeometryKind,
}

#[derive(Args)]
pub struct BboxArgs {
    #[arg(allow_negative_numbers = true)]
    pub min_lon: f64,
    #[arg(allow_negative_numbers = true)]
    pub min_lat: f64,
    #[arg(allow_negative_numbers = true)]
    pub max_lon: f64,
    #[arg(allow_negative_numbers = true)]
    pub max_lat: f64,
}
