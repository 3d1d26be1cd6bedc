//! tfcascade cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;
use tfcascade::Category;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; tfcascade ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the combined files into the work directory
    Prep(PrepCommand),

    /// Print the resolved layers and fragment paths
    Paths(PathsCommand),

    /// Remove the combined files from the work directory
    Clean(CleanCommand),
}

#[derive(Parser, Debug)]
pub struct EnvironmentArgs {
    /// Environment to combine, e.g. dev
    #[clap(short = 'e', long = "environment")]
    pub environment: String,
}

#[derive(Parser, Debug)]
pub struct PrepCommand {
    #[clap(flatten)]
    pub environment: EnvironmentArgs,

    /// Only combine these categories (values, variables, resources, derived)
    ///
    /// All categories are combined unless given.
    #[clap(long = "category")]
    pub categories: Vec<Category>,

    /// Give up after this many seconds
    #[clap(long = "timeout")]
    pub timeout: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct PathsCommand {
    #[clap(flatten)]
    pub environment: EnvironmentArgs,

    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct CleanCommand {
    #[clap(flatten)]
    pub environment: EnvironmentArgs,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}
