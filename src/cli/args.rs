use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "kira-varstats",
    version,
    about = "Small-variant statistics report from bcftools stats"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Report(ReportArgs),
}

#[derive(Parser)]
pub struct ReportArgs {
    /// Report output file
    pub report: PathBuf,

    /// bcftools stats output (plain or gzip); repeat for several samples
    #[arg(long, required = true)]
    pub vcf_stats: Vec<PathBuf>,

    /// Sample name for the matching --vcf-stats, in the same order
    #[arg(long)]
    pub sample_name: Vec<String>,

    /// Directory of CSV files with name,version rows
    #[arg(long)]
    pub versions: Option<PathBuf>,

    /// JSON file of workflow parameters
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Also write SVG/PDF figures, TSV tables and a zip bundle here
    #[arg(long)]
    pub export_figures: Option<PathBuf>,
}
