use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "machine-ignition",
    about = "Generate first-boot Ignition configs for container-engine VMs"
)]
pub struct Cli {
    /// Path to a machine config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all logging
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assemble the Ignition config for a machine and write it
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Machine name (overrides config)
    #[arg(long)]
    pub vm_name: Option<String>,

    /// Login name inside the guest [default: core]
    #[arg(long)]
    pub user: Option<String>,

    /// Numeric uid for the login [default: invoking uid]
    #[arg(long)]
    pub uid: Option<u32>,

    /// SSH public key text
    #[arg(long, conflicts_with = "ssh_key_file")]
    pub ssh_key: Option<String>,

    /// File containing the SSH public key
    #[arg(long)]
    pub ssh_key_file: Option<String>,

    /// Time zone: `local` to copy the host's, or an IANA name
    #[arg(long)]
    pub timezone: Option<String>,

    /// Hypervisor kind written into the guest marker
    #[arg(long)]
    pub vm_kind: Option<String>,

    /// Link the docker socket to the rootful podman socket (`--rootful=false` to turn off)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub rootful: Option<bool>,

    /// Install the network health recovery service (`--net-recover=false` to turn off)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub net_recover: Option<bool>,

    /// Where to write the config
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Add a ready.service that reports to the host on this vsock port
    #[arg(long)]
    pub ready_vsock_port: Option<u32>,

    /// Embed a host file in the guest, as SRC:DEST (repeatable)
    #[arg(long = "file", value_name = "SRC:DEST", value_parser = parse_extra_file)]
    pub files: Vec<ExtraFile>,

    /// Copy this Ignition file verbatim instead of generating one
    #[arg(long)]
    pub ignition_file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

/// A host file to embed at `dest` in the guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraFile {
    pub source: PathBuf,
    pub dest: String,
}

fn parse_extra_file(s: &str) -> Result<ExtraFile, String> {
    let (source, dest) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected SRC:DEST, got '{s}'"))?;
    if source.is_empty() {
        return Err(format!("missing source in '{s}'"));
    }
    if !dest.starts_with('/') {
        return Err(format!("destination must be an absolute guest path (got '{dest}')"));
    }
    Ok(ExtraFile {
        source: PathBuf::from(source),
        dest: dest.to_string(),
    })
}
