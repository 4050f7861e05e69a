use std::path::Path;

use clap::Parser;

use machine_ignition::cli::{Cli, Command, GenerateArgs, OutputFormat};
use machine_ignition::config::{self, MachineConfig};
use machine_ignition::error::IgnitionError;
use machine_ignition::host::SystemHost;
use machine_ignition::ignition::files::inline_file;
use machine_ignition::ignition::{IgnitionBuilder, ProvisioningRequest, units};
use machine_ignition::logging::{self, Verbosity};

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    match cli.command {
        Command::Generate(args) => run_generate(cli.config.as_deref(), args)?,
    }

    Ok(())
}

fn run_generate(config_path: Option<&Path>, args: GenerateArgs) -> Result<(), IgnitionError> {
    let mut machine = match config_path {
        Some(path) => config::load_config(path)?,
        None => MachineConfig::default(),
    };
    apply_overrides(&mut machine, &args);
    config::validate_config(&machine)?;

    let host = SystemHost;

    if let Some(ignition_file) = &machine.machine.ignition_file {
        let request = ProvisioningRequest {
            vm_name: machine.vm_name().to_string(),
            write_path: machine.output_path(&host),
            ..ProvisioningRequest::default()
        };
        let path = IgnitionBuilder::new(request).build_with_ignition_file(Path::new(ignition_file))?;
        match args.output_format {
            OutputFormat::Json => println!(
                "{}",
                facet_json::to_string(&CopyJson {
                    path: path.display().to_string(),
                    source: ignition_file.clone(),
                })
                .expect("JSON serialization"),
            ),
            OutputFormat::Plain => println!("Copied {ignition_file} to {}", path.display()),
        }
        return Ok(());
    }

    let mut builder = IgnitionBuilder::new(machine.to_request(&host)?);
    builder.generate(&host)?;

    if let Some(port) = machine.machine.ready_vsock_port {
        builder.with_unit([units::ready_unit(port)]);
    }

    let mut extra = Vec::with_capacity(args.files.len());
    for file in &args.files {
        let contents = std::fs::read(&file.source).map_err(|source| IgnitionError::Io {
            context: format!("reading {}", file.source.display()),
            source,
        })?;
        extra.push(inline_file(&file.dest, contents, 0o644));
    }
    builder.with_file(extra);

    let config = builder.config();
    let mut summary = GenerateJson {
        path: String::new(),
        users: config.passwd.users.len(),
        files: config.storage.files.len(),
        links: config.storage.links.len(),
        units: config.systemd.units.len(),
        warnings: builder.warnings().iter().map(ToString::to_string).collect(),
        degraded: builder.warnings().iter().any(|w| w.is_degraded()),
    };

    let path = builder.build()?;
    summary.path = path.display().to_string();

    match args.output_format {
        OutputFormat::Json => println!(
            "{}",
            facet_json::to_string(&summary).expect("JSON serialization"),
        ),
        OutputFormat::Plain => {
            println!("Wrote ignition to {}", summary.path);
            for warning in &summary.warnings {
                println!("  warning: {warning}");
            }
        }
    }

    Ok(())
}

/// Command-line flags win over the config file, field by field.
fn apply_overrides(machine: &mut MachineConfig, args: &GenerateArgs) {
    if let Some(name) = &args.vm_name {
        machine.name = name.clone();
    }
    if let Some(user) = &args.user {
        machine.user.name = user.clone();
    }
    if let Some(uid) = args.uid {
        machine.user.uid = Some(uid);
    }
    if let Some(key) = &args.ssh_key {
        machine.user.ssh_key = Some(key.clone());
        machine.user.ssh_key_file = None;
    }
    if let Some(file) = &args.ssh_key_file {
        machine.user.ssh_key_file = Some(file.clone());
        machine.user.ssh_key = None;
    }
    if let Some(tz) = &args.timezone {
        machine.machine.timezone = tz.clone();
    }
    if let Some(kind) = &args.vm_kind {
        machine.vm_kind = kind.clone();
    }
    if let Some(rootful) = args.rootful {
        machine.machine.rootful = rootful;
    }
    if let Some(net_recover) = args.net_recover {
        machine.machine.net_recover = net_recover;
    }
    if let Some(output) = &args.output {
        machine.output = Some(output.display().to_string());
    }
    if let Some(port) = args.ready_vsock_port {
        machine.machine.ready_vsock_port = Some(port);
    }
    if let Some(file) = &args.ignition_file {
        machine.machine.ignition_file = Some(file.display().to_string());
    }
}

// ── JSON output structs ─────────────────────────────────────────────

#[derive(facet::Facet)]
struct GenerateJson {
    path: String,
    users: usize,
    files: usize,
    links: usize,
    units: usize,
    warnings: Vec<String>,
    degraded: bool,
}

#[derive(facet::Facet)]
struct CopyJson {
    path: String,
    source: String,
}
