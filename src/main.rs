use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde_json::json;

mod builder;
mod catalog;
mod cli;
mod config;
mod discovery;
mod gateway;
mod inventory;
mod loader;
mod locator;
mod properties;

use builder::BuilderRegistry;
use catalog::Service;
use cli::{BuildersArgs, Command, DiscoverArgs, InitConfigArgs, LocateArgs, RootArgs};
use config::{default_config, default_config_path, effective_config, write_config};
use discovery::Discovery;
use gateway::{FixtureGateway, Gateway, SshGateway};
use inventory::Inventory;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Discover(args) => cmd_discover(args),
        Command::Locate(args) => cmd_locate(args),
        Command::Builders(args) => cmd_builders(args),
        Command::InitConfig(args) => cmd_init_config(args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_discover(args: DiscoverArgs) -> Result<()> {
    let mut config = effective_config(args.config.as_deref())?;
    if let Some(version) = args.from_version {
        config.from_version = version;
    }
    let services = config.selected_services()?;
    let mut inventory = Inventory::load(&args.inventory)?;

    let gateway: Box<dyn Gateway> = match &args.fixture {
        Some(path) => Box::new(FixtureGateway::load(path)?),
        None => Box::new(SshGateway::new(config.ssh.clone())?),
    };
    let registry = BuilderRegistry::standard();
    let discovery = Discovery {
        gateway: gateway.as_ref(),
        registry: &registry,
        config: &config,
    };
    let report = discovery.run(&mut inventory, &services);

    let rendered = if args.json {
        serde_json::to_string_pretty(&report).context("serialize discovery report")?
    } else {
        report.render_text()
    };
    match &args.out {
        Some(path) => {
            inventory.write(path)?;
            println!("{}", rendered.trim_end());
        }
        None => {
            println!("{}", inventory.to_json()?);
            eprintln!("{}", rendered.trim_end());
        }
    }
    Ok(())
}

fn cmd_locate(args: LocateArgs) -> Result<()> {
    let references = locator::locate(&args.command_line);
    let text = serde_json::to_string_pretty(&references).context("serialize references")?;
    println!("{text}");
    Ok(())
}

fn cmd_builders(args: BuildersArgs) -> Result<()> {
    let mut config = effective_config(args.config.as_deref())?;
    if let Some(version) = args.from_version {
        config.from_version = version;
    }
    let registry = BuilderRegistry::standard();
    let mut rows = Vec::new();
    for service in Service::ALL {
        let resolution = registry
            .resolve(service, &config.from_version)
            .ok_or_else(|| anyhow!("no builder registered for {service}"))?;
        let descriptor = service.descriptor();
        rows.push(json!({
            "service": service,
            "group": descriptor.group,
            "unit": descriptor.unit,
            "default_ports": descriptor.default_ports,
            "binding": resolution.binding,
            "bindings": registry.bindings(service),
            "resolved_by": resolution.resolved_by,
            "primary_file": resolution.builder.primary_file_key(),
            "transforms": resolution
                .builder
                .transforms()
                .iter()
                .map(|transform| transform.name)
                .collect::<Vec<_>>(),
        }));
    }

    if args.json {
        let text = serde_json::to_string_pretty(&rows).context("serialize builders")?;
        println!("{text}");
        return Ok(());
    }
    println!("from version {}", config.from_version);
    for (service, row) in Service::ALL.iter().zip(&rows) {
        println!(
            "{:<26}{:<34}{} transforms",
            service.name(),
            row["binding"].as_str().unwrap_or("-"),
            row["transforms"].as_array().map_or(0, Vec::len)
        );
    }
    Ok(())
}

fn cmd_init_config(args: InitConfigArgs) -> Result<()> {
    let path = match args.out {
        Some(path) => path,
        None => default_config_path().ok_or_else(|| anyhow!("no user config directory"))?,
    };
    if path.exists() && !args.force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    write_config(&path, &default_config())?;
    println!("wrote {}", path.display());
    Ok(())
}
