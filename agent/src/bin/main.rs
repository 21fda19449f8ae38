use std::path::Path;

use anyhow::Context;
use clap::{Args, FromArgMatches};
use hostmetrics::{
    pipeline::{collect_host_attributes, Emitter},
    AttributeMap,
};
use hostmetrics_agent::{config::AgentConfig, init_logger};
use plugin_cloudwatch::CloudWatchBackend;
use plugin_ec2_identity::InstanceIdentityClient;
use plugin_ecs_cluster::EcsConfigFile;

const BINARY: &str = env!("CARGO_BIN_NAME");

/// Main agent function.
///
/// The steps are:
/// - parse the CLI
/// - parse the config file (or write the default one)
/// - apply the settings from CLI and config file
/// - run one collection cycle: identity, dimensions, composition, publication
///
/// About errors: we use `anyhow::Result` and `context` instead of `expect` to get
/// nicer error messages (`expect` prints errors with `Debug`).
fn main() -> anyhow::Result<()> {
    init_logger();

    // Define the command-line interface.
    let mut cmd = clap::Command::new(BINARY).version(agent_version());
    cmd = cli::Cli::augment_args(cmd);

    // Parse CLI arguments and handle some special flags like --version and --help.
    let matches = cmd.get_matches();
    let args = cli::Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    // Special flags like --help will exit. In other cases, we continue.
    log::info!("Starting '{BINARY}' v{}", agent_version());

    let config_path = Path::new(&args.common.config);
    if let cli::Command::Config(cli::ConfigArgs {
        command: cli::ConfigCommand::Regen,
    }) = args.command
    {
        // (re)generate the default config
        std::fs::write(config_path, AgentConfig::default_string()?)
            .with_context(|| format!("could not write {config_path:?}"))?;
        log::info!("Default configuration file written to: {}", args.common.config);
        return Ok(());
    }

    let mut config = AgentConfig::load(config_path, !args.common.no_default_config).context("could not load config file")?;
    apply_overrides(&args.common, &mut config);

    match args.command {
        cli::Command::Put(put) => put_metrics(&config, &args.common, put),
        cli::Command::Dimensions => print_dimensions(&config, &args.common),
        cli::Command::Config(_) => unreachable!("config commands should have been handled at this point"),
    }
}

/// Applies the CLI settings on top of the config file.
fn apply_overrides(args: &cli::CommonArgs, config: &mut AgentConfig) {
    if let Some(namespace) = &args.namespace {
        config.namespace = namespace.clone();
    }
    if let Some(region) = &args.region {
        config.region = Some(region.clone());
    }
}

/// Fetches the instance identity and adds the attributes given on the command line.
fn host_attributes(config: &AgentConfig, args: &cli::CommonArgs) -> anyhow::Result<AttributeMap> {
    let identity = InstanceIdentityClient::new(config.identity.clone()).context("invalid identity config")?;
    let extra = AttributeMap::from_iter(args.attributes.iter().cloned());
    let attrs = collect_host_attributes(&identity, extra).inspect_err(log_classified)?;
    Ok(attrs)
}

fn emitter(config: &AgentConfig) -> Emitter<CloudWatchBackend> {
    let cluster = EcsConfigFile::new(config.cluster.clone());
    let backend = CloudWatchBackend::new(config.cloudwatch.clone());
    Emitter::new(Box::new(cluster), backend)
}

/// Runs one collection cycle and publishes the measurements (or prints them, in dry-run mode).
fn put_metrics(config: &AgentConfig, args: &cli::CommonArgs, put: cli::PutArgs) -> anyhow::Result<()> {
    let attrs = host_attributes(config, args)?;
    let region = config.resolve_region(&attrs)?;
    let namespace = &config.namespace;

    let emitter = emitter(config);
    let mut cycle = emitter.begin_cycle(&attrs).inspect_err(log_classified)?;
    for m in &put.metrics {
        cycle.add(m);
    }

    if put.dry_run {
        log::info!("Dry run: the metrics are not published.");
        println!("namespace: {namespace}");
        println!("region: {region}");
        for record in &cycle.into_batch() {
            println!("{record}");
        }
    } else {
        cycle.publish(namespace, &region).inspect_err(log_classified)?;
    }
    Ok(())
}

/// Prints the dimensions that would be attached to the measurements.
fn print_dimensions(config: &AgentConfig, args: &cli::CommonArgs) -> anyhow::Result<()> {
    let attrs = host_attributes(config, args)?;
    let emitter = emitter(config);
    let cycle = emitter.begin_cycle(&attrs).inspect_err(log_classified)?;
    println!("host: {}", cycle.host_dimensions());
    println!("cluster: {}", cycle.cluster_dimensions());
    Ok(())
}

/// Tells the user where to look, depending on the kind of error.
fn log_classified(err: &hostmetrics::Error) {
    if err.is_local() {
        log::error!("The host or its configuration is not ready: {err}");
    } else {
        log::error!("The metrics backend or the metadata service is unavailable: {err}");
    }
}

/// Generates a version number from the information generated in the build script.
/// See `build.rs` at the crate root.
fn agent_version() -> String {
    const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");
    const BUILD_TIMESTAMP: &str = env!("VERGEN_BUILD_TIMESTAMP");
    const RUSTC_SEMVER: &str = env!("VERGEN_RUSTC_SEMVER");
    const CARGO_DEBUG: &str = env!("VERGEN_CARGO_DEBUG");
    format!("{CRATE_VERSION} ({BUILD_TIMESTAMP}, rustc {RUSTC_SEMVER}, debug={CARGO_DEBUG})")
}

/// Agent command-line interface (CLI).
///
/// We use `clap` to parse these options, therefore the structs
/// derive [`clap::Args`] or other clap trait implementations.
mod cli {
    use clap::{Args, Parser, Subcommand};
    use hostmetrics::Measurement;
    use hostmetrics_agent::args::{parse_attribute, parse_measurement};

    // NOTE: the doc comment attached to `Cli` is used by clap as the description of
    // the application. It is displayed at the start of the help message.

    /// Tags measurements with the identity of the host and its cluster, and publishes them to CloudWatch.
    #[derive(Parser)]
    pub struct Cli {
        #[command(subcommand)]
        pub command: Command,

        #[command(flatten)]
        pub common: CommonArgs,
    }

    #[derive(Subcommand)]
    pub enum Command {
        /// Publish measurements, tagged with the host and cluster dimensions.
        Put(PutArgs),

        /// Print the host and cluster dimensions, and stop.
        Dimensions,

        /// Manipulate the configuration.
        Config(ConfigArgs),
    }

    #[derive(Args)]
    pub struct PutArgs {
        /// Measurements to publish, as `Name:Unit:Value`, ex. `DiskFree:Percent:87.5`.
        #[arg(long = "metric", required = true, value_parser = parse_measurement)]
        pub metrics: Vec<Measurement>,

        /// Print the metric records instead of publishing them.
        #[arg(long, default_value_t = false)]
        pub dry_run: bool,
    }

    #[derive(Args)]
    pub struct ConfigArgs {
        #[command(subcommand)]
        pub command: ConfigCommand,
    }

    #[derive(Subcommand)]
    pub enum ConfigCommand {
        /// Regenerate the configuration file and stop.
        ///
        /// If the file exists, it will be overwritten.
        Regen,
    }

    /// Common CLI arguments.
    #[derive(Args, Clone)]
    pub struct CommonArgs {
        /// Path to the config file.
        #[arg(long, env = "HOSTMETRICS_CONFIG", default_value = "hostmetrics.toml")]
        pub config: String,

        /// If set, the config file must exist, otherwise the agent will fail to start with an error.
        #[arg(long, default_value_t = false)]
        pub no_default_config: bool,

        /// Namespace of the metrics (overrides the config file).
        #[arg(long)]
        pub namespace: Option<String>,

        /// Region of the metrics backend (overrides the config file and the region of the instance).
        #[arg(long)]
        pub region: Option<String>,

        /// Additional host attribute, as `key=value`, ex. `fileSystem=/dev/xvda1`.
        ///
        /// Can be repeated. Overrides the attributes of the instance identity.
        #[arg(long = "attribute", value_parser = parse_attribute)]
        pub attributes: Vec<(String, String)>,
    }
}
