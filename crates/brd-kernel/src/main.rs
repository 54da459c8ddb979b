use brd_kernel::{load_config, run_scenario, run_simulator, table, Scenario, SimulatorConfig};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn cli() -> Command {
    Command::new("brd-kernel")
        .version(brd_core::VERSION)
        .about("BRD review engine operator tools")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration file (TOML)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("info")
                .help("Log filter when RUST_LOG is unset"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("policy-table")
                .about("Print the role x state decision matrix")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Race appends, transitions and promotions against a seeded engine")
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("rounds")
                        .long("rounds")
                        .default_value("20")
                        .value_parser(value_parser!(u64))
                        .help("Rounds to run, each on a fresh engine"),
                )
                .arg(
                    Arg::new("writers")
                        .long("writers")
                        .default_value("8")
                        .value_parser(value_parser!(usize))
                        .help("Concurrent comment writers per round"),
                )
                .arg(
                    Arg::new("appends")
                        .long("appends")
                        .default_value("4")
                        .value_parser(value_parser!(usize))
                        .help("Appends each writer attempts"),
                )
                .arg(
                    Arg::new("racers")
                        .long("racers")
                        .default_value("8")
                        .value_parser(value_parser!(usize))
                        .help("Racers per transition and promotion race"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                ),
        )
        .subcommand(
            Command::new("scenario")
                .about("Run one worked review scenario end to end")
                .arg(
                    Arg::new("name")
                        .required(true)
                        .value_parser(value_parser!(Scenario))
                        .help("Scenario to run"),
                ),
        )
}

fn init_tracing(matches: &ArgMatches) {
    let level = matches
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into());

    if matches.get_flag("log-json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(&matches);

    let engine = load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("policy-table", args)) => {
            println!("{}", table::render(args.get_flag("json"))?);
        }
        Some(("simulate", args)) => {
            let defaults = SimulatorConfig::default();
            let config = SimulatorConfig {
                seed: args.get_one::<u64>("seed").copied().unwrap_or(defaults.seed),
                rounds: args.get_one::<u64>("rounds").copied().unwrap_or(defaults.rounds),
                writers: args.get_one::<usize>("writers").copied().unwrap_or(defaults.writers),
                appends_per_writer: args
                    .get_one::<usize>("appends")
                    .copied()
                    .unwrap_or(defaults.appends_per_writer),
                racers: args.get_one::<usize>("racers").copied().unwrap_or(defaults.racers),
                stop_on_first_violation: args.get_flag("stop-on-violation"),
                engine,
            };

            println!("Running BRD simulator...");
            println!("Seed: {}", config.seed);
            println!("Rounds: {}", config.rounds);
            println!(
                "Writers: {} x {} appends",
                config.writers, config.appends_per_writer
            );
            println!();

            let report = run_simulator(config).await?;
            println!("{}", report.generate_text());
            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("scenario", args)) => {
            let scenario = args
                .get_one::<Scenario>("name")
                .copied()
                .ok_or_else(|| anyhow::anyhow!("scenario name is required"))?;
            let report = run_scenario(scenario, engine).await?;
            println!("{}", report.generate_text());
            std::process::exit(if report.passed { 0 } else { 1 });
        }
        _ => {
            cli().print_help()?;
        }
    }
    Ok(())
}
