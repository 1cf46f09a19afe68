use clap::{Arg, ArgAction, Command};

pub struct CliOptions {
    pub log_level: Option<String>,
    pub port: Option<u16>,
    pub version: bool,
}

pub fn build_cli() -> Command {
    Command::new("github-pr-mcp")
        .about("GitHub pull-request MCP server (stateless HTTP JSON-RPC)")
        .disable_version_flag(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .num_args(1)
                .value_parser(clap::value_parser!(u16))
                .help("Listen port; overrides PORT"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
}

pub fn parse_options() -> CliOptions {
    let matches = build_cli().get_matches();
    CliOptions {
        log_level: matches.get_one::<String>("log-level").cloned(),
        port: matches.get_one::<u16>("port").copied(),
        version: matches.get_flag("version"),
    }
}

pub fn init_logging(level: Option<&str>) {
    // Explicit level wins, then RUST_LOG, then info.
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(lvl) = level {
        builder.parse_filters(lvl);
    }
    builder.init();
}
