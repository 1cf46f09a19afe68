mod cli;

use github_pr_mcp::config::Config;
use github_pr_mcp::server;
use log::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = cli::parse_options();
    cli::init_logging(opts.log_level.as_deref());

    if opts.version {
        println!("github-pr-mcp {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Refuse to start without credentials, before any listener is bound.
    let mut cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            eprintln!("github-pr-mcp: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(port) = opts.port {
        cfg.port = port;
    }

    server::serve(cfg).await
}
