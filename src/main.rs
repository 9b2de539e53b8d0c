use anyhow::Context;

use tiny_web::config::Config;
use tiny_web::process::Reaper;
use tiny_web::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        let prog = args.first().map(String::as_str).unwrap_or("tiny_web");
        eprintln!("usage: {} <port>", prog);
        std::process::exit(1);
    }
    let port: u16 = args[1]
        .parse()
        .with_context(|| format!("invalid port: {}", args[1]))?;

    let cfg = Config::load(port)?;

    // SIGCHLD must be watched before the first worker exists.
    let reaper = Reaper::new();
    let reaper_task = reaper.spawn()?;

    tokio::select! {
        res = server::listener::run(&cfg, reaper) => {
            res?;
        }

        res = reaper_task => {
            res??;
            tracing::error!("Reaper stopped unexpectedly");
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
