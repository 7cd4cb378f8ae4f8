#![forbid(unsafe_code)]

//! Headless driver for the price x quantity demo.
//!
//! Mounts the app into an in-memory document, then replays clock ticks and
//! button clicks, printing the document markup after every step.
//!
//! ```text
//! RUST_LOG=rebind_runtime=trace rebind-demo --ticks 2 --qty-clicks 1 --price-clicks 1
//! ```

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use rebind_demo::{App, DemoError, PRICE_LABEL, QTY_LABEL};
use rebind_runtime::{BindingConfig, ReentrancyPolicy};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use web_time::Instant;

#[derive(Parser, Debug)]
#[command(name = "rebind-demo")]
#[command(
    version,
    about = "Drive the rebind price x quantity demo headlessly",
    long_about = None
)]
struct Cli {
    /// Clock ticks to simulate, one second apart
    #[arg(long, default_value_t = 0)]
    ticks: u32,

    /// Clicks on "Add Qty by 1"
    #[arg(long, default_value_t = 0)]
    qty_clicks: u32,

    /// Clicks on "Add Price by 1000"
    #[arg(long, default_value_t = 0)]
    price_clicks: u32,

    /// Behavior of tracked writes made during a render (recurse, reject)
    #[arg(long, default_value_t = ReentrancyPolicy::Recurse)]
    reentrancy: ReentrancyPolicy,

    /// Maximum nested render cycles per binding
    #[arg(long)]
    max_render_depth: Option<usize>,
}

impl Cli {
    fn config(&self) -> BindingConfig {
        let config = BindingConfig::new().with_reentrancy(self.reentrancy);
        match self.max_render_depth {
            Some(depth) => config.with_max_render_depth(depth),
            None => config,
        }
    }
}

fn run(cli: &Cli) -> Result<(), DemoError> {
    let started = Instant::now();
    let app = App::new(cli.config(), started);

    app.mount()?;
    println!("mount: {}", app.html()?);

    for tick in 1..=cli.ticks {
        app.tick(started + Duration::from_secs(u64::from(tick)))?;
        println!("tick {tick}: {}", app.html()?);
    }
    for click in 1..=cli.qty_clicks {
        app.click(QTY_LABEL)?;
        println!("qty click {click}: {}", app.html()?);
    }
    for click in 1..=cli.price_clicks {
        app.click(PRICE_LABEL)?;
        println!("price click {click}: {}", app.html()?);
    }

    info!(
        price = app.price(),
        qty = app.qty(),
        total = app.total(),
        renders = app.binding().render_count(),
        "demo finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "demo failed");
            eprintln!("rebind-demo: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_replay_nothing() {
        let cli = Cli::try_parse_from(["rebind-demo"]).unwrap();
        assert_eq!((cli.ticks, cli.qty_clicks, cli.price_clicks), (0, 0, 0));
        assert_eq!(cli.config(), BindingConfig::default());
    }

    #[test]
    fn flags_build_config() {
        let cli = Cli::try_parse_from([
            "rebind-demo",
            "--ticks",
            "2",
            "--qty-clicks",
            "3",
            "--reentrancy",
            "reject",
            "--max-render-depth",
            "8",
        ])
        .unwrap();
        assert_eq!(cli.ticks, 2);
        assert_eq!(cli.qty_clicks, 3);
        assert_eq!(
            cli.config(),
            BindingConfig::new()
                .with_reentrancy(ReentrancyPolicy::Reject)
                .with_max_render_depth(8)
        );
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(Cli::try_parse_from(["rebind-demo", "--reentrancy", "loop"]).is_err());
    }

    #[test]
    fn run_replays_every_step() {
        let cli =
            Cli::try_parse_from(["rebind-demo", "--ticks", "1", "--price-clicks", "2"]).unwrap();
        run(&cli).unwrap();
    }
}
