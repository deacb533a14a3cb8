use anyhow::{Context, Result};

use galleria::cli::{self, Command};
use galleria::config::GalleryConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("galleria=info".parse()?),
        )
        .init();

    let args = match cli::parse_args(std::env::args().skip(1))? {
        Command::Help => {
            println!("{}", cli::USAGE);
            return Ok(());
        }
        Command::Run(args) => args,
    };
    let config = cli::resolve_config(&args, GalleryConfig::from_env())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;
    runtime.block_on(cli::run(args, config))
}
