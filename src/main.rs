mod browse;
mod cli;
mod client;
mod error;
mod filters;
mod likes;
mod output;
mod pagination;

use std::io::{self, BufWriter, Write};

use clap::Parser;
use cli::{Command, LikesAction};
use shutter::FilterSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::GalleryError;
use crate::pagination::PaginationConfig;

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    let cli = cli::Cli::parse();

    // Initialize tracing
    let filter = cli
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Shared cancellation token + signal handlers.
    let cancel = setup_signal_handlers();

    let result = match cli.command {
        Command::Browse(args) => run_browse_command(args, cancel).await,
        Command::Likes(args) => run_likes_command(args).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "gallery failed");
        std::process::exit(1);
    }
}

async fn run_browse_command(
    args: cli::BrowseArgs,
    cancel: CancellationToken,
) -> Result<(), GalleryError> {
    let gateway = client::create_gateway(&args.base_url)?;
    let filters = FilterSet::new(args.order_by, args.color, args.orientation);
    let config = PaginationConfig {
        page_size: args.page_size,
        ..Default::default()
    };

    let mut out = BufWriter::new(io::stdout().lock());
    let opts = browse::BrowseOptions {
        max_pages: args.pages,
        manual_retries: args.manual_retries,
        json_mode: args.json,
    };
    let count = browse::run_browse(gateway, filters, config, opts, &mut out, cancel).await?;
    info!(photos = count, "browse finished");
    Ok(())
}

async fn run_likes_command(args: cli::LikesArgs) -> Result<(), GalleryError> {
    let (api, controller) = client::create_like_controller(&args.credentials, &args.store)?;
    let mut out = io::stdout().lock();

    match args.action {
        LikesAction::List => {
            if controller.is_loading() {
                let _ = controller.subscribe().wait_for(|v| !v.loading).await;
            }
            let view = controller.snapshot();
            if let Some(err) = view.error {
                return Err(GalleryError::Likes(err));
            }
            let mut ids: Vec<&String> = view.liked.iter().collect();
            ids.sort();
            for id in ids {
                writeln!(out, "{id}")?;
            }
        }
        LikesAction::Toggle { id } => {
            controller.toggle(&id).await;
            if let Some(err) = controller.snapshot().error {
                return Err(GalleryError::Likes(err));
            }
            let state = if controller.is_liked(&id) { "liked" } else { "unliked" };
            writeln!(out, "{id}\t{state}")?;
        }
        LikesAction::Remove { id } => {
            api.remove(&id).await?;
            writeln!(out, "{id}\tunliked")?;
        }
    }

    Ok(())
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler");
            sig.recv().await;
            info!("received SIGTERM, shutting down");
            cancel_clone.cancel();
        });
    }

    cancel
}
