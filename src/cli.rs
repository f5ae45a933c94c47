use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shutter::{Color, OrderBy, Orientation, StoreConfig};

/// Browse the photo feed and manage likes from the terminal.
#[derive(Parser, Debug)]
#[command(name = "gallery", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Page through the photo feed with filters
    Browse(BrowseArgs),

    /// List or change the liked photos of a user
    Likes(LikesArgs),
}

/// Arguments for the `browse` subcommand.
#[derive(Parser, Debug)]
pub struct BrowseArgs {
    /// Ordering (latest, oldest, popular, views)
    #[arg(long, default_value = "latest")]
    pub order_by: OrderBy,

    /// Color filter (all, black_and_white, black, white, yellow, orange, red,
    /// purple, magenta, green, teal, blue)
    #[arg(long, default_value = "all")]
    pub color: Color,

    /// Orientation filter (all, landscape, portrait, squarish)
    #[arg(long, default_value = "all")]
    pub orientation: Orientation,

    /// Stop after this many pages
    #[arg(long, default_value = "3")]
    pub pages: u32,

    /// Manual retries of a page after its automatic attempts are used up
    #[arg(long, default_value = "1")]
    pub manual_retries: u32,

    /// Photos per page (1-30)
    #[arg(long, default_value = "20")]
    pub page_size: u32,

    /// Provider base URL
    #[arg(long, default_value = shutter::config::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Output as JSON lines instead of TSV
    #[arg(long)]
    pub json: bool,
}

/// Credentials shared by the `likes` actions.
#[derive(Args, Debug)]
pub struct Credentials {
    /// Username
    #[arg(long)]
    pub user: String,

    /// Password
    #[arg(long)]
    pub password: String,
}

/// Arguments for the `likes` subcommand.
#[derive(Parser, Debug)]
pub struct LikesArgs {
    #[command(flatten)]
    pub credentials: Credentials,

    /// Path of the likes file
    #[arg(long, default_value_os_t = StoreConfig::default().path)]
    pub store: PathBuf,

    #[command(subcommand)]
    pub action: LikesAction,
}

#[derive(Subcommand, Debug)]
pub enum LikesAction {
    /// Print liked photo ids
    List,

    /// Like or unlike a photo
    Toggle {
        /// Photo id
        id: String,
    },

    /// Unlike a photo
    Remove {
        /// Photo id
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_likes_store_defaults_to_store_config() {
        let cli = Cli::try_parse_from([
            "gallery", "likes", "--user", "muser1", "--password", "mpassword1", "list",
        ])
        .unwrap();
        let Command::Likes(args) = cli.command else {
            panic!("expected likes command");
        };
        assert_eq!(args.store, StoreConfig::default().path);
        assert!(matches!(args.action, LikesAction::List));
    }

    #[test]
    fn test_browse_parses_filters() {
        let cli = Cli::try_parse_from(["gallery", "browse", "--color", "teal", "--order-by", "views"])
            .unwrap();
        let Command::Browse(args) = cli.command else {
            panic!("expected browse command");
        };
        assert_eq!(args.color, Color::Teal);
        assert_eq!(args.order_by, OrderBy::Views);
        assert_eq!(args.orientation, Orientation::All);
        assert_eq!(args.manual_retries, 1);
    }
}
