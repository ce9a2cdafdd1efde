use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wpsite")]
#[command(author = "wpsite contributors")]
#[command(version)]
#[command(about = "Converge a WordPress site's plugins, themes, options and users through wp-cli", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: <config dir>/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Tracked state file (default: <state dir>/state.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub state: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the `[connection]` section of the config file
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Run wp-cli over ssh (user@host, docker:container, ...)
    #[arg(long, global = true, value_name = "TARGET")]
    pub ssh: Option<String>,

    /// WordPress path on the target
    #[arg(long, global = true, value_name = "PATH")]
    pub path: Option<String>,

    /// Pass --allow-root to wp-cli
    #[arg(long, global = true)]
    pub allow_root: bool,

    /// wp-cli executable
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub wp: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage plugins
    #[command(subcommand)]
    Plugin(PackageCommand),

    /// Manage themes
    #[command(subcommand)]
    Theme(PackageCommand),

    /// Manage individual wp_options entries
    #[command(name = "option", subcommand)]
    Options(OptionCommand),

    /// Manage general site settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Manage user accounts
    #[command(subcommand)]
    User(UserCommand),

    /// List tracked records
    State {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Plugins and Themes
// ============================================================================

#[derive(Subcommand)]
pub enum PackageCommand {
    /// Install (or converge) and set activation
    Apply {
        /// Slug on wordpress.org
        slug: String,

        /// Request activation
        #[arg(long, conflicts_with = "inactive")]
        active: bool,

        /// Request deactivation
        #[arg(long)]
        inactive: bool,
    },

    /// Re-read the observed state of a tracked slug
    Read {
        slug: String,
    },

    /// Delete from the site and stop tracking
    Remove {
        slug: String,
    },
}

impl PackageCommand {
    /// Activation request from the `--active` / `--inactive` pair.
    pub fn requested_activation(active: bool, inactive: bool) -> Option<bool> {
        match (active, inactive) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

// ============================================================================
// Options and Settings
// ============================================================================

#[derive(Subcommand)]
pub enum OptionCommand {
    /// Set an option and read it back
    Set {
        name: String,
        value: String,
    },

    /// Read an option
    Get {
        name: String,
    },

    /// Delete an option and stop tracking it
    Delete {
        name: String,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Write the given settings and read them back
    Apply(SettingsArgs),

    /// Re-read tracked settings
    Read,

    /// Stop tracking settings (values stay on the site)
    Remove,
}

#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Site title (blogname)
    #[arg(long)]
    pub site_name: Option<String>,

    /// Tagline (blogdescription)
    #[arg(long)]
    pub site_description: Option<String>,

    /// Administration email
    #[arg(long)]
    pub admin_email: Option<String>,

    /// Timezone (e.g. Europe/Lisbon)
    #[arg(long)]
    pub timezone: Option<String>,

    /// PHP date format (e.g. "Y-m-d")
    #[arg(long)]
    pub date_format: Option<String>,

    /// PHP time format (e.g. "H:i")
    #[arg(long)]
    pub time_format: Option<String>,

    /// First day of the week (0 = Sunday)
    #[arg(long)]
    pub start_of_week: Option<String>,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create or update a user
    Apply(UserArgs),

    /// Check that a tracked user still exists
    Read {
        username: String,
    },

    /// Show a user's profile fields (tracked or not)
    Show {
        username: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a user and stop tracking it
    Remove {
        username: String,
    },
}

#[derive(Args, Debug)]
pub struct UserArgs {
    /// Login name
    pub username: String,

    /// Email address (required when creating; unchanged on update when omitted)
    #[arg(long)]
    pub email: Option<String>,

    /// Password (left unchanged on update when empty)
    #[arg(long, env = "WPSITE_USER_PASSWORD", hide_env_values = true, default_value = "")]
    pub password: String,

    /// Role slug (required when creating; unchanged on update when omitted)
    #[arg(long)]
    pub role: Option<String>,

    #[arg(long)]
    pub display_name: Option<String>,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,
}
