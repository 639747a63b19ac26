use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use holdingsapp::model::Theme;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "holdings", bin_name = "holdings", version)]
#[command(about = "Keep track of the things you own", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Read configuration from this TOML file
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List items
    #[command(alias = "ls", display_order = 1)]
    List {
        /// Only items in this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show one item
    #[command(display_order = 2)]
    Show { id: String },

    /// Add an item
    #[command(display_order = 3)]
    Add(AddArgs),

    /// Remove an item
    #[command(alias = "rm", display_order = 4)]
    Remove { id: String },

    /// List or manage categories
    #[command(display_order = 10)]
    Categories {
        #[command(subcommand)]
        action: Option<CategoryCommands>,
    },

    /// Show or change settings
    #[command(display_order = 11)]
    Settings {
        #[command(subcommand)]
        action: Option<SettingsCommands>,
    },

    /// Show or change the profile
    #[command(display_order = 12)]
    Profile {
        #[command(subcommand)]
        action: Option<ProfileCommands>,
    },

    /// Write a backup of everything to a JSON file
    #[command(display_order = 20)]
    Export {
        /// Destination file (prints to stdout if omitted)
        file: Option<PathBuf>,
    },

    /// Restore a backup file
    #[command(display_order = 21)]
    Import { file: PathBuf },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Item name
    pub name: String,

    #[arg(short, long, default_value = "Other")]
    pub category: String,

    #[arg(short, long, default_value = "")]
    pub location: String,

    /// Date last used, YYYY-MM-DD (defaults to today)
    #[arg(long, value_name = "DATE")]
    pub last_used: Option<NaiveDate>,

    #[arg(long)]
    pub price_paid: Option<f64>,

    #[arg(long)]
    pub price_expected: Option<f64>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Image URL or path
    #[arg(long)]
    pub image: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories (built-in first)
    List {
        /// Only user-created categories
        #[arg(long)]
        user: bool,
    },
    /// Register a category
    Add { name: String },
    /// Delete a user category; its items move to "Other"
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    Show,
    /// Change one or more settings
    Set {
        #[arg(long)]
        currency: Option<String>,

        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,

        #[arg(long)]
        notifications: Option<bool>,

        #[arg(long)]
        onboarding_completed: Option<bool>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    Show,
    /// Change one or more profile fields
    Set {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long, conflicts_with = "clear_avatar")]
        avatar: Option<String>,

        /// Remove the avatar
        #[arg(long)]
        clear_avatar: bool,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
    Auto,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Auto => Theme::Auto,
        }
    }
}
