//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Genealogy roster manager: builds and renders family trees from parent/spouse records
#[derive(Parser, Debug)]
#[command(name = "famtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug level: -d info, -dd debug, -ddd trace
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Roster file (default: members_file from config)
    #[arg(short = 'f', long, global = true, env = "FAMTREE_FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the family tree
    Tree {
        /// Show only the family of this member (primary or spouse)
        #[arg(long)]
        focus: Option<String>,
        /// Print nested JSON instead of a text tree
        #[arg(long)]
        json: bool,
    },

    /// List the root couples
    Roots,

    /// List all members in roster order
    List,

    /// Report roster inconsistencies
    Check,

    /// Add a member
    Add(MemberArgs),

    /// Edit a member; only given fields change
    Edit {
        /// Member id
        id: String,
        #[command(flatten)]
        fields: MemberArgs,
        /// Remove the parent link
        #[arg(long, conflicts_with = "parent")]
        no_parent: bool,
        /// Remove the spouse link (and the spouse's link back)
        #[arg(long, conflicts_with = "spouse")]
        no_spouse: bool,
    },

    /// Remove a member; its children become roots
    Remove {
        /// Member id
        id: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Member fields shared by `add` and `edit`.
#[derive(Args, Debug, Default, Clone)]
pub struct MemberArgs {
    /// First name
    #[arg(long)]
    pub first: Option<String>,
    #[arg(long)]
    pub middle: Option<String>,
    /// Last name
    #[arg(long)]
    pub last: Option<String>,
    /// Maiden (birth) name
    #[arg(long)]
    pub maiden: Option<String>,
    #[arg(long)]
    pub nick: Option<String>,
    /// Birth date (YYYY-MM-DD)
    #[arg(long)]
    pub born: Option<String>,
    /// Death date (YYYY-MM-DD)
    #[arg(long)]
    pub died: Option<String>,
    #[arg(long)]
    pub photo: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    /// Parent member id
    #[arg(long)]
    pub parent: Option<String>,
    /// Spouse member id
    #[arg(long)]
    pub spouse: Option<String>,
    /// Position among siblings
    #[arg(long, allow_negative_numbers = true)]
    pub order: Option<i64>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Print a config template
    Template,
}
