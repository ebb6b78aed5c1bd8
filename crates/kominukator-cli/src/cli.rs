use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "kominukator",
    version,
    about = "Local multi-tab chat demo in the terminal"
)]
pub(crate) struct Cli {
    /// Directory holding the shared store and per-tab sessions.
    #[arg(long, global = true, env = "KOMINUKATOR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Name of this tab. Each tab has its own login session.
    #[arg(long, global = true, default_value = "default", env = "KOMINUKATOR_TAB")]
    pub tab: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    /// Log in, registering the nickname on first use.
    Login(LoginArgs),
    /// Log out of this tab.
    Logout,
    /// Show who is logged in on this tab.
    Whoami,
    /// List users with their presence.
    Users,
    /// Print a conversation.
    Read(ReadArgs),
    /// Send a message.
    Send(SendArgs),
    /// Delete one of your own messages.
    Delete {
        /// Id of the message to delete.
        id: String,
    },
    /// Follow a conversation live and type messages into it.
    Watch {
        /// Nickname of the peer for a direct chat (global chat if omitted).
        #[arg(long = "with")]
        with: Option<String>,
    },
}

#[derive(Args, Debug, PartialEq, Eq)]
pub(crate) struct LoginArgs {
    pub nickname: String,

    /// Avatar emoji.
    #[arg(long)]
    pub emoji: Option<String>,

    /// Avatar color, e.g. `#42A5F5`.
    #[arg(long)]
    pub color: Option<String>,

    /// Pick a random emoji and color.
    #[arg(long, conflicts_with_all = ["emoji", "color"])]
    pub random: bool,
}

#[derive(Args, Debug, PartialEq, Eq)]
pub(crate) struct ReadArgs {
    /// Nickname of the peer for a direct chat (global chat if omitted).
    #[arg(long = "with")]
    pub with: Option<String>,

    /// Print the visible messages as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, PartialEq, Eq)]
pub(crate) struct SendArgs {
    /// Message text.
    pub text: Option<String>,

    /// Nickname of the recipient (global chat if omitted).
    #[arg(long)]
    pub to: Option<String>,

    /// Id of the message being replied to.
    #[arg(long)]
    pub reply_to: Option<String>,

    /// File to attach.
    #[arg(long)]
    pub attach: Option<PathBuf>,
}
