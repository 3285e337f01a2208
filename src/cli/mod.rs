//! Command-line interface, parsed with clap.

mod commands;

use clap::{Parser, Subcommand};

/// Vitrine - company site with a blog, contact inbox and admin panel
#[derive(Parser)]
#[command(name = "vitrine")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server (requires JWT_SECRET)
    #[command(alias = "web")]
    Serve,

    /// Create the `admin` account from ADMIN_PASSWORD if it does not exist yet
    SeedAdmin,

    /// Replace the `admin` password with ADMIN_PASSWORD
    SetAdminPassword,

    /// Block an administrator account from logging in
    DeactivateAdmin {
        /// Account name
        #[arg(long, default_value = "admin")]
        username: String,
    },

    /// Allow a deactivated administrator account to log in again
    ActivateAdmin {
        /// Account name
        #[arg(long, default_value = "admin")]
        username: String,
    },

    /// Log in to a running server from the terminal
    Login {
        /// Base URL of the server
        #[arg(long, default_value = "http://localhost:3000")]
        url: String,

        /// Account name
        #[arg(long, default_value = "admin")]
        username: String,

        /// Page to return to after login
        #[arg(long)]
        redirect: Option<String>,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
