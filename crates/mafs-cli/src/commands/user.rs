//! User account helpers.

use clap::{Args, Subcommand};

use mafs_auth::PasswordHasher;
use mafs_core::error::AppError;

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Print an Argon2 hash suitable for the `users.password_hash` column
    HashPassword {
        /// Plain-text password
        password: String,
    },
}

/// Execute user commands
pub fn execute(args: &UserArgs) -> Result<(), AppError> {
    match &args.command {
        UserCommand::HashPassword { password } => {
            if password.is_empty() {
                return Err(AppError::validation("Password cannot be empty"));
            }
            println!("{}", PasswordHasher::new().hash_password(password)?);
            Ok(())
        }
    }
}
