//! Prints an argon2 hash for seeding the `admins` table.
//!
//! Usage: `hash-password <password>` or pipe the password on stdin.

use std::io::{self, BufRead};

use anyhow::{bail, Context};
use tripdesk_api::auth::hash_password;

fn main() -> anyhow::Result<()> {
    let password = match std::env::args().nth(1) {
        Some(p) => p,
        None => {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).context("Failed to read password")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let hash = hash_password(&password).context("Failed to hash password")?;
    println!("{}", hash);
    Ok(())
}
