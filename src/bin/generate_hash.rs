//! Prints an argon2 hash for a password, for seeding accounts by hand.
//!
//! ```text
//! cargo run --bin generate-hash -- admin123
//! ```

use anyhow::{Context, anyhow};
use attendance_tracker::auth::password::hash_password;

fn main() -> anyhow::Result<()> {
    let password = std::env::args()
        .nth(1)
        .context("usage: generate-hash <password>")?;

    let hashed = hash_password(&password).map_err(|e| anyhow!("Failed to hash password: {e}"))?;

    println!("Plain password: {password}");
    println!("Argon2 hash:    {hashed}");
    println!();
    println!("Store the hash in users.password_hash.");
    Ok(())
}
