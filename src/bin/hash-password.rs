//! Prints a bcrypt hash for ADMIN_HASH_PASSWORD.

use bcrypt::{hash, DEFAULT_COST};
use std::env;

fn main() {
    let password = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --bin hash-password <PASSWORD> [COST]");
        std::process::exit(1);
    });
    let cost = match env::args().nth(2) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            eprintln!("COST must be a number between 4 and 31");
            std::process::exit(1);
        }),
        None => DEFAULT_COST,
    };

    match hash(&password, cost) {
        Ok(hashed) => {
            println!("\nCost     : {}", cost);
            println!("Hash     : {}\n", hashed);
            println!("# Paste this into your .env (ADMIN_EMAIL names the account):");
            println!("ADMIN_HASH_PASSWORD={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
