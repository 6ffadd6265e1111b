//! Interactive mode for the server.
//!
//! Prompts the user for the event database, bind address, and port before
//! starting the server.

use std::path::PathBuf;

use dialoguer::{Confirm, Input};

use crate::ServerConfig;

/// Runs the server in interactive mode, prompting for configuration.
///
/// Defaults come from the environment (see [`ServerConfig::from_env`]).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Crime Correlation Server");
    println!();

    let defaults = ServerConfig::from_env();

    let db_path: String = Input::new()
        .with_prompt("Event database")
        .default(defaults.db_path.display().to_string())
        .interact_text()
        .unwrap_or_else(|_| defaults.db_path.display().to_string());

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(defaults.bind_addr.clone())
        .interact_text()
        .unwrap_or_else(|_| defaults.bind_addr.clone());

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(defaults.port)
        .interact_text()
        .unwrap_or(defaults.port);

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_with_config(ServerConfig {
        db_path: PathBuf::from(db_path),
        bind_addr,
        port,
    })
    .await
}
