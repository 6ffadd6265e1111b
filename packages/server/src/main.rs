#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crime correlation engine.
//!
//! ```text
//! crime_corr_server               # settings from CRIME_DB_PATH / BIND_ADDR / PORT
//! crime_corr_server --interactive # prompt for settings
//! ```

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    if std::env::args().skip(1).any(|a| a == "--interactive" || a == "-i") {
        crime_corr_server::interactive::run().await
    } else {
        crime_corr_server::run_server().await
    }
}
