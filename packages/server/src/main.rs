#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crisis map API server binary.
//!
//! ```text
//! crisis_map_server                # configure from the environment
//! crisis_map_server --interactive  # prompt for source, address and port
//! ```

use clap::Parser;

#[derive(Parser)]
#[command(name = "crisis_map_server", about = "Serve the crisis map API")]
struct Cli {
    /// Prompt for the data source, bind address and port
    #[arg(long, short)]
    interactive: bool,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    if cli.interactive {
        crisis_map_server::interactive::run().await
    } else {
        crisis_map_server::run_server().await
    }
}
