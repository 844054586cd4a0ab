//! Interactive mode for the server.
//!
//! Prompts for the data source, bind address and port before starting the
//! server.

use dialoguer::{Confirm, Input, Select};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Sets `CRISIS_MAP_SOURCE` (and `CRISIS_MAP_API_URL` for the API source),
/// `BIND_ADDR` and `PORT` from the answers, then delegates to
/// [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Crisis Map Server");
    println!();

    let sources = ["fixture", "api"];
    let source_idx = Select::new()
        .with_prompt("Data source")
        .items(&sources)
        .default(0)
        .interact()
        .unwrap_or(0);
    let source = sources[source_idx];

    let api_url: Option<String> = (source == "api").then(|| {
        Input::new()
            .with_prompt("API base URL")
            .default("http://localhost:8000".to_string())
            .interact_text()
            .unwrap_or_else(|_| "http://localhost:8000".to_string())
    });

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default("127.0.0.1".to_string())
        .interact_text()
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port_str: String = Input::new()
        .with_prompt("Port")
        .default("8080".to_string())
        .interact_text()
        .unwrap_or_else(|_| "8080".to_string());

    // SAFETY: We are single-threaded at this point (before server starts) and
    // these variables are only read once during server initialisation.
    unsafe {
        std::env::set_var("CRISIS_MAP_SOURCE", source);
        if let Some(url) = &api_url {
            std::env::set_var("CRISIS_MAP_API_URL", url);
        }
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port_str);
    }

    if !Confirm::new()
        .with_prompt(format!("Serve {source} data on {bind_addr}:{port_str}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}
