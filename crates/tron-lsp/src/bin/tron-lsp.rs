//! Tron LSP Server Binary Entry Point

use tower_lsp::Server;
use tron_lsp::create_lsp_service;
use tron_lsp::state::GlobalState;

#[tokio::main]
async fn main() {
    // stdout carries the protocol, logs go to stderr
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("tron_lsp=info,tron_core=info"),
    )
    .target(env_logger::Target::Stderr)
    .init();

    log::info!("tron-lsp {} listening on stdio", env!("CARGO_PKG_VERSION"));

    let state = GlobalState::new();
    let (service, socket) = create_lsp_service(state.clone());
    Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
        .serve(service)
        .await;

    let code = state.lifecycle.exit();
    log::info!("connection closed, exiting with code {}", code);
    std::process::exit(code);
}
