use clap::Parser;
use std::sync::Arc;
use tokio::sync::Notify;

mod config;
mod handler;
mod http;
mod logger;
mod server;
mod storage;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = config::Cli::parse();
    let cfg = config::Config::load(&cli)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let state = Arc::new(config::AppState::new(cfg)?);

    let root = state.resolver.root();
    match tokio::fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => logger::log_warning(&format!("Root {} is not a directory", root.display())),
        Err(e) => logger::log_warning(&format!("Root {} is not accessible: {e}", root.display())),
    }

    let listener = server::create_listener(addr)?;
    logger::log_server_start(&addr, root, &state.config);

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));
    server::start_server_loop(listener, state, shutdown).await?;
    Ok(())
}
