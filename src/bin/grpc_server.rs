use clap::Parser;
use grpc_stream_bench::{
    cli::{init_tracing, ServerArgs},
    common::ServerConfig,
    error::BenchError,
    server::BenchServer,
    shutdown::{ctrl_c_signals, ShutdownController},
};
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), BenchError> {
    let args = ServerArgs::parse();
    init_tracing(args.verbose);

    let server = BenchServer::new(ServerConfig::from(args));
    let controller = ShutdownController::new(server.lifecycle());
    let signals = ctrl_c_signals();
    tokio::spawn(async move {
        if let Err(err) = controller.run(signals).await {
            error!("Shutdown failed: {}", err);
            if matches!(err, BenchError::ShutdownBeforeStart) {
                std::process::abort();
            }
        }
    });

    if let Err(err) = server.serve().await {
        error!("Server failed: {}", err);
        return Err(err);
    }
    Ok(())
}
