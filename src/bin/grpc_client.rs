use clap::Parser;
use grpc_stream_bench::{
    cli::{init_tracing, ClientArgs},
    client::{run_benchmark, BenchClient},
    common::ClientConfig,
    error::BenchError,
};
use tracing::error;

async fn run(config: ClientConfig) -> Result<(), BenchError> {
    let mut client = BenchClient::connect(&config).await?;
    let report = run_benchmark(&mut client, config.ntimes).await?;
    println!("Average throughput: {:.6} GiB/s", report.mean());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BenchError> {
    let args = ClientArgs::parse();
    init_tracing(args.verbose);

    if let Err(err) = run(ClientConfig::from(args)).await {
        error!("Benchmark failed: {}", err);
        return Err(err);
    }
    Ok(())
}
