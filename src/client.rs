use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::BytesMut;
use tonic::{
    transport::{Channel, Endpoint},
    Request,
};
use tracing::{debug, error, info};

use crate::{
    common::ClientConfig,
    error::BenchError,
    message::{DataRequest, DataServiceClient},
    tls,
};

/// Bytes in one GiB.
pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// One measured trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialResult {
    /// Bytes received over the whole stream.
    pub bytes: u64,
    /// Time from issuing the request until the stream was drained.
    pub elapsed: Duration,
}

impl TrialResult {
    /// Throughput in GiB/s. A trial that moved nothing, or too fast for the
    /// clock to register, counts as zero.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if self.bytes == 0 || secs == 0.0 {
            return 0.0;
        }
        self.bytes as f64 / GIB / secs
    }
}

/// Throughputs of all trials of one benchmark run, in trial order.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    throughputs: Vec<f64>,
}

impl BenchmarkReport {
    pub fn new(throughputs: Vec<f64>) -> Self {
        Self { throughputs }
    }

    pub fn throughputs(&self) -> &[f64] {
        &self.throughputs
    }

    /// Unweighted arithmetic mean of the trial throughputs in GiB/s.
    pub fn mean(&self) -> f64 {
        if self.throughputs.is_empty() {
            return 0.0;
        }
        self.throughputs.iter().sum::<f64>() / self.throughputs.len() as f64
    }
}

/// Runs a single stream-and-measure cycle.
#[async_trait]
pub trait TrialRunner: Send {
    async fn run_trial(&mut self) -> Result<TrialResult, BenchError>;
}

/// Run `ntimes` sequential trials and average their throughput.
///
/// The first failing trial aborts the run; remaining trials are not attempted.
pub async fn run_benchmark<R>(runner: &mut R, ntimes: usize) -> Result<BenchmarkReport, BenchError>
where
    R: TrialRunner + ?Sized,
{
    if ntimes == 0 {
        return Err(BenchError::InvalidConfig(
            "ntimes must be at least 1".to_string(),
        ));
    }

    let mut throughputs = Vec::with_capacity(ntimes);
    for trial in 1..=ntimes {
        let result = match runner.run_trial().await {
            Ok(result) => result,
            Err(err) => {
                error!(
                    "Encountered an unexpected error in trial {}/{}: {}",
                    trial, ntimes, err
                );
                return Err(err);
            }
        };
        let throughput = result.throughput();
        info!("trial {}/{}: {:.6} GiB/s", trial, ntimes, throughput);
        throughputs.push(throughput);
    }

    Ok(BenchmarkReport::new(throughputs))
}

/// The benchmark client. One channel is opened and reused by every trial.
pub struct BenchClient {
    client: DataServiceClient<Channel>,
    verbose: bool,
}

impl BenchClient {
    /// Connect to `config.target`, over TLS when the config asks for it.
    pub async fn connect(config: &ClientConfig) -> Result<Self, BenchError> {
        let mut endpoint = Endpoint::from_shared(config.endpoint_uri())?;
        if let Some(connect_timeout) = config.timeout_options.connect_timeout {
            endpoint = endpoint.connect_timeout(connect_timeout);
        }
        if let Some(request_timeout) = config.timeout_options.request_timeout {
            endpoint = endpoint.timeout(request_timeout);
        }

        if config.options.secure {
            info!("Running client in TLS mode.");
            endpoint = endpoint.tls_config(tls::client_tls_config(&config.tls)?)?;
        } else {
            info!("Running client w/o TLS.");
        }

        let channel = endpoint.connect().await?;
        // An unchunked server sends the whole payload as one message.
        let client = DataServiceClient::new(channel).max_decoding_message_size(usize::MAX);
        Ok(Self {
            client,
            verbose: config.options.verbose,
        })
    }

    /// Stream the payload once and return it whole.
    pub async fn fetch_payload(&mut self) -> Result<BytesMut, BenchError> {
        let mut stream = self
            .client
            .give_me_data(Request::new(DataRequest {}))
            .await?
            .into_inner();

        let mut payload = BytesMut::new();
        while let Some(response) = stream.message().await? {
            payload.extend_from_slice(&response.data);
        }
        Ok(payload)
    }
}

#[async_trait]
impl TrialRunner for BenchClient {
    async fn run_trial(&mut self) -> Result<TrialResult, BenchError> {
        let start = Instant::now();
        let mut stream = self
            .client
            .give_me_data(Request::new(DataRequest {}))
            .await?
            .into_inner();

        let mut bytes = 0u64;
        while let Some(response) = stream.message().await? {
            if self.verbose {
                debug!("Received {} bytes", response.data.len());
            }
            bytes += response.data.len() as u64;
        }
        let elapsed = start.elapsed();

        info!("got {} b in {} ms", bytes, elapsed.as_millis());
        Ok(TrialResult { bytes, elapsed })
    }
}
