use std::{
    future::Future,
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use tokio::{net::TcpListener, sync::watch};
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{transport::Server, Request, Response, Status};
use tracing::{debug, info};

use crate::{
    common::ServerConfig,
    error::BenchError,
    message::{DataRequest, DataResponse, DataService, DataServiceServer},
    payload::Payload,
    streamer::{ChunkStreamer, ResponseSink, StreamOutcome},
    tls,
};

/// Where the server is in its life. Variants are ordered by progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Generating the payload, no listener yet.
    Initializing,
    /// Accepting streams.
    Serving,
    /// Refusing new streams, draining in-flight ones.
    ShuttingDown,
    Stopped,
}

/// Shared server state, owned jointly by the serving path and the signal path.
///
/// Every transition goes through the watch channel, so concurrent callers
/// observe a single ordered sequence of states.
#[derive(Debug)]
pub struct Lifecycle {
    state: watch::Sender<LifecycleState>,
    in_flight: AtomicUsize,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LifecycleState::Initializing);
        Self {
            state,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Number of streams currently being served.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Initializing -> Serving. Returns false from any other state.
    pub fn mark_serving(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == LifecycleState::Initializing {
                *state = LifecycleState::Serving;
                true
            } else {
                false
            }
        })
    }

    pub fn mark_stopped(&self) {
        self.state.send_if_modified(|state| {
            if *state == LifecycleState::Stopped {
                false
            } else {
                *state = LifecycleState::Stopped;
                true
            }
        });
    }

    /// Wait until the lifecycle reaches `target` or any later state.
    pub async fn wait_for(&self, target: LifecycleState) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the wait cannot fail.
        rx.wait_for(|state| *state >= target).await.ok();
    }

    /// Resolves once shutdown has been requested. Handed to the transport as
    /// its graceful shutdown signal.
    pub fn shutdown_requested(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.state.subscribe();
        async move {
            // A dropped lifecycle also ends serving.
            rx.wait_for(|state| *state >= LifecycleState::ShuttingDown)
                .await
                .ok();
        }
    }

    /// Begin graceful shutdown and wait until the server has stopped.
    ///
    /// Concurrent and repeated calls collapse into one transition; all of them
    /// return once the server is stopped. Fails if the server never started.
    pub async fn shutdown(&self) -> Result<(), BenchError> {
        let mut previous = LifecycleState::Initializing;
        self.state.send_if_modified(|state| {
            previous = *state;
            if *state == LifecycleState::Serving {
                *state = LifecycleState::ShuttingDown;
                true
            } else {
                false
            }
        });

        match previous {
            LifecycleState::Initializing => return Err(BenchError::ShutdownBeforeStart),
            LifecycleState::Serving => {
                info!("Shutting down, {} streams in flight", self.in_flight())
            }
            LifecycleState::ShuttingDown | LifecycleState::Stopped => {
                debug!("Shutdown already in progress")
            }
        }

        let mut rx = self.state.subscribe();
        rx.wait_for(|state| *state == LifecycleState::Stopped)
            .await
            .map(|_| ())
            .map_err(|err| BenchError::InternalError(err.to_string()))
    }

    fn stream_started(self: &Arc<Self>) -> StreamGuard {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        StreamGuard {
            lifecycle: self.clone(),
        }
    }
}

/// Counts one in-flight stream until dropped.
struct StreamGuard {
    lifecycle: Arc<Lifecycle>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.lifecycle.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// The `DataService` implementation: every call streams the same payload.
pub struct BenchService {
    payload: Payload,
    streamer: ChunkStreamer,
    stream_buffer: usize,
    lifecycle: Arc<Lifecycle>,
}

impl BenchService {
    pub fn new(
        payload: Payload,
        streamer: ChunkStreamer,
        stream_buffer: usize,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        Self {
            payload,
            streamer,
            stream_buffer,
            lifecycle,
        }
    }
}

#[tonic::async_trait]
impl DataService for BenchService {
    type GiveMeDataStream = flume::r#async::RecvStream<'static, Result<DataResponse, Status>>;

    async fn give_me_data(
        &self,
        request: Request<DataRequest>,
    ) -> Result<Response<Self::GiveMeDataStream>, Status> {
        if self.lifecycle.state() != LifecycleState::Serving {
            return Err(Status::unavailable("server is shutting down"));
        }
        debug!("GiveMeData() from {:?}", request.remote_addr());
        info!("Streaming {} bytes of data", self.payload.len());

        let (tx, rx) = flume::bounded(self.stream_buffer);
        let payload = self.payload.clone();
        let streamer = self.streamer;
        let guard = self.lifecycle.stream_started();
        tokio::spawn(async move {
            let _guard = guard;
            let sink = ResponseSink::new(tx);
            match streamer.stream(&payload, &sink).await {
                StreamOutcome::Completed { chunks, bytes } => {
                    debug!("Stream completed: {} chunks, {} bytes", chunks, bytes);
                }
                StreamOutcome::Disconnected { chunks, bytes } => {
                    info!(
                        "Client disconnected after {} chunks, {} bytes",
                        chunks, bytes
                    );
                }
            }
        });

        Ok(Response::new(rx.into_stream()))
    }
}

/// The benchmark server definition.
pub struct BenchServer {
    config: ServerConfig,
    lifecycle: Arc<Lifecycle>,
}

impl BenchServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            lifecycle: Arc::new(Lifecycle::new()),
        }
    }

    /// Handle used by the shutdown path.
    pub fn lifecycle(&self) -> Arc<Lifecycle> {
        self.lifecycle.clone()
    }

    /// Generate the payload and load TLS material, then bind
    /// `0.0.0.0:<port>` and serve until shutdown completes. The port is only
    /// bound once the service is ready to answer.
    pub async fn serve(self) -> Result<(), BenchError> {
        let (builder, service) = self.prepare()?;
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = TcpListener::bind(addr).await?;
        self.run(builder, service, listener).await
    }

    /// Serve on an already bound listener until shutdown completes.
    pub async fn serve_with_listener(self, listener: TcpListener) -> Result<(), BenchError> {
        let (builder, service) = self.prepare()?;
        self.run(builder, service, listener).await
    }

    /// Everything that can fail at startup, in the Initializing state.
    fn prepare(&self) -> Result<(Server, BenchService), BenchError> {
        self.config.validate()?;
        let options = self.config.options;
        let streamer = ChunkStreamer::new(self.config.chunk_policy()?, options.verbose);

        let mut builder = Server::builder();
        if options.secure {
            info!("Setting up server in TLS mode.");
            builder = builder.tls_config(tls::server_tls_config(&self.config.tls)?)?;
        } else {
            info!("Setting up server w/o TLS.");
        }

        info!(
            "Initializing service with data size of {}",
            self.config.payload_size
        );
        let payload = Payload::generate(self.config.payload_size)?;
        let service = BenchService::new(
            payload,
            streamer,
            self.config.stream_buffer,
            self.lifecycle.clone(),
        );
        Ok((builder, service))
    }

    async fn run(
        self,
        mut builder: Server,
        service: BenchService,
        listener: TcpListener,
    ) -> Result<(), BenchError> {
        let local_addr = listener.local_addr()?;
        let router = builder.add_service(DataServiceServer::new(service));
        if !self.lifecycle.mark_serving() {
            return Err(BenchError::InternalError(
                "server lifecycle already left initialization".to_string(),
            ));
        }
        info!("Server listening on {}", local_addr);

        let result = router
            .serve_with_incoming_shutdown(
                TcpListenerStream::new(listener),
                self.lifecycle.shutdown_requested(),
            )
            .await;
        self.lifecycle.mark_stopped();
        info!("Server stopped");
        result.map_err(BenchError::from)
    }
}
