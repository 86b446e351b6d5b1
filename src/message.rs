//! Wire messages of the `grpc_bench.DataService` service and the tonic
//! client/server stubs generated for it by `build.rs`.

/// Request for the payload. The server ignores its content.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DataRequest {}

/// One chunk of the payload.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DataResponse {
    /// The raw bytes of the chunk.
    #[prost(bytes = "bytes", tag = "1")]
    pub data: ::prost::bytes::Bytes,
}

include!(concat!(env!("OUT_DIR"), "/grpc_bench.DataService.rs"));

pub use data_service_client::DataServiceClient;
pub use data_service_server::{DataService, DataServiceServer};
