use tonic_build::manual::{Builder, Method, Service};

fn main() {
    // DataService has a single server-streaming method. The messages are
    // hand-written prost structs in src/message.rs, so no protoc is needed.
    let give_me_data = Method::builder()
        .name("give_me_data")
        .route_name("GiveMeData")
        .input_type("crate::message::DataRequest")
        .output_type("crate::message::DataResponse")
        .codec_path("tonic::codec::ProstCodec")
        .server_streaming()
        .build();

    let data_service = Service::builder()
        .name("DataService")
        .package("grpc_bench")
        .method(give_me_data)
        .build();

    Builder::new().compile(&[data_service]);
    println!("cargo:rerun-if-changed=build.rs");
}
