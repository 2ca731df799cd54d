//! Generates the `ipfs.v1.IPFSService` gRPC server and client stubs.
//!
//! Messages are hand-written `prost` structs in `src/service.rs`, so the
//! service is described here instead of in a `.proto` file and no `protoc`
//! is needed at build time.

use tonic_build::manual::{Builder, Method, Service};

const PACKAGE: &str = "ipfs.v1";
const SERVICE: &str = "IPFSService";

/// (method name, route name, message prefix)
const METHODS: &[(&str, &str, &str)] = &[
    ("upload_content", "UploadContent", "UploadContent"),
    ("upload_proto", "UploadProto", "UploadProto"),
    ("get_content", "GetContent", "GetContent"),
    ("get_proto", "GetProto", "GetProto"),
    ("pin_content", "PinContent", "PinContent"),
    ("unpin_content", "UnpinContent", "UnpinContent"),
    ("get_gateway_url", "GetGatewayURL", "GetGatewayUrl"),
];

fn main() {
    let service = METHODS
        .iter()
        .fold(
            Service::builder().name(SERVICE).package(PACKAGE),
            |builder, (name, route, message)| {
                builder.method(
                    Method::builder()
                        .name(*name)
                        .route_name(*route)
                        .input_type(format!("crate::service::{}Request", message))
                        .output_type(format!("crate::service::{}Response", message))
                        .codec_path("tonic::codec::ProstCodec")
                        .build(),
                )
            },
        )
        .build();

    Builder::new().compile(&[service]);

    println!("cargo:rerun-if-changed=build.rs");
}
