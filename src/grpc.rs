//! gRPC transport for `ipfs.v1.IPFSService`
//!
//! The listener carries three services:
//!
//! - `ipfs.v1.IPFSService` - the storage RPCs
//! - `grpc.health.v1.Health` - reports `SERVING` for the server and for the
//!   storage service
//! - `grpc.reflection.v1alpha.ServerReflection` - lets `grpcurl` and similar
//!   tools discover the schema
//!
//! Request and response size are both capped at the configured message limit.

use std::sync::Arc;

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
};
use tonic::transport::server::Router;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::info_span;

use crate::error::Result;
use crate::service::*;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/ipfs.v1.IPFSService.rs"));
}

pub use generated::i_p_f_s_service_client::IPFSServiceClient as IpfsServiceClient;
pub use generated::i_p_f_s_service_server::IPFSServiceServer as IpfsServiceServer;
use generated::i_p_f_s_service_server::IPFSService;

/// Protobuf package of the storage service
pub const PACKAGE: &str = "ipfs.v1";

/// Fully-qualified RPC service name
pub const SERVICE_NAME: &str = "ipfs.v1.IPFSService";

/// Default message size limit (150 MiB, room for large media uploads)
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 150 * 1024 * 1024;

/// Adapts [`IpfsService`] to the generated server trait
#[derive(Clone)]
pub struct IpfsGrpc {
    service: Arc<IpfsService>,
}

impl IpfsGrpc {
    pub fn new(service: Arc<IpfsService>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl IPFSService for IpfsGrpc {
    async fn upload_content(
        &self,
        request: Request<UploadContentRequest>,
    ) -> std::result::Result<Response<UploadContentResponse>, Status> {
        self.service
            .upload_content(request.into_inner())
            .await
            .map(Response::new)
    }

    async fn upload_proto(
        &self,
        request: Request<UploadProtoRequest>,
    ) -> std::result::Result<Response<UploadProtoResponse>, Status> {
        self.service
            .upload_proto(request.into_inner())
            .await
            .map(Response::new)
    }

    async fn get_content(
        &self,
        request: Request<GetContentRequest>,
    ) -> std::result::Result<Response<GetContentResponse>, Status> {
        self.service
            .get_content(request.into_inner())
            .await
            .map(Response::new)
    }

    async fn get_proto(
        &self,
        request: Request<GetProtoRequest>,
    ) -> std::result::Result<Response<GetProtoResponse>, Status> {
        self.service
            .get_proto(request.into_inner())
            .await
            .map(Response::new)
    }

    async fn pin_content(
        &self,
        request: Request<PinContentRequest>,
    ) -> std::result::Result<Response<PinContentResponse>, Status> {
        self.service
            .pin_content(request.into_inner())
            .await
            .map(Response::new)
    }

    async fn unpin_content(
        &self,
        request: Request<UnpinContentRequest>,
    ) -> std::result::Result<Response<UnpinContentResponse>, Status> {
        self.service
            .unpin_content(request.into_inner())
            .await
            .map(Response::new)
    }

    async fn get_gateway_url(
        &self,
        request: Request<GetGatewayUrlRequest>,
    ) -> std::result::Result<Response<GetGatewayUrlResponse>, Status> {
        self.service
            .get_gateway_url(request.into_inner())
            .await
            .map(Response::new)
    }
}

/// Storage service with the message limit applied in both directions
pub fn ipfs_server(
    service: Arc<IpfsService>,
    max_message_bytes: usize,
) -> IpfsServiceServer<IpfsGrpc> {
    IpfsServiceServer::new(IpfsGrpc::new(service))
        .max_decoding_message_size(max_message_bytes)
        .max_encoding_message_size(max_message_bytes)
}

/// Build the gRPC router: storage, health and reflection services
pub async fn create_grpc_router(
    service: Arc<IpfsService>,
    max_message_bytes: usize,
) -> Result<Router> {
    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<IpfsServiceServer<IpfsGrpc>>()
        .await;

    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_file_descriptor_set(file_descriptor_set())
        .build()?;

    Ok(Server::builder()
        .trace_fn(|request| info_span!("grpc", path = %request.uri().path()))
        .add_service(health_service)
        .add_service(reflection_service)
        .add_service(ipfs_server(service, max_message_bytes)))
}

/// Schema of the storage service, served over reflection
pub fn file_descriptor_set() -> FileDescriptorSet {
    let cid = || field("cid", 1, Type::String);

    let messages = vec![
        message(
            "UploadContentRequest",
            vec![field("data", 1, Type::Bytes), field("filename", 2, Type::String)],
        ),
        message(
            "UploadContentResponse",
            vec![cid(), field("size_bytes", 2, Type::Int64)],
        ),
        message(
            "UploadProtoRequest",
            vec![
                field("proto_data", 1, Type::Bytes),
                field("proto_type", 2, Type::String),
            ],
        ),
        message(
            "UploadProtoResponse",
            vec![cid(), field("size_bytes", 2, Type::Int64)],
        ),
        message("GetContentRequest", vec![cid()]),
        message(
            "GetContentResponse",
            vec![field("data", 1, Type::Bytes), field("size_bytes", 2, Type::Int64)],
        ),
        message("GetProtoRequest", vec![cid()]),
        message("GetProtoResponse", vec![field("proto_data", 1, Type::Bytes)]),
        message("PinContentRequest", vec![cid()]),
        message("PinContentResponse", vec![field("success", 1, Type::Bool)]),
        message("UnpinContentRequest", vec![cid()]),
        message("UnpinContentResponse", vec![field("success", 1, Type::Bool)]),
        message("GetGatewayURLRequest", vec![cid()]),
        message("GetGatewayURLResponse", vec![field("url", 1, Type::String)]),
    ];

    let methods = [
        "UploadContent",
        "UploadProto",
        "GetContent",
        "GetProto",
        "PinContent",
        "UnpinContent",
        "GetGatewayURL",
    ]
    .into_iter()
    .map(|name| MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(format!(".{}.{}Request", PACKAGE, name)),
        output_type: Some(format!(".{}.{}Response", PACKAGE, name)),
        ..Default::default()
    })
    .collect();

    FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("ipfs/v1/ipfs.proto".to_string()),
            package: Some(PACKAGE.to_string()),
            message_type: messages,
            service: vec![ServiceDescriptorProto {
                name: Some("IPFSService".to_string()),
                method: methods,
                ..Default::default()
            }],
            syntax: Some("proto3".to_string()),
            ..Default::default()
        }],
    }
}

fn message(name: &str, field: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field,
        ..Default::default()
    }
}

fn field(name: &str, number: i32, kind: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(kind as i32),
        json_name: Some(json_name(name)),
        ..Default::default()
    }
}

/// lowerCamelCase JSON name protoc would assign
fn json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::server::NamedService;

    #[test]
    fn test_service_name_matches_route_prefix() {
        assert_eq!(
            <IpfsServiceServer<IpfsGrpc> as NamedService>::NAME,
            SERVICE_NAME
        );
    }

    #[test]
    fn test_json_name() {
        assert_eq!(json_name("size_bytes"), "sizeBytes");
        assert_eq!(json_name("cid"), "cid");
        assert_eq!(json_name("proto_data"), "protoData");
    }

    #[test]
    fn test_descriptor_covers_every_method() {
        let set = file_descriptor_set();
        let file = &set.file[0];
        let service = &file.service[0];

        assert_eq!(file.package.as_deref(), Some(PACKAGE));
        assert_eq!(service.method.len(), 7);

        let message_names: Vec<_> = file
            .message_type
            .iter()
            .filter_map(|m| m.name.as_deref())
            .collect();
        for method in &service.method {
            for ty in [&method.input_type, &method.output_type] {
                let ty = ty.as_deref().unwrap();
                let short = ty.trim_start_matches(".ipfs.v1.");
                assert!(message_names.contains(&short), "missing message {}", ty);
            }
        }
    }

    #[test]
    fn test_reflection_service_builds() {
        tonic_reflection::server::Builder::configure()
            .register_file_descriptor_set(file_descriptor_set())
            .build()
            .unwrap();
    }
}
