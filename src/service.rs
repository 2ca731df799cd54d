//! IPFS RPC service
//!
//! Validates requests, applies filename defaults, delegates to the configured
//! [`IpfsClient`] and maps failures to RPC status codes:
//!
//! | Operation      | Empty required field | Backend failure |
//! |----------------|----------------------|-----------------|
//! | UploadContent  | `InvalidArgument`    | `Internal`      |
//! | UploadProto    | `InvalidArgument`    | `Internal`      |
//! | GetContent     | `InvalidArgument`    | `NotFound`      |
//! | GetProto       | `InvalidArgument`    | `NotFound`      |
//! | PinContent     | `InvalidArgument`    | `Internal`      |
//! | UnpinContent   | `InvalidArgument`    | `Internal`      |
//! | GetGatewayURL  | `InvalidArgument`    | -               |
//!
//! Messages are `prost` structs shared by the gRPC server and the JSON
//! gateway. Fields follow proto3 rules: a missing field is its empty value.

use std::sync::Arc;

use prost::Message;
use serde::{Deserialize, Serialize};
use tonic::Status;
use tracing::debug;

use crate::client::IpfsClient;

/// Filename used when an UploadContent request has none
pub const DEFAULT_CONTENT_FILENAME: &str = "content";

/// Filename used when an UploadProto request has no type tag
pub const DEFAULT_PROTO_FILENAME: &str = "data.pb";

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadContentRequest {
    #[prost(bytes = "vec", tag = "1")]
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[prost(string, tag = "2")]
    pub filename: String,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadContentResponse {
    #[prost(string, tag = "1")]
    pub cid: String,
    #[prost(int64, tag = "2")]
    pub size_bytes: i64,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadProtoRequest {
    #[prost(bytes = "vec", tag = "1")]
    #[serde(with = "base64_bytes")]
    pub proto_data: Vec<u8>,
    #[prost(string, tag = "2")]
    pub proto_type: String,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadProtoResponse {
    #[prost(string, tag = "1")]
    pub cid: String,
    #[prost(int64, tag = "2")]
    pub size_bytes: i64,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetContentRequest {
    #[prost(string, tag = "1")]
    pub cid: String,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetContentResponse {
    #[prost(bytes = "vec", tag = "1")]
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[prost(int64, tag = "2")]
    pub size_bytes: i64,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetProtoRequest {
    #[prost(string, tag = "1")]
    pub cid: String,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetProtoResponse {
    #[prost(bytes = "vec", tag = "1")]
    #[serde(with = "base64_bytes")]
    pub proto_data: Vec<u8>,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PinContentRequest {
    #[prost(string, tag = "1")]
    pub cid: String,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct PinContentResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UnpinContentRequest {
    #[prost(string, tag = "1")]
    pub cid: String,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct UnpinContentResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetGatewayUrlRequest {
    #[prost(string, tag = "1")]
    pub cid: String,
}

#[derive(Clone, PartialEq, Message, Serialize, Deserialize)]
#[serde(default)]
pub struct GetGatewayUrlResponse {
    #[prost(string, tag = "1")]
    pub url: String,
}

/// RPC-facing IPFS service
#[derive(Clone)]
pub struct IpfsService {
    client: Arc<dyn IpfsClient>,
}

impl IpfsService {
    pub fn new(client: Arc<dyn IpfsClient>) -> Self {
        Self { client }
    }

    pub async fn upload_content(
        &self,
        req: UploadContentRequest,
    ) -> Result<UploadContentResponse, Status> {
        if req.data.is_empty() {
            return Err(Status::invalid_argument("data is required"));
        }

        let filename = if req.filename.is_empty() {
            DEFAULT_CONTENT_FILENAME
        } else {
            req.filename.as_str()
        };

        let result = self
            .client
            .upload(&req.data, filename)
            .await
            .map_err(|e| Status::internal(format!("failed to upload content: {}", e)))?;

        Ok(UploadContentResponse {
            cid: result.cid,
            size_bytes: clamp_size(result.size_bytes),
        })
    }

    pub async fn upload_proto(
        &self,
        req: UploadProtoRequest,
    ) -> Result<UploadProtoResponse, Status> {
        if req.proto_data.is_empty() {
            return Err(Status::invalid_argument("proto_data is required"));
        }

        let filename = proto_filename(&req.proto_type);

        let result = self
            .client
            .upload(&req.proto_data, &filename)
            .await
            .map_err(|e| Status::internal(format!("failed to upload proto: {}", e)))?;

        Ok(UploadProtoResponse {
            cid: result.cid,
            size_bytes: clamp_size(result.size_bytes),
        })
    }

    pub async fn get_content(&self, req: GetContentRequest) -> Result<GetContentResponse, Status> {
        require_cid(&req.cid)?;

        let data = self
            .client
            .get(&req.cid)
            .await
            .map_err(|e| Status::not_found(format!("failed to get content: {}", e)))?;

        // Size comes from the bytes actually returned, not backend metadata
        let size_bytes = clamp_size(data.len() as u64);
        Ok(GetContentResponse { data, size_bytes })
    }

    pub async fn get_proto(&self, req: GetProtoRequest) -> Result<GetProtoResponse, Status> {
        require_cid(&req.cid)?;

        let proto_data = self
            .client
            .get(&req.cid)
            .await
            .map_err(|e| Status::not_found(format!("failed to get proto: {}", e)))?;

        Ok(GetProtoResponse { proto_data })
    }

    pub async fn pin_content(&self, req: PinContentRequest) -> Result<PinContentResponse, Status> {
        require_cid(&req.cid)?;

        self.client
            .pin(&req.cid)
            .await
            .map_err(|e| Status::internal(format!("failed to pin content: {}", e)))?;

        Ok(PinContentResponse { success: true })
    }

    pub async fn unpin_content(
        &self,
        req: UnpinContentRequest,
    ) -> Result<UnpinContentResponse, Status> {
        require_cid(&req.cid)?;

        self.client
            .unpin(&req.cid)
            .await
            .map_err(|e| Status::internal(format!("failed to unpin content: {}", e)))?;

        Ok(UnpinContentResponse { success: true })
    }

    pub async fn get_gateway_url(
        &self,
        req: GetGatewayUrlRequest,
    ) -> Result<GetGatewayUrlResponse, Status> {
        require_cid(&req.cid)?;

        Ok(GetGatewayUrlResponse {
            url: self.client.gateway_url(&req.cid),
        })
    }
}

fn require_cid(cid: &str) -> Result<(), Status> {
    if cid.is_empty() {
        debug!("Rejected request without cid");
        return Err(Status::invalid_argument("cid is required"));
    }
    Ok(())
}

/// Filename for a structured upload: `<type>.pb`, or `data.pb` without a type
pub fn proto_filename(proto_type: &str) -> String {
    if proto_type.is_empty() {
        DEFAULT_PROTO_FILENAME.to_string()
    } else {
        format!("{}.pb", proto_type)
    }
}

fn clamp_size(size: u64) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}

/// Bytes fields travel as standard base64 strings in JSON
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]>,
        S: Serializer,
    {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
