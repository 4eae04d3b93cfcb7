//! gRPC implementation of [`RegisterClient`] on top of a tonic channel.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

use super::proto::{
    self, read_register_request::DataType, read_register_response, ReadBoolRequest,
    ReadBoolResponse, ReadRegisterRequest, ReadRegisterResponse,
};
use super::{ClientError, RegisterClient, RegisterValue, RegisterVariant};

/// Client for the PCD gateway. Cheap to clone, all clones share one HTTP/2 connection.
#[derive(Clone, Debug)]
pub struct GrpcRegisterClient {
    channel: Channel,
}

impl GrpcRegisterClient {
    /// Creates a client that connects on first use.
    ///
    /// The address must be a plaintext `http://host:port` URI; the gateway speaks
    /// HTTP/2 without TLS.
    pub fn connect_lazy(addr: &str, connect_timeout: Duration) -> Result<Self, ClientError> {
        let endpoint = Endpoint::from_shared(addr.to_string())
            .map_err(|e| ClientError::InvalidAddress {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?
            .connect_timeout(connect_timeout);

        info!("{} client configured for {}", proto::SERVICE, addr);
        Ok(Self {
            channel: endpoint.connect_lazy(),
        })
    }

    async fn unary<Req, Resp>(
        &self,
        path: &'static str,
        message: Req,
        deadline: Instant,
    ) -> Result<Resp, ClientError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| ClientError::NotReady(e.to_string()))?;

        let mut request = tonic::Request::new(message);
        request.set_timeout(deadline.saturating_duration_since(Instant::now()));

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let response = grpc
            .unary(request, PathAndQuery::from_static(path), codec)
            .await?;
        debug!("{} completed", path);
        Ok(response.into_inner())
    }

    async fn read_bool(
        &self,
        path: &'static str,
        address: u32,
        deadline: Instant,
    ) -> Result<bool, ClientError> {
        let response: ReadBoolResponse = self
            .unary(path, ReadBoolRequest { address }, deadline)
            .await?;
        Ok(response.value)
    }
}

/// The gateway only looks at which oneof member is set, so the member carries
/// its zero value.
fn register_request(address: u32, variant: RegisterVariant) -> ReadRegisterRequest {
    let data_type = match variant {
        RegisterVariant::Integer => DataType::AsInt(false),
        RegisterVariant::Float => DataType::AsFloat(false),
    };
    ReadRegisterRequest {
        address,
        data_type: Some(data_type),
    }
}

#[async_trait]
impl RegisterClient for GrpcRegisterClient {
    async fn read_register(
        &self,
        address: u32,
        variant: RegisterVariant,
        deadline: Instant,
    ) -> Result<RegisterValue, ClientError> {
        let request = register_request(address, variant);
        let response: ReadRegisterResponse = self
            .unary(proto::READ_REGISTER_PATH, request, deadline)
            .await?;

        match response.value {
            Some(read_register_response::Value::IntValue(v)) => Ok(RegisterValue::Integer(v)),
            Some(read_register_response::Value::FloatValue(v)) => Ok(RegisterValue::Float(v)),
            None => Err(ClientError::EmptyReply(address)),
        }
    }

    async fn read_flag(&self, address: u32, deadline: Instant) -> Result<bool, ClientError> {
        self.read_bool(proto::READ_FLAG_PATH, address, deadline).await
    }

    async fn read_input(&self, address: u32, deadline: Instant) -> Result<bool, ClientError> {
        self.read_bool(proto::READ_INPUT_PATH, address, deadline).await
    }

    async fn read_output(&self, address: u32, deadline: Instant) -> Result<bool, ClientError> {
        self.read_bool(proto::READ_OUTPUT_PATH, address, deadline).await
    }
}
