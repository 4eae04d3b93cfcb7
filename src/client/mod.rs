//! Remote register client capability.
//!
//! The collection engine only depends on the [`RegisterClient`] trait. The
//! production implementation talks gRPC to the PCD gateway, tests plug in
//! scripted doubles.

pub mod grpc;
pub mod proto;

use async_trait::async_trait;
use tokio::time::Instant;

pub use grpc::GrpcRegisterClient;

/// Interpretation requested for a register read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterVariant {
    Integer,
    Float,
}

/// Value returned by a register read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegisterValue {
    Integer(i32),
    Float(f32),
}

impl RegisterValue {
    pub fn as_f64(self) -> f64 {
        match self {
            RegisterValue::Integer(v) => f64::from(v),
            RegisterValue::Float(v) => f64::from(v),
        }
    }
}

/// Transport-level failure of a remote read.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid server address {addr}: {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("service not ready: {0}")]
    NotReady(String),

    #[error("rpc failed: {0}")]
    Status(tonic::Status),

    #[error("reply for address {0} carried no value")]
    EmptyReply(u32),
}

impl From<tonic::Status> for ClientError {
    fn from(status: tonic::Status) -> Self {
        ClientError::Status(status)
    }
}

impl ClientError {
    /// True when the remote side gave up because the request deadline passed.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, ClientError::Status(status) if status.code() == tonic::Code::DeadlineExceeded)
    }
}

/// Read operations exposed by the register service.
///
/// Every call receives the deadline of the collection cycle it belongs to.
/// Implementations may forward it to the remote side; callers enforce it
/// locally as well.
#[async_trait]
pub trait RegisterClient: Send + Sync {
    async fn read_register(
        &self,
        address: u32,
        variant: RegisterVariant,
        deadline: Instant,
    ) -> Result<RegisterValue, ClientError>;

    async fn read_flag(&self, address: u32, deadline: Instant) -> Result<bool, ClientError>;

    async fn read_input(&self, address: u32, deadline: Instant) -> Result<bool, ClientError>;

    async fn read_output(&self, address: u32, deadline: Instant) -> Result<bool, ClientError>;
}
