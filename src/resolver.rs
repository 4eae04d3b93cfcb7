//! Turns one catalog entry into one remote read and a float value.

use std::future::Future;
use tokio::time::{timeout_at, Instant};

use crate::catalog::{MetricDefinition, RegisterKind};
use crate::client::{ClientError, RegisterClient, RegisterVariant};

/// Why a single register read produced no value.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("unknown register type: {0}")]
    UnknownRegisterKind(RegisterKind),

    #[error("remote call failed: {0}")]
    Remote(ClientError),

    #[error("cycle deadline exceeded")]
    Timeout,
}

impl ReadError {
    /// Label value used for the read error counter.
    pub fn kind(&self) -> &'static str {
        match self {
            ReadError::UnknownRegisterKind(_) => "unknown_register_kind",
            ReadError::Remote(_) => "remote",
            ReadError::Timeout => "timeout",
        }
    }
}

/// Reads the register described by `definition` and converts the reply.
///
/// The read fails with [`ReadError::Timeout`] if `deadline` has already passed
/// or passes while waiting for the reply.
pub async fn resolve(
    client: &dyn RegisterClient,
    definition: &MetricDefinition,
    deadline: Instant,
) -> Result<f64, ReadError> {
    let address = definition.address;
    match definition.register_kind {
        RegisterKind::Register => {
            let value = within(
                deadline,
                client.read_register(address, RegisterVariant::Integer, deadline),
            )
            .await?;
            Ok(value.as_f64())
        }
        RegisterKind::RegisterFloat => {
            let value = within(
                deadline,
                client.read_register(address, RegisterVariant::Float, deadline),
            )
            .await?;
            Ok(value.as_f64())
        }
        RegisterKind::Flag => within(deadline, client.read_flag(address, deadline))
            .await
            .map(bool_to_f64),
        RegisterKind::Input => within(deadline, client.read_input(address, deadline))
            .await
            .map(bool_to_f64),
        RegisterKind::Output => within(deadline, client.read_output(address, deadline))
            .await
            .map(bool_to_f64),
        kind @ (RegisterKind::Counter | RegisterKind::Timer) => {
            Err(ReadError::UnknownRegisterKind(kind))
        }
    }
}

async fn within<T, F>(deadline: Instant, call: F) -> Result<T, ReadError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    if Instant::now() >= deadline {
        return Err(ReadError::Timeout);
    }
    match timeout_at(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) if e.is_deadline_exceeded() => Err(ReadError::Timeout),
        Ok(Err(e)) => Err(ReadError::Remote(e)),
        Err(_) => Err(ReadError::Timeout),
    }
}

pub fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
