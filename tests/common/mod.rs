//! Scripted register client shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use saia_pcd_exporter::{ClientError, RegisterClient, RegisterValue, RegisterVariant};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Scripted answer for one address.
#[derive(Debug, Clone)]
pub enum Reply {
    Int(i32),
    Float(f32),
    Bool(bool),
    Fail,
    /// Answers with `Bool(true)` after the given delay.
    Slow(Duration),
}

/// A register client that answers from a fixed script and logs every call.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<HashMap<u32, Reply>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, address: u32, reply: Reply) -> Self {
        self.set(address, reply);
        self
    }

    pub fn set(&self, address: u32, reply: Reply) {
        self.replies.lock().unwrap().insert(address, reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn reply(&self, op: &str, address: u32) -> Result<Reply, ClientError> {
        self.calls.lock().unwrap().push(format!("{op}:{address}"));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&address)
            .cloned()
            .unwrap_or(Reply::Fail);

        let result = match reply {
            Reply::Fail => Err(ClientError::Status(tonic::Status::unavailable(
                "connection refused",
            ))),
            Reply::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(Reply::Bool(true))
            }
            other => Ok(other),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn to_bool(reply: Reply) -> Result<bool, ClientError> {
    match reply {
        Reply::Bool(b) => Ok(b),
        other => panic!("scripted reply {other:?} is not a boolean"),
    }
}

#[async_trait]
impl RegisterClient for ScriptedClient {
    async fn read_register(
        &self,
        address: u32,
        variant: RegisterVariant,
        _deadline: Instant,
    ) -> Result<RegisterValue, ClientError> {
        let op = match variant {
            RegisterVariant::Integer => "register_int",
            RegisterVariant::Float => "register_float",
        };
        match self.reply(op, address).await? {
            Reply::Int(v) => Ok(RegisterValue::Integer(v)),
            Reply::Float(v) => Ok(RegisterValue::Float(v)),
            other => panic!("scripted reply {other:?} is not a register value"),
        }
    }

    async fn read_flag(&self, address: u32, _deadline: Instant) -> Result<bool, ClientError> {
        to_bool(self.reply("flag", address).await?)
    }

    async fn read_input(&self, address: u32, _deadline: Instant) -> Result<bool, ClientError> {
        to_bool(self.reply("input", address).await?)
    }

    async fn read_output(&self, address: u32, _deadline: Instant) -> Result<bool, ClientError> {
        to_bool(self.reply("output", address).await?)
    }
}
