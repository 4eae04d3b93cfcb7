//! Wire messages of the `saia.v1.SaiaPcdService` gRPC API.

/// Fully qualified gRPC service name.
pub const SERVICE: &str = "saia.v1.SaiaPcdService";

pub const READ_REGISTER_PATH: &str = "/saia.v1.SaiaPcdService/ReadRegister";
pub const READ_FLAG_PATH: &str = "/saia.v1.SaiaPcdService/ReadFlag";
pub const READ_INPUT_PATH: &str = "/saia.v1.SaiaPcdService/ReadInput";
pub const READ_OUTPUT_PATH: &str = "/saia.v1.SaiaPcdService/ReadOutput";

#[derive(Clone, PartialEq, prost::Message)]
pub struct ReadRegisterRequest {
    #[prost(uint32, tag = "1")]
    pub address: u32,
    #[prost(oneof = "read_register_request::DataType", tags = "2, 3")]
    pub data_type: Option<read_register_request::DataType>,
}

pub mod read_register_request {
    #[derive(Clone, Copy, PartialEq, prost::Oneof)]
    pub enum DataType {
        #[prost(bool, tag = "2")]
        AsInt(bool),
        #[prost(bool, tag = "3")]
        AsFloat(bool),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ReadRegisterResponse {
    #[prost(oneof = "read_register_response::Value", tags = "1, 2")]
    pub value: Option<read_register_response::Value>,
}

pub mod read_register_response {
    #[derive(Clone, Copy, PartialEq, prost::Oneof)]
    pub enum Value {
        #[prost(int32, tag = "1")]
        IntValue(i32),
        #[prost(float, tag = "2")]
        FloatValue(f32),
    }
}

/// Request shared by the flag, input and output reads.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ReadBoolRequest {
    #[prost(uint32, tag = "1")]
    pub address: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ReadBoolResponse {
    #[prost(bool, tag = "1")]
    pub value: bool,
}
