//! # User Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide protobuf message types
//! and a descriptor set for exercising `protogate` in tests and in the demo server.
//! It is not intended for production use.
use prost_reflect::{DescriptorPool, MessageDescriptor, ReflectMessage};
use std::sync::LazyLock;

pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/userservice.rs"));
}

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("descriptors");

/// Fully qualified name of the example service.
pub const SERVICE_NAME: &str = "userservice.UserService";

static DESCRIPTOR_POOL: LazyLock<DescriptorPool> = LazyLock::new(|| {
    DescriptorPool::decode(FILE_DESCRIPTOR_SET).expect("embedded descriptor set is valid")
});

/// The descriptor pool built from the embedded `FILE_DESCRIPTOR_SET`.
pub fn descriptor_pool() -> &'static DescriptorPool {
    &DESCRIPTOR_POOL
}

// prost does not know about descriptors, so we wire every generated message to the pool.
macro_rules! reflect_messages {
    ($($ty:ident => $full_name:literal),* $(,)?) => {
        $(
            impl ReflectMessage for pb::$ty {
                fn descriptor(&self) -> MessageDescriptor {
                    DESCRIPTOR_POOL
                        .get_message_by_name($full_name)
                        .expect(concat!("message ", $full_name, " is defined in the descriptor set"))
                }
            }
        )*
    };
}

reflect_messages! {
    LoginReq => "userservice.LoginReq",
    LoginResp => "userservice.LoginResp",
    UserInfo => "userservice.UserInfo",
    IsAuthorizedReq => "userservice.IsAuthorizedReq",
    IsAuthorizedResp => "userservice.IsAuthorizedResp",
    Session => "userservice.Session",
}
