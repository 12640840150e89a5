use std::env::var;
use std::io::Result;

fn main() -> Result<()> {
    // List of proto files containing a message definition
    let proto_files = &[
        // Services
        "proto/userservice.proto",
    ];

    // Name of the folder containing the proto definitions
    let proto_folder = "proto";
    let out_dir = var("OUT_DIR").expect("Missing OUT_DIR environment variable");
    let descriptors_path = format!("{}/descriptors.bin", out_dir);

    // Only the messages are needed, the gateway replaces the generated transport.
    tonic_prost_build::configure()
        .file_descriptor_set_path(descriptors_path)
        .build_client(false)
        .build_server(false)
        .compile_protos(proto_files, &[proto_folder])
        .unwrap();

    Ok(())
}
