fn main() -> std::io::Result<()> {
    match tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile(&["proto/qkv.proto"], &["proto/"])
    {
        Ok(()) => Ok(()),
        // `protoc` may be unavailable in offline environments; fall back to the
        // pre-generated output checked in alongside the .proto file.
        Err(e) if e.to_string().contains("protoc") => {
            println!("cargo:warning=protoc not found; using pre-generated proto/qkv.generated.rs");
            println!("cargo:rerun-if-changed=proto/qkv.generated.rs");
            let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR not set");
            std::fs::copy(
                "proto/qkv.generated.rs",
                std::path::Path::new(&out_dir).join("qkv.rs"),
            )?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}
