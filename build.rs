fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Prefer a system protoc when one is configured
    if std::env::var_os("PROTOC").is_none() {
        let protoc = protoc_bin_vendored::protoc_bin_path()
            .unwrap_or_else(|e| panic!("vendored protoc unavailable: {e:?}"));
        std::env::set_var("PROTOC", protoc);
    }

    tonic_build::configure()
        .build_server(false)
        .compile_protos(&["proto/localnetv1.proto"], &["proto"])
        .unwrap_or_else(|e| panic!("protobuf compile error: {e}"));

    Ok(())
}
