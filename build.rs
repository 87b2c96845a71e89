fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "server")]
    tonic_build::compile_protos("proto/refinement.proto")?;

    Ok(())
}
