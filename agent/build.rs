use vergen::{BuildBuilder, CargoBuilder, Emitter, RustcBuilder};

/// Exposes the build information printed by `hostmetrics-agent --version`:
/// `VERGEN_BUILD_TIMESTAMP`, `VERGEN_CARGO_DEBUG` and `VERGEN_RUSTC_SEMVER`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::default().build_timestamp(true).build()?;
    let cargo = CargoBuilder::default().debug(true).build()?;
    let rustc = RustcBuilder::default().semver(true).build()?;
    Emitter::default()
        .add_instructions(&build)?
        .add_instructions(&cargo)?
        .add_instructions(&rustc)?
        .emit()?;
    Ok(())
}
