use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let outcome = spectral::run().context("spectral failed");
    spectral::core::logging::shutdown();
    if !outcome? {
        std::process::exit(spectral::EXIT_VALIDATION_FAILED);
    }
    Ok(())
}
