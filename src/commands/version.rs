use anyhow::Result;

pub fn execute() -> Result<()> {
    let gpu = if cfg!(feature = "nvml") { "nvml" } else { "none" };
    println!("perfscope version {} (gpu: {})", env!("CARGO_PKG_VERSION"), gpu);
    Ok(())
}
