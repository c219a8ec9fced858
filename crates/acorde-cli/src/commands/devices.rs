//! Audio device listing command.

use acorde_io::list_output_devices;
use clap::Args;

#[derive(Args)]
pub struct DevicesArgs {}

pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let devices = list_output_devices()?;

    if devices.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }

    println!("Available Output Devices");
    println!("========================\n");

    for (idx, device) in devices.iter().enumerate() {
        let default = if device.is_default { " (default)" } else { "" };
        println!(
            "  [{}] {} ({} Hz, {} ch){}",
            idx, device.name, device.default_sample_rate, device.channels, default
        );
    }

    println!();
    println!("Tip: Use device index or partial name with --device:");
    println!("  acorde play --notes 60,64,67 --device 0");
    println!("  acorde play --notes 60,64,67 --device \"USB\"");

    Ok(())
}
