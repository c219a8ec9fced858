//! Output device discovery and stream construction via cpal.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Output device information.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether this is the system default output.
    pub is_default: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Channel count of the device's default configuration.
    pub channels: u16,
}

/// List available output devices.
///
/// The order matches the numeric indices accepted by the device selector,
/// so `"1"` always refers to the second entry of this listing.
pub fn list_output_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device_name(&device) {
                let (default_sample_rate, channels) = device
                    .default_output_config()
                    .map(|c| (c.sample_rate(), c.channels()))
                    .unwrap_or((48000, 2));

                devices.push(AudioDevice {
                    name,
                    is_default: false,
                    default_sample_rate,
                    channels,
                });
            }
        }
    }

    if let Some(default) = host.default_output_device().and_then(|d| device_name(&d).ok())
        && let Some(found) = devices.iter_mut().find(|d| d.name == default)
    {
        found.is_default = true;
    }

    Ok(devices)
}

/// Channel count of the device's default output configuration.
pub(crate) fn output_channels(device: &Device) -> u16 {
    device
        .default_output_config()
        .map(|c| c.channels())
        .unwrap_or(2)
}

/// Resolve an output device from a selector, or fall back to the default.
pub(crate) fn resolve_output(selector: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();
    match selector {
        Some(selector) => find_output_device(&host, selector),
        None => host.default_output_device().ok_or(Error::NoDevice),
    }
}

/// Find an output device by index, exact name, or partial name.
///
/// The selector can be:
/// - A numeric index into the device listing (e.g., "0", "1")
/// - An exact device name
/// - A partial device name (case-insensitive)
fn find_output_device(host: &Host, selector: &str) -> Result<Device> {
    let devices: Vec<_> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();

    // Try parsing as index first
    if let Ok(index) = selector.parse::<usize>() {
        return devices.get(index).cloned().ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "output device index {index} (only {} devices available)",
                devices.len()
            ))
        });
    }

    // Try exact match
    for device in &devices {
        if device_name(device).is_ok_and(|n| n == selector) {
            return Ok(device.clone());
        }
    }

    // Try case-insensitive partial match
    let search = selector.to_lowercase();
    let mut matches: Vec<_> = devices
        .iter()
        .filter_map(|device| {
            device_name(device)
                .ok()
                .filter(|name| name.to_lowercase().contains(&search))
                .map(|name| (device.clone(), name))
        })
        .collect();

    match matches.len() {
        0 => Err(Error::DeviceNotFound(format!(
            "no output device matching '{selector}'"
        ))),
        1 => Ok(matches.remove(0).0),
        _ => {
            let names: Vec<_> = matches.iter().map(|(_, name)| name.as_str()).collect();
            tracing::warn!(
                selector,
                matches = ?names,
                "selector matches multiple output devices, using first"
            );
            Ok(matches.remove(0).0)
        }
    }
}

/// Build and start an output stream that pulls interleaved samples from
/// `render`.
///
/// The callback runs on the audio thread and receives the raw interleaved
/// buffer; channel fan-out is the caller's concern. The stream plays until
/// the returned handle is dropped.
pub(crate) fn spawn_output<F>(
    device: &Device,
    sample_rate: u32,
    buffer_size: u32,
    channels: u16,
    mut render: F,
) -> Result<Stream>
where
    F: FnMut(&mut [f32]) + Send + 'static,
{
    let config = cpal::StreamConfig {
        channels,
        sample_rate,
        buffer_size: cpal::BufferSize::Fixed(buffer_size),
    };

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| render(data),
            |err| tracing::error!(error = %err, "output stream error"),
            None,
        )
        .map_err(|e| Error::Stream(e.to_string()))?;

    stream.play().map_err(|e| Error::Stream(e.to_string()))?;
    tracing::info!(sample_rate, buffer_size, channels, "output stream started");

    Ok(stream)
}
