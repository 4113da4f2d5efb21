use candle_core::Device;
use tracing::{debug, info, warn};

use super::error::ScoringError;

const ENV_DEVICE: &str = "BOOKREC_DEVICE";

/// Where scoring and training tensors live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// First compiled-in accelerator that initialises, else CPU.
    #[default]
    Auto,
    /// Always CPU.
    Cpu,
    /// An accelerator is required; failure is an error.
    Gpu,
}

impl DevicePreference {
    /// Reads `BOOKREC_DEVICE` (`auto` | `cpu` | `gpu`); anything else is `Auto`.
    pub fn from_env() -> Self {
        match std::env::var(ENV_DEVICE)
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            Ok("cpu") => DevicePreference::Cpu,
            Ok("gpu") | Ok("cuda") | Ok("metal") => DevicePreference::Gpu,
            _ => DevicePreference::Auto,
        }
    }
}

/// Selects the compute device for `preference` and the enabled features.
pub fn select_device(preference: DevicePreference) -> Result<Device, ScoringError> {
    if preference == DevicePreference::Cpu {
        debug!("CPU device requested");
        return Ok(Device::Cpu);
    }

    match accelerator() {
        Ok(device) => Ok(device),
        Err(reason) if preference == DevicePreference::Gpu => {
            Err(ScoringError::DeviceUnavailable {
                device: "gpu".to_string(),
                reason,
            })
        }
        Err(reason) => {
            warn!(reason = %reason, "Falling back to CPU device");
            Ok(Device::Cpu)
        }
    }
}

#[allow(unused_mut)]
fn accelerator() -> Result<Device, String> {
    let mut failures: Vec<String> = Vec::new();

    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(device) => {
            info!("Using Metal GPU acceleration");
            return Ok(device);
        }
        Err(e) => failures.push(format!("metal failed: {e}")),
    }

    #[cfg(feature = "cuda")]
    match Device::new_cuda(0) {
        Ok(device) => {
            info!("Using CUDA GPU acceleration");
            return Ok(device);
        }
        Err(e) => failures.push(format!("cuda failed: {e}")),
    }

    if !cfg!(any(feature = "metal", feature = "cuda")) {
        info!("No GPU backend compiled");
        return Err("no GPU backend compiled".to_string());
    }

    Err(failures.join("; "))
}
