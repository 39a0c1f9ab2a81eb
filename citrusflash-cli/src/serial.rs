//! Serial port selection.
//!
//! The port comes from, in order: `--port` / `CITRUSFLASH_PORT`, the
//! configuration file, or the only serial port present on the host. Anything
//! else is a usage error; this tool never prompts.

use {
    crate::{CliError, config::Config},
    anyhow::Result,
    citrusflash::{NativePortEnumerator, PortEnumerator, PortInfo},
    log::{debug, info, warn},
    std::cmp::Ordering,
};

fn usage_err(message: impl Into<String>) -> anyhow::Error {
    CliError::Usage(message.into()).into()
}

/// Pick a port from an explicit name, the config, or the detected ports.
pub fn choose_port(
    explicit: Option<&str>,
    config: &Config,
    detected: Vec<PortInfo>,
) -> Result<String> {
    if let Some(port_name) = explicit {
        return Ok(port_name.to_string());
    }

    if let Some(port_name) = &config
        .connection
        .port
    {
        debug!("Using port from config: {port_name}");
        return Ok(port_name.clone());
    }

    match detected
        .len()
        .cmp(&1)
    {
        Ordering::Equal => {
            let Some(port) = detected
                .into_iter()
                .next()
            else {
                return Err(usage_err("no serial ports found; use --port"));
            };
            info!("Auto-selected port: {}", port.name);
            Ok(port.name)
        },
        Ordering::Greater => {
            let names: Vec<&str> = detected
                .iter()
                .map(|p| {
                    p.name
                        .as_str()
                })
                .collect();
            Err(usage_err(format!(
                "multiple serial ports found ({}); use --port",
                names.join(", ")
            )))
        },
        Ordering::Less => Err(usage_err("no serial ports found; use --port")),
    }
}

/// Resolve the serial port for a device command.
pub fn select_serial_port(explicit: Option<&str>, config: &Config) -> Result<String> {
    let detected = if explicit.is_some()
        || config
            .connection
            .port
            .is_some()
    {
        Vec::new()
    } else {
        NativePortEnumerator::list_ports().unwrap_or_else(|e| {
            warn!("Failed to list serial ports: {e}");
            Vec::new()
        })
    };
    choose_port(explicit, config, detected)
}
