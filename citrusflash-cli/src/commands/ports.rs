//! Serial port listing.

use {
    anyhow::Result,
    citrusflash::{NativePortEnumerator, PortEnumerator, PortInfo},
    console::style,
    log::warn,
};

fn detect_ports() -> Vec<PortInfo> {
    NativePortEnumerator::list_ports().unwrap_or_else(|e| {
        warn!("Failed to list serial ports: {e}");
        Vec::new()
    })
}

/// One human-readable line for a port.
fn describe(port: &PortInfo) -> String {
    let mut line = style(&port.name)
        .cyan()
        .to_string();
    if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
        line.push_str(&format!(" ({vid:04X}:{pid:04X})"));
    }
    let product = port
        .product
        .as_deref()
        .or(port
            .manufacturer
            .as_deref());
    if let Some(product) = product {
        line.push_str(&format!(" - {}", style(product).dim()));
    }
    line
}

/// List serial ports, as JSON on stdout or as a table on stderr.
pub(crate) fn cmd_list_ports(json: bool) -> Result<()> {
    let ports = detect_ports();

    if json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
        return Ok(());
    }

    eprintln!(
        "{}",
        style("Available serial ports:")
            .bold()
            .underlined()
    );
    if ports.is_empty() {
        eprintln!("  {}", style("No serial ports found").dim());
    } else {
        for port in &ports {
            eprintln!("  {} {}", style("•").green(), describe(port));
        }
    }
    Ok(())
}
