//! One-shot device commands: kill and pointer.

use {
    crate::{Cli, config::Config, ensure_not_interrupted, serial::select_serial_port, target_config},
    anyhow::Result,
    citrusflash::{Device, Error, NativePort, TargetConfig},
    console::style,
};

/// Open the port and run `op` against the device, closing the port after.
fn with_device<F>(cli: &Cli, config: &Config, target: &TargetConfig, op: F) -> Result<()>
where
    F: FnOnce(&mut Device<NativePort>) -> citrusflash::Result<()>,
{
    let port_name = select_serial_port(cli.port.as_deref(), config)?;
    let port = NativePort::open(&target.serial_config(&port_name))?;
    ensure_not_interrupted()?;

    let mut device = Device::new(port, target);
    let result = op(&mut device);
    let closed = device.close();
    result?;
    closed?;
    Ok(())
}

fn unsupported(target: &TargetConfig, what: &str) -> anyhow::Error {
    Error::Unsupported(format!("{} has no {what} command", target.family)).into()
}

/// Kill a running process on the target.
pub(crate) fn cmd_kill(cli: &Cli, config: &Config, pid: u32) -> Result<()> {
    let target = target_config(cli, config)?;
    if target
        .commands
        .kill
        .is_none()
    {
        return Err(unsupported(&target, "kill"));
    }

    with_device(cli, config, &target, |device| device.kill(pid))?;
    if !cli.quiet {
        eprintln!("{} Killed process {pid}", style("✓").green());
    }
    Ok(())
}

/// Forward a pointer position to the target.
pub(crate) fn cmd_pointer(cli: &Cli, config: &Config, x: u16, y: u16) -> Result<()> {
    let target = target_config(cli, config)?;
    if target
        .commands
        .pointer
        .is_none()
    {
        return Err(unsupported(&target, "pointer"));
    }

    with_device(cli, config, &target, |device| device.pointer(x, y))
}
