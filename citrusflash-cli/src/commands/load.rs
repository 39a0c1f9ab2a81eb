//! Kernel and application loading.

use {
    crate::{
        Cli, config::Config, ensure_not_interrupted, progress::BarProgress,
        serial::select_serial_port, target_config,
    },
    anyhow::{Context, Result},
    citrusflash::{Error, LoadKind, NativePort, TransferSession},
    console::style,
    std::{fs, path::Path},
};

/// Load a kernel or application image onto the target.
pub(crate) fn cmd_load(cli: &Cli, config: &Config, file: &Path, kind: LoadKind) -> Result<()> {
    let target = target_config(cli, config)?;
    if !target.supports(kind) {
        return Err(Error::Unsupported(format!(
            "{} cannot load {kind} images",
            target.family
        ))
        .into());
    }

    let image = fs::read(file).with_context(|| format!("Cannot read {}", file.display()))?;
    if !cli.quiet {
        eprintln!(
            "{} Loaded {} ({} bytes)",
            style("📦").cyan(),
            file.display(),
            image.len()
        );
    }

    let port_name = select_serial_port(cli.port.as_deref(), config)?;
    if !cli.quiet {
        eprintln!(
            "{} Using {} at {} baud ({})",
            style("🔌").cyan(),
            style(&port_name).green(),
            target.baud_rate,
            target.family
        );
    }

    let port = NativePort::open(&target.serial_config(&port_name))?;
    ensure_not_interrupted()?;

    let mut progress = BarProgress::new(cli.quiet);
    let mut session = TransferSession::new(port, &target);
    let report = match session.run(&image, kind, &mut progress) {
        Ok(report) => report,
        Err(err) => {
            progress.abandon();
            return Err(err.into());
        },
    };

    if !cli.quiet {
        eprintln!(
            "{} Sent {kind} ({} bytes, {} frames) in {:.2}s",
            style("✓").green(),
            report.bytes,
            report.frames,
            report
                .elapsed
                .as_secs_f64()
        );
    }
    Ok(())
}
