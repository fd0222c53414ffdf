use std::io;
use std::io::Write;
use std::path::Path;

use nvme_inspect::caps;
use nvme_inspect::config::Config;
use nvme_inspect::config::LogFormat;
use nvme_inspect::nvme::device::NvmeDevice;
use nvme_inspect::nvme::discovery;
use nvme_inspect::nvme::endian;
use nvme_inspect::nvme::error::NvmeError;
use nvme_inspect::report;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(error) = run() {
        eprintln!("nvme-inspect error: {}", error);
        std::process::exit(1);
    }
}

fn run() -> Result<(), NvmeError> {
    let config = Config::parse()?;
    init_logging(&config)?;
    caps::check_capabilities();

    info!(
        host_byte_order = endian::native().as_str(),
        "starting nvme-inspect"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &config.device {
        Some(path) => inspect_device(&config, path, &mut out),
        None => list_controllers(&config, &mut out),
    }
}

fn inspect_device(
    config: &Config,
    path: &Path,
    out: &mut impl Write,
) -> Result<(), NvmeError> {
    let device = NvmeDevice::open(path)?;
    let timeout_ms = config.ioctl_timeout_ms()?;

    let controller = device.identify_controller(timeout_ms)?;
    report::print_controller(out, &controller)
        .map_err(|source| NvmeError::io_context("write controller report", source))?;

    let namespace = device.identify_namespace(config.namespace, timeout_ms)?;
    writeln!(out).map_err(|source| NvmeError::io_context("write namespace report", source))?;
    report::print_namespace(out, config.namespace, &namespace)
        .map_err(|source| NvmeError::io_context("write namespace report", source))?;

    let smart = device.smart_log(timeout_ms)?;
    writeln!(out).map_err(|source| NvmeError::io_context("write smart report", source))?;
    report::print_smart_log(out, &smart)
        .map_err(|source| NvmeError::io_context("write smart report", source))?;

    Ok(())
}

fn list_controllers(config: &Config, out: &mut impl Write) -> Result<(), NvmeError> {
    let controllers = discovery::discover_controllers(&config.devices)?;
    if controllers.is_empty() {
        return Err(NvmeError::NoControllers {
            pattern: config.devices.clone(),
        });
    }

    for controller in controllers {
        let model = controller.model.as_deref().unwrap_or("unknown");
        let serial = controller.serial.as_deref().unwrap_or("unknown");
        let firmware = controller.firmware.as_deref().unwrap_or("unknown");
        writeln!(
            out,
            "{} ({}): model {}, serial {}, firmware {}, namespaces {:?}",
            controller.name,
            controller.dev_path.display(),
            model,
            serial,
            firmware,
            controller.namespace_ids
        )
        .map_err(|source| NvmeError::io_context("write controller listing", source))?;
    }

    Ok(())
}

fn init_logging(config: &Config) -> Result<(), NvmeError> {
    let env_filter = EnvFilter::try_new(config.log_level.clone()).map_err(|error| {
        NvmeError::Parse(format!(
            "invalid log level/filter '{}': {}",
            config.log_level, error
        ))
    })?;

    let init_result = match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .json()
            .try_init(),
    };

    init_result
        .map_err(|error| NvmeError::Parse(format!("failed to initialize logging: {}", error)))
}
