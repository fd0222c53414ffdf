use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::ValueEnum;

use crate::nvme::error::NvmeError;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub device: Option<PathBuf>,
    pub namespace: u32,
    pub devices: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub ioctl_timeout: Duration,
}

impl Config {
    pub fn parse() -> Result<Self, NvmeError> {
        Self::from_args(CliArgs::parse())
    }

    fn from_args(args: CliArgs) -> Result<Self, NvmeError> {
        if args.namespace == 0 {
            return Err(NvmeError::Parse(
                "namespace id must be 1 or greater".to_string(),
            ));
        }

        Ok(Self {
            device: args.device,
            namespace: args.namespace,
            devices: args.devices,
            log_level: args.log_level,
            log_format: args.log_format,
            ioctl_timeout: Duration::from_millis(5000),
        })
    }

    pub fn ioctl_timeout_ms(&self) -> Result<u32, NvmeError> {
        u32::try_from(self.ioctl_timeout.as_millis())
            .map_err(|_| NvmeError::Parse("ioctl timeout exceeds u32".to_string()))
    }
}

#[derive(Clone, Debug, Parser)]
#[command(name = "nvme-inspect")]
#[command(about = "Read NVMe identify and SMART/health data via admin passthrough ioctls")]
struct CliArgs {
    #[arg(
        short = 'd',
        long = "device",
        env = "NVME_INSPECT_DEVICE",
        help = "NVMe controller device, e.g. /dev/nvme0; lists controllers when omitted"
    )]
    device: Option<PathBuf>,

    #[arg(
        short = 'n',
        long = "namespace",
        env = "NVME_INSPECT_NAMESPACE",
        default_value_t = 1_u32
    )]
    namespace: u32,

    #[arg(
        long = "devices",
        env = "NVME_INSPECT_DEVICES",
        default_value = "/dev/nvme*",
        help = "Device pattern used when listing controllers"
    )]
    devices: String,

    #[arg(
        long = "log-level",
        env = "NVME_INSPECT_LOG_LEVEL",
        default_value = "info"
    )]
    log_level: String,

    #[arg(
        long = "log-format",
        env = "NVME_INSPECT_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text
    )]
    log_format: LogFormat,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::config::CliArgs;
    use crate::config::Config;
    use crate::nvme::error::NvmeError;

    #[test]
    fn defaults_target_namespace_one() {
        let args = CliArgs::parse_from(["nvme-inspect"]);
        let config = Config::from_args(args).expect("default args should parse");
        assert_eq!(config.namespace, 1);
        assert_eq!(config.devices, "/dev/nvme*");
        assert!(config.device.is_none());
    }

    #[test]
    fn rejects_namespace_zero() {
        let args = CliArgs::parse_from(["nvme-inspect", "--namespace", "0"]);
        assert!(matches!(Config::from_args(args), Err(NvmeError::Parse(_))));
    }

    #[test]
    fn accepts_device_and_namespace() {
        let args =
            CliArgs::parse_from(["nvme-inspect", "--device", "/dev/nvme1", "--namespace", "2"]);
        let config = Config::from_args(args).expect("args should parse");
        assert_eq!(config.device.as_deref(), Some(std::path::Path::new("/dev/nvme1")));
        assert_eq!(config.namespace, 2);
    }
}
