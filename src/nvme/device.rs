use std::fs::File;
use std::fs::OpenOptions;
use std::os::fd::AsRawFd;
use std::path::Path;
use std::path::PathBuf;

use crate::nvme::error::NvmeError;
use crate::nvme::ioctl;
use crate::nvme::types::IdentifyController;
use crate::nvme::types::IdentifyNamespace;
use crate::nvme::types::SmartLog;
use crate::nvme::types::SMART_LOG_BYTES;

const LID_SMART_HEALTH: u8 = 0x02;

/// One open controller handle. The file descriptor is owned for the whole
/// session lifetime and released exactly once when the session drops.
pub struct NvmeDevice {
    path: PathBuf,
    file: File,
}

impl NvmeDevice {
    pub fn open(path: &Path) -> Result<Self, NvmeError> {
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|source| NvmeError::io_path(path, source))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn identify_controller(&self, timeout_ms: u32) -> Result<IdentifyController, NvmeError> {
        let bytes =
            ioctl::identify_controller(self.file.as_raw_fd(), &self.path_string(), timeout_ms)?;
        Ok(IdentifyController::parse(&bytes))
    }

    pub fn identify_namespace(
        &self,
        nsid: u32,
        timeout_ms: u32,
    ) -> Result<IdentifyNamespace, NvmeError> {
        if nsid == 0 {
            return Err(NvmeError::InvalidArgument(
                "namespace id must be 1 or greater".to_string(),
            ));
        }

        let bytes = ioctl::identify_namespace(
            self.file.as_raw_fd(),
            &self.path_string(),
            nsid,
            timeout_ms,
        )?;
        Ok(IdentifyNamespace::parse(&bytes))
    }

    pub fn smart_log(&self, timeout_ms: u32) -> Result<SmartLog, NvmeError> {
        let bytes = ioctl::get_controller_log_page(
            self.file.as_raw_fd(),
            &self.path_string(),
            LID_SMART_HEALTH,
            SMART_LOG_BYTES,
            timeout_ms,
        )?;
        let bytes: [u8; SMART_LOG_BYTES] = bytes
            .try_into()
            .expect("log page transport returned a mis-sized buffer");
        Ok(SmartLog::parse(&bytes))
    }

    fn path_string(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::nvme::device::NvmeDevice;
    use crate::nvme::error::NvmeError;

    #[test]
    fn namespace_zero_is_rejected_before_the_transport() {
        // /dev/null opens fine but is not an NVMe controller, so only the
        // pre-transport validation can produce InvalidArgument here.
        let device = NvmeDevice::open(Path::new("/dev/null")).expect("/dev/null should open");
        let result = device.identify_namespace(0, 0);
        assert!(matches!(result, Err(NvmeError::InvalidArgument(_))));
    }

    #[test]
    fn transport_failures_surface_the_os_error() {
        let device = NvmeDevice::open(Path::new("/dev/null")).expect("/dev/null should open");
        assert!(matches!(
            device.identify_controller(0),
            Err(NvmeError::Ioctl { .. })
        ));
        assert!(matches!(
            device.smart_log(0),
            Err(NvmeError::Ioctl { .. })
        ));
    }

    #[test]
    fn missing_device_fails_on_open() {
        let result = NvmeDevice::open(Path::new("/dev/nvme-does-not-exist"));
        assert!(matches!(result, Err(NvmeError::Io { .. })));
    }
}
