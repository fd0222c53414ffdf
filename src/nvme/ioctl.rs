use std::os::fd::RawFd;

use tracing::debug;

use crate::nvme::error::NvmeError;
use crate::nvme::types::IDENTIFY_BYTES;

// Defined in <linux/nvme_ioctl.h>
const NVME_IOCTL_ADMIN_CMD: libc::c_ulong = 0xC048_4E41;
const OPCODE_GET_LOG_PAGE: u8 = 0x02;
const OPCODE_IDENTIFY: u8 = 0x06;
const CNS_IDENTIFY_NAMESPACE: u32 = 0x00;
const CNS_IDENTIFY_CONTROLLER: u32 = 0x01;
const NSID_ALL: u32 = 0xFFFF_FFFF;

const LOG_PAGE_MIN_BYTES: usize = 4;
const LOG_PAGE_MAX_BYTES: usize = 0x4000;

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct NvmePassthruCmd {
    pub opcode: u8,
    pub flags: u8,
    pub rsvd1: u16,
    pub nsid: u32,
    pub cdw2: u32,
    pub cdw3: u32,
    pub metadata: u64,
    pub addr: u64,
    pub metadata_len: u32,
    pub data_len: u32,
    pub cdw10: u32,
    pub cdw11: u32,
    pub cdw12: u32,
    pub cdw13: u32,
    pub cdw14: u32,
    pub cdw15: u32,
    pub timeout_ms: u32,
    pub result: u32,
}

impl NvmePassthruCmd {
    fn empty() -> Self {
        Self {
            opcode: 0,
            flags: 0,
            rsvd1: 0,
            nsid: 0,
            cdw2: 0,
            cdw3: 0,
            metadata: 0,
            addr: 0,
            metadata_len: 0,
            data_len: 0,
            cdw10: 0,
            cdw11: 0,
            cdw12: 0,
            cdw13: 0,
            cdw14: 0,
            cdw15: 0,
            timeout_ms: 0,
            result: 0,
        }
    }
}

pub fn identify_controller(
    fd: RawFd,
    device_name: &str,
    timeout_ms: u32,
) -> Result<[u8; IDENTIFY_BYTES], NvmeError> {
    let mut buffer = [0_u8; IDENTIFY_BYTES];
    let mut cmd = NvmePassthruCmd::empty();
    cmd.opcode = OPCODE_IDENTIFY;
    cmd.nsid = 0;
    cmd.addr = buffer.as_mut_ptr() as u64;
    cmd.data_len = IDENTIFY_BYTES as u32;
    cmd.cdw10 = CNS_IDENTIFY_CONTROLLER;
    cmd.timeout_ms = timeout_ms;

    admin_cmd(fd, device_name, &mut cmd)?;
    Ok(buffer)
}

pub fn identify_namespace(
    fd: RawFd,
    device_name: &str,
    nsid: u32,
    timeout_ms: u32,
) -> Result<[u8; IDENTIFY_BYTES], NvmeError> {
    let mut buffer = [0_u8; IDENTIFY_BYTES];
    let mut cmd = NvmePassthruCmd::empty();
    cmd.opcode = OPCODE_IDENTIFY;
    cmd.nsid = nsid;
    cmd.addr = buffer.as_mut_ptr() as u64;
    cmd.data_len = IDENTIFY_BYTES as u32;
    cmd.cdw10 = CNS_IDENTIFY_NAMESPACE;
    cmd.timeout_ms = timeout_ms;

    admin_cmd(fd, device_name, &mut cmd)?;
    Ok(buffer)
}

pub fn get_log_page(
    fd: RawFd,
    device_name: &str,
    nsid: u32,
    lid: u8,
    data_len: usize,
    timeout_ms: u32,
) -> Result<Vec<u8>, NvmeError> {
    validate_log_page_len(data_len)?;

    let mut buffer = vec![0_u8; data_len];
    let mut cmd = NvmePassthruCmd::empty();
    cmd.opcode = OPCODE_GET_LOG_PAGE;
    cmd.nsid = nsid;
    cmd.addr = buffer.as_mut_ptr() as u64;
    cmd.data_len = data_len as u32;
    cmd.cdw10 = log_page_cdw10(lid, data_len);
    cmd.timeout_ms = timeout_ms;

    admin_cmd(fd, device_name, &mut cmd)?;
    Ok(buffer)
}

/// Log page addressed to the whole controller rather than one namespace.
pub fn get_controller_log_page(
    fd: RawFd,
    device_name: &str,
    lid: u8,
    data_len: usize,
    timeout_ms: u32,
) -> Result<Vec<u8>, NvmeError> {
    get_log_page(fd, device_name, NSID_ALL, lid, data_len, timeout_ms)
}

fn validate_log_page_len(data_len: usize) -> Result<(), NvmeError> {
    if data_len < LOG_PAGE_MIN_BYTES
        || data_len > LOG_PAGE_MAX_BYTES
        || !data_len.is_multiple_of(4)
    {
        return Err(NvmeError::InvalidArgument(format!(
            "log page length {} must be {}..={} bytes and divisible by 4",
            data_len, LOG_PAGE_MIN_BYTES, LOG_PAGE_MAX_BYTES
        )));
    }
    Ok(())
}

// Upper 16 bits carry the dword count minus one, lower 8 bits the log id.
fn log_page_cdw10(lid: u8, data_len: usize) -> u32 {
    let numd = (data_len / 4 - 1) as u32;
    (numd << 16) | u32::from(lid)
}

fn admin_cmd(fd: RawFd, device_name: &str, cmd: &mut NvmePassthruCmd) -> Result<(), NvmeError> {
    debug!(
        device = %device_name,
        opcode = cmd.opcode,
        data_len = cmd.data_len,
        nsid = cmd.nsid,
        cdw10 = cmd.cdw10,
        "issuing nvme admin command"
    );

    let ret = unsafe { libc::ioctl(fd, NVME_IOCTL_ADMIN_CMD as _, cmd as *mut NvmePassthruCmd) };

    if ret < 0 {
        let source = std::io::Error::last_os_error();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            return Err(NvmeError::PermissionDenied {
                device: device_name.to_string(),
            });
        }
        return Err(NvmeError::Ioctl {
            device: device_name.to_string(),
            source,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::nvme::error::NvmeError;
    use crate::nvme::ioctl::get_log_page;
    use crate::nvme::ioctl::log_page_cdw10;
    use crate::nvme::ioctl::validate_log_page_len;
    use crate::nvme::ioctl::NvmePassthruCmd;

    #[test]
    fn passthrough_layout_matches_kernel() {
        assert_eq!(std::mem::size_of::<NvmePassthruCmd>(), 72);
    }

    #[test]
    fn cdw10_packs_dword_count_and_log_id() {
        assert_eq!(log_page_cdw10(0x02, 512), 0x007F_0002);
        assert_eq!(log_page_cdw10(0x01, 4), 0x0000_0001);
        assert_eq!(log_page_cdw10(0xFF, 0x4000), 0x0FFF_00FF);
    }

    #[test]
    fn rejects_out_of_range_log_page_lengths() {
        for len in [0_usize, 3, 5, 511, 16385] {
            assert!(
                matches!(
                    validate_log_page_len(len),
                    Err(NvmeError::InvalidArgument(_))
                ),
                "length {} should be rejected",
                len
            );
        }
    }

    #[test]
    fn accepts_aligned_log_page_lengths() {
        for len in [4_usize, 512, 16384] {
            assert!(validate_log_page_len(len).is_ok(), "length {} should pass", len);
        }
    }

    #[test]
    fn bad_length_fails_before_the_ioctl() {
        // fd -1 would make the ioctl itself fail with EBADF, so the error
        // kind shows which side rejected the call.
        let result = get_log_page(-1, "test", 0xFFFF_FFFF, 0x02, 3, 0);
        assert!(matches!(result, Err(NvmeError::InvalidArgument(_))));

        let result = get_log_page(-1, "test", 0xFFFF_FFFF, 0x02, 512, 0);
        assert!(matches!(result, Err(NvmeError::Ioctl { .. })));
    }
}
