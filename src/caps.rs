use tracing::warn;

const LINUX_CAPABILITY_VERSION_3: u32 = 0x2008_0522;

const CAP_SYS_RAWIO: u32 = 1 << 17;
const CAP_SYS_ADMIN: u32 = 1 << 21;

#[repr(C)]
struct CapUserHeader {
    version: u32,
    pid: libc::c_int,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
struct CapUserData {
    effective: u32,
    permitted: u32,
    inheritable: u32,
}

/// Warns when the process lacks the capabilities the admin ioctl needs.
/// Running as root, or a binary granted them via setcap, passes.
pub fn check_capabilities() {
    let mut header = CapUserHeader {
        version: LINUX_CAPABILITY_VERSION_3,
        pid: 0,
    };
    let mut data = [CapUserData::default(); 2];

    let ret = unsafe {
        libc::syscall(
            libc::SYS_capget,
            &mut header as *mut CapUserHeader,
            data.as_mut_ptr(),
        )
    };
    if ret != 0 {
        warn!(
            error = %std::io::Error::last_os_error(),
            "capget failed, unable to verify process capabilities"
        );
        return;
    }

    let effective = data[0].effective;
    if effective & CAP_SYS_RAWIO == 0 && effective & CAP_SYS_ADMIN == 0 {
        warn!("neither cap_sys_rawio nor cap_sys_admin is in effect, device access will probably fail");
    }
}
