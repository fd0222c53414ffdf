use std::fs;
use std::path::Path;
use std::path::PathBuf;

use glob::Pattern;

use crate::nvme::error::NvmeError;

const SYS_CLASS_NVME: &str = "/sys/class/nvme";

#[derive(Clone, Debug)]
pub struct ControllerInfo {
    pub name: String,
    pub dev_path: PathBuf,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub firmware: Option<String>,
    pub namespace_ids: Vec<u32>,
}

/// Enumerates NVMe controllers matching the given /dev path pattern, from
/// sysfs when available, otherwise from the /dev tree directly.
pub fn discover_controllers(device_pattern: &str) -> Result<Vec<ControllerInfo>, NvmeError> {
    let pattern = Pattern::new(device_pattern)
        .map_err(|error| NvmeError::Parse(format!("invalid device pattern: {}", error)))?;

    let mut controllers = discover_from_sysfs(&pattern)?;
    if controllers.is_empty() {
        controllers = discover_from_devfs(&pattern)?;
    }

    controllers.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(controllers)
}

fn discover_from_sysfs(pattern: &Pattern) -> Result<Vec<ControllerInfo>, NvmeError> {
    let sysfs_dir = Path::new(SYS_CLASS_NVME);
    if !sysfs_dir.exists() {
        return Ok(Vec::new());
    }

    let entries =
        fs::read_dir(sysfs_dir).map_err(|source| NvmeError::io_path(sysfs_dir, source))?;
    let mut controllers = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|source| NvmeError::io_path(sysfs_dir, source))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !is_controller_name(&name) {
            continue;
        }

        let dev_path = PathBuf::from(format!("/dev/{}", name));
        if !pattern.matches_path(&dev_path) {
            continue;
        }

        let sys_path = entry.path();
        let mut namespace_ids = list_namespace_ids(&name, &sys_path);
        namespace_ids.sort_unstable();

        controllers.push(ControllerInfo {
            model: read_attr(sys_path.join("model")),
            serial: read_attr(sys_path.join("serial")),
            firmware: read_attr(sys_path.join("firmware_rev")),
            name,
            dev_path,
            namespace_ids,
        });
    }

    Ok(controllers)
}

fn discover_from_devfs(pattern: &Pattern) -> Result<Vec<ControllerInfo>, NvmeError> {
    let paths = glob::glob("/dev/nvme[0-9]*")
        .map_err(|error| NvmeError::Parse(format!("invalid /dev glob: {}", error)))?;
    let mut controllers = Vec::new();

    for path_result in paths {
        let path = path_result.map_err(|error| {
            NvmeError::Parse(format!("failed to read /dev glob path: {}", error))
        })?;
        if !pattern.matches_path(&path) {
            continue;
        }

        let Some(file_name) = path.file_name() else {
            continue;
        };
        let name = file_name.to_string_lossy().to_string();
        if !is_controller_name(&name) {
            continue;
        }

        controllers.push(ControllerInfo {
            name,
            dev_path: path,
            model: None,
            serial: None,
            firmware: None,
            namespace_ids: Vec::new(),
        });
    }

    Ok(controllers)
}

fn list_namespace_ids(controller_name: &str, controller_sys_path: &Path) -> Vec<u32> {
    let Ok(entries) = fs::read_dir(controller_sys_path) else {
        return Vec::new();
    };

    entries
        .flatten()
        .filter_map(|entry| {
            let entry_name = entry.file_name().to_string_lossy().to_string();
            parse_namespace_id(controller_name, &entry_name)
        })
        .collect()
}

fn parse_namespace_id(controller_name: &str, namespace_name: &str) -> Option<u32> {
    let prefix = format!("{}n", controller_name);
    let suffix = namespace_name.strip_prefix(&prefix)?;
    if suffix.is_empty() || !suffix.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }

    suffix.parse::<u32>().ok()
}

fn is_controller_name(value: &str) -> bool {
    let Some(suffix) = value.strip_prefix("nvme") else {
        return false;
    };
    !suffix.is_empty() && suffix.chars().all(|ch| ch.is_ascii_digit())
}

fn read_attr(path: PathBuf) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::nvme::discovery::is_controller_name;
    use crate::nvme::discovery::parse_namespace_id;

    #[test]
    fn parses_namespace_ids() {
        assert_eq!(parse_namespace_id("nvme0", "nvme0n1"), Some(1));
        assert_eq!(parse_namespace_id("nvme12", "nvme12n25"), Some(25));
    }

    #[test]
    fn rejects_invalid_namespace_names() {
        assert_eq!(parse_namespace_id("nvme0", "nvme1n1"), None);
        assert_eq!(parse_namespace_id("nvme0", "nvme0"), None);
        assert_eq!(parse_namespace_id("nvme0", "nvme0np1"), None);
    }

    #[test]
    fn matches_controller_names_only() {
        assert!(is_controller_name("nvme0"));
        assert!(is_controller_name("nvme24"));
        assert!(!is_controller_name("nvme0n1"));
        assert!(!is_controller_name("sda"));
    }
}
