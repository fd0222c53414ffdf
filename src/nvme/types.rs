use crate::nvme::format::DATA_UNIT_BYTES;

pub const IDENTIFY_BYTES: usize = 4096;
pub const SMART_LOG_BYTES: usize = 512;

pub const POWER_STATE_COUNT: usize = 32;
pub const LBA_FORMAT_COUNT: usize = 16;

const POWER_STATE_BYTES: usize = 32;
const POWER_STATE_OFFSET: usize = 2048;
const LBA_FORMAT_BYTES: usize = 4;
const LBA_FORMAT_OFFSET: usize = 128;

/// One entry of the identify-controller power state descriptor table.
#[derive(Clone, Copy, Debug)]
pub struct PowerStateDescriptor {
    pub max_power_centiwatts: u16,
    pub flags: u8,
    pub entry_latency_us: u32,
    pub exit_latency_us: u32,
    pub read_throughput: u8,
    pub read_latency: u8,
    pub write_throughput: u8,
    pub write_latency: u8,
    pub idle_power: u16,
    pub idle_scale: u8,
    pub active_power: u16,
    pub active_work_scale: u8,
}

impl PowerStateDescriptor {
    fn parse(bytes: &[u8]) -> Self {
        Self {
            max_power_centiwatts: read_u16_le(bytes, 0),
            flags: read_u8(bytes, 3),
            entry_latency_us: read_u32_le(bytes, 4),
            exit_latency_us: read_u32_le(bytes, 8),
            read_throughput: read_u8(bytes, 12),
            read_latency: read_u8(bytes, 13),
            write_throughput: read_u8(bytes, 14),
            write_latency: read_u8(bytes, 15),
            idle_power: read_u16_le(bytes, 16),
            idle_scale: read_u8(bytes, 18),
            active_power: read_u16_le(bytes, 20),
            active_work_scale: read_u8(bytes, 22),
        }
    }

    pub fn is_populated(&self) -> bool {
        self.max_power_centiwatts > 0
    }

    pub fn max_power_watts(&self) -> f64 {
        f64::from(self.max_power_centiwatts) / 100.0
    }
}

#[derive(Clone, Debug)]
pub struct IdentifyController {
    pub vendor_id: u16,
    pub serial_number: [u8; 20],
    pub model_number: [u8; 40],
    pub firmware_revision: [u8; 8],
    pub ieee_oui: u32,
    pub mdts: u8,
    pub power_states: [PowerStateDescriptor; POWER_STATE_COUNT],
}

impl IdentifyController {
    pub fn parse(bytes: &[u8; IDENTIFY_BYTES]) -> Self {
        let mut serial_number = [0_u8; 20];
        serial_number.copy_from_slice(&bytes[4..24]);
        let mut model_number = [0_u8; 40];
        model_number.copy_from_slice(&bytes[24..64]);
        let mut firmware_revision = [0_u8; 8];
        firmware_revision.copy_from_slice(&bytes[64..72]);

        // The IEEE OUI field is stored big-endian on the wire; this byte
        // arrangement mirrors what real controllers are probed with, even
        // though it reverses the conventional OUI hex rendering.
        let ieee_oui = u32::from(bytes[73]) | u32::from(bytes[74]) << 8 | u32::from(bytes[75]) << 16;

        let power_states = std::array::from_fn(|index| {
            let offset = POWER_STATE_OFFSET + index * POWER_STATE_BYTES;
            PowerStateDescriptor::parse(&bytes[offset..offset + POWER_STATE_BYTES])
        });

        Self {
            vendor_id: read_u16_le(bytes, 0),
            serial_number,
            model_number,
            firmware_revision,
            ieee_oui,
            mdts: read_u8(bytes, 77),
            power_states,
        }
    }

    pub fn serial(&self) -> String {
        trim_nvme_ascii(&self.serial_number)
    }

    pub fn model(&self) -> String {
        trim_nvme_ascii(&self.model_number)
    }

    pub fn firmware(&self) -> String {
        trim_nvme_ascii(&self.firmware_revision)
    }

    pub fn max_data_transfer_size(&self) -> u64 {
        1_u64.checked_shl(u32::from(self.mdts)).unwrap_or(u64::MAX)
    }
}

/// Supported logical-block geometry: metadata bytes per block, block size
/// as a power-of-two exponent, relative performance class.
#[derive(Clone, Copy, Debug)]
pub struct LbaFormat {
    pub metadata_size: u16,
    pub data_size_shift: u8,
    pub relative_performance: u8,
}

impl LbaFormat {
    fn parse(bytes: &[u8]) -> Self {
        Self {
            metadata_size: read_u16_le(bytes, 0),
            data_size_shift: read_u8(bytes, 2),
            relative_performance: read_u8(bytes, 3),
        }
    }

    pub fn is_populated(&self) -> bool {
        self.data_size_shift > 0
    }

    pub fn block_size(&self) -> u64 {
        1_u64
            .checked_shl(u32::from(self.data_size_shift))
            .unwrap_or(u64::MAX)
    }
}

#[derive(Clone, Debug)]
pub struct IdentifyNamespace {
    pub nsze: u64,
    pub ncap: u64,
    pub nuse: u64,
    pub lba_formats: [LbaFormat; LBA_FORMAT_COUNT],
}

impl IdentifyNamespace {
    pub fn parse(bytes: &[u8; IDENTIFY_BYTES]) -> Self {
        let lba_formats = std::array::from_fn(|index| {
            let offset = LBA_FORMAT_OFFSET + index * LBA_FORMAT_BYTES;
            LbaFormat::parse(&bytes[offset..offset + LBA_FORMAT_BYTES])
        });

        Self {
            nsze: read_u64_le(bytes, 0),
            ncap: read_u64_le(bytes, 8),
            nuse: read_u64_le(bytes, 16),
            lba_formats,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SmartLog {
    pub critical_warning: u8,
    pub temperature_kelvin: u16,
    pub available_spare: u8,
    pub spare_threshold: u8,
    pub percentage_used: u8,
    pub data_units_read: u128,
    pub data_units_written: u128,
    pub host_read_commands: u128,
    pub host_write_commands: u128,
    pub controller_busy_time: u128,
    pub power_cycles: u128,
    pub power_on_hours: u128,
    pub unsafe_shutdowns: u128,
    pub media_errors: u128,
    pub num_err_log_entries: u128,
    pub warning_temp_time_minutes: u32,
    pub critical_comp_time_minutes: u32,
    pub temp_sensors_kelvin: [u16; 8],
}

impl SmartLog {
    pub fn parse(bytes: &[u8; SMART_LOG_BYTES]) -> Self {
        let temp_sensors_kelvin =
            std::array::from_fn(|index| read_u16_le(bytes, 200 + index * 2));

        Self {
            critical_warning: read_u8(bytes, 0),
            temperature_kelvin: read_u16_le(bytes, 1),
            available_spare: read_u8(bytes, 3),
            spare_threshold: read_u8(bytes, 4),
            percentage_used: read_u8(bytes, 5),
            data_units_read: read_u128_le(bytes, 32),
            data_units_written: read_u128_le(bytes, 48),
            host_read_commands: read_u128_le(bytes, 64),
            host_write_commands: read_u128_le(bytes, 80),
            controller_busy_time: read_u128_le(bytes, 96),
            power_cycles: read_u128_le(bytes, 112),
            power_on_hours: read_u128_le(bytes, 128),
            unsafe_shutdowns: read_u128_le(bytes, 144),
            media_errors: read_u128_le(bytes, 160),
            num_err_log_entries: read_u128_le(bytes, 176),
            warning_temp_time_minutes: read_u32_le(bytes, 192),
            critical_comp_time_minutes: read_u32_le(bytes, 196),
            temp_sensors_kelvin,
        }
    }

    pub fn temperature_celsius(&self) -> i32 {
        i32::from(self.temperature_kelvin) - 273
    }

    pub fn bytes_read(&self) -> u128 {
        self.data_units_read.saturating_mul(DATA_UNIT_BYTES)
    }

    pub fn bytes_written(&self) -> u128 {
        self.data_units_written.saturating_mul(DATA_UNIT_BYTES)
    }
}

pub fn trim_nvme_ascii(bytes: &[u8]) -> String {
    let mut value = String::from_utf8_lossy(bytes).into_owned();
    while value.ends_with('\0') {
        let _ = value.pop();
    }
    value.trim().to_string()
}

fn read_u8(bytes: &[u8], offset: usize) -> u8 {
    bytes[offset]
}

fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    let mut raw = [0_u8; 2];
    raw.copy_from_slice(&bytes[offset..offset + 2]);
    u16::from_le_bytes(raw)
}

fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0_u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn read_u64_le(bytes: &[u8], offset: usize) -> u64 {
    let mut raw = [0_u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

/// Decodes a 16-byte little-endian counter; covers the full 0..2^128-1
/// range with no precision loss.
pub fn read_u128_le(bytes: &[u8], offset: usize) -> u128 {
    let mut raw = [0_u8; 16];
    raw.copy_from_slice(&bytes[offset..offset + 16]);
    u128::from_le_bytes(raw)
}
