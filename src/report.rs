use std::io;
use std::io::Write;

use crate::nvme::format::format_bytes;
use crate::nvme::types::IdentifyController;
use crate::nvme::types::IdentifyNamespace;
use crate::nvme::types::SmartLog;

pub fn print_controller(w: &mut impl Write, controller: &IdentifyController) -> io::Result<()> {
    writeln!(w, "Vendor ID: {:#06x}", controller.vendor_id)?;
    writeln!(w, "Model number: {}", controller.model())?;
    writeln!(w, "Serial number: {}", controller.serial())?;
    writeln!(w, "Firmware version: {}", controller.firmware())?;
    writeln!(w, "IEEE OUI identifier: {:#08x}", controller.ieee_oui)?;
    writeln!(
        w,
        "Max data transfer size: {}",
        controller.max_data_transfer_size()
    )?;

    for (index, state) in controller
        .power_states
        .iter()
        .enumerate()
        .filter(|(_, state)| state.is_populated())
    {
        writeln!(
            w,
            "Power state {}: max power {:.2} W, entry latency {} µs, exit latency {} µs, idle power {}, active power {}",
            index,
            state.max_power_watts(),
            state.entry_latency_us,
            state.exit_latency_us,
            state.idle_power,
            state.active_power
        )?;
    }

    Ok(())
}

pub fn print_namespace(
    w: &mut impl Write,
    nsid: u32,
    namespace: &IdentifyNamespace,
) -> io::Result<()> {
    writeln!(w, "Namespace {} size: {} sectors", nsid, namespace.nsze)?;
    writeln!(w, "Namespace {} capacity: {} sectors", nsid, namespace.ncap)?;
    writeln!(
        w,
        "Namespace {} utilisation: {} sectors",
        nsid, namespace.nuse
    )?;

    for (index, format) in namespace
        .lba_formats
        .iter()
        .enumerate()
        .filter(|(_, format)| format.is_populated())
    {
        writeln!(
            w,
            "LBA format {}: block size {} B, metadata size {} B, relative performance {}",
            index,
            format.block_size(),
            format.metadata_size,
            format.relative_performance
        )?;
    }

    Ok(())
}

pub fn print_smart_log(w: &mut impl Write, log: &SmartLog) -> io::Result<()> {
    writeln!(w, "SMART data follows:")?;
    writeln!(w, "Critical warning: {:#04x}", log.critical_warning)?;
    writeln!(w, "Temperature: {}° Celsius", log.temperature_celsius())?;
    writeln!(w, "Avail. spare: {}%", log.available_spare)?;
    writeln!(w, "Avail. spare threshold: {}%", log.spare_threshold)?;
    writeln!(w, "Percentage used: {}%", log.percentage_used)?;
    writeln!(
        w,
        "Data units read: {} [{}]",
        log.data_units_read,
        format_bytes(log.bytes_read())
    )?;
    writeln!(
        w,
        "Data units written: {} [{}]",
        log.data_units_written,
        format_bytes(log.bytes_written())
    )?;
    writeln!(w, "Host read commands: {}", log.host_read_commands)?;
    writeln!(w, "Host write commands: {}", log.host_write_commands)?;
    writeln!(w, "Controller busy time: {}", log.controller_busy_time)?;
    writeln!(w, "Power cycles: {}", log.power_cycles)?;
    writeln!(w, "Power on hours: {}", log.power_on_hours)?;
    writeln!(w, "Unsafe shutdowns: {}", log.unsafe_shutdowns)?;
    writeln!(w, "Media & data integrity errors: {}", log.media_errors)?;
    writeln!(
        w,
        "Error information log entries: {}",
        log.num_err_log_entries
    )?;
    writeln!(
        w,
        "Warning temperature time: {} minutes",
        log.warning_temp_time_minutes
    )?;
    writeln!(
        w,
        "Critical temperature time: {} minutes",
        log.critical_comp_time_minutes
    )?;

    for (index, kelvin) in log
        .temp_sensors_kelvin
        .iter()
        .enumerate()
        .filter(|(_, kelvin)| **kelvin > 0)
    {
        writeln!(
            w,
            "Temperature sensor {}: {}° Celsius",
            index + 1,
            i32::from(*kelvin) - 273
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::nvme::types::IdentifyController;
    use crate::nvme::types::IdentifyNamespace;
    use crate::nvme::types::SmartLog;
    use crate::nvme::types::IDENTIFY_BYTES;
    use crate::nvme::types::SMART_LOG_BYTES;
    use crate::report::print_controller;
    use crate::report::print_namespace;
    use crate::report::print_smart_log;

    fn render(print: impl FnOnce(&mut Vec<u8>) -> std::io::Result<()>) -> String {
        let mut out = Vec::new();
        print(&mut out).expect("report should write");
        String::from_utf8(out).expect("report should be utf-8")
    }

    #[test]
    fn controller_report_surfaces_only_populated_power_states() {
        let mut bytes = [0_u8; IDENTIFY_BYTES];
        bytes[0..2].copy_from_slice(&0x1B36_u16.to_le_bytes());
        bytes[4..24].copy_from_slice(b"SN42                ");
        bytes[73..76].copy_from_slice(&[0x01, 0x02, 0x03]);
        bytes[2048..2050].copy_from_slice(&900_u16.to_le_bytes());
        let controller = IdentifyController::parse(&bytes);

        let output = render(|out| print_controller(out, &controller));
        assert!(output.contains("Vendor ID: 0x1b36"));
        assert!(output.contains("Serial number: SN42"));
        assert!(output.contains("IEEE OUI identifier: 0x030201"));
        assert!(output.contains("Power state 0: max power 9.00 W"));
        assert!(!output.contains("Power state 1:"));
    }

    #[test]
    fn namespace_report_prints_sector_counts() {
        let mut bytes = [0_u8; IDENTIFY_BYTES];
        bytes[0..8].copy_from_slice(&1000_u64.to_le_bytes());
        bytes[8..16].copy_from_slice(&1000_u64.to_le_bytes());
        bytes[16..24].copy_from_slice(&250_u64.to_le_bytes());
        bytes[130] = 9;
        let namespace = IdentifyNamespace::parse(&bytes);

        let output = render(|out| print_namespace(out, 1, &namespace));
        assert!(output.contains("Namespace 1 size: 1000 sectors"));
        assert!(output.contains("Namespace 1 capacity: 1000 sectors"));
        assert!(output.contains("Namespace 1 utilisation: 250 sectors"));
        assert!(output.contains("LBA format 0: block size 512 B"));
        assert!(!output.contains("LBA format 1:"));
    }

    #[test]
    fn smart_report_derives_celsius_and_byte_totals() {
        let mut bytes = [0_u8; SMART_LOG_BYTES];
        bytes[1..3].copy_from_slice(&300_u16.to_le_bytes());
        bytes[3] = 100;
        bytes[4] = 10;
        bytes[32] = 1;
        let log = SmartLog::parse(&bytes);

        let output = render(|out| print_smart_log(out, &log));
        assert!(output.contains("Temperature: 27° Celsius"));
        assert!(output.contains("Avail. spare: 100%"));
        assert!(output.contains("Data units read: 1 [512 KB]"));
        assert!(output.contains("Data units written: 0 [0 B]"));
        assert!(!output.contains("Temperature sensor"));
    }

    #[test]
    fn smart_report_lists_non_zero_sensors() {
        let mut bytes = [0_u8; SMART_LOG_BYTES];
        bytes[202..204].copy_from_slice(&311_u16.to_le_bytes());
        let log = SmartLog::parse(&bytes);

        let output = render(|out| print_smart_log(out, &log));
        assert!(output.contains("Temperature sensor 2: 38° Celsius"));
        assert!(!output.contains("Temperature sensor 1:"));
    }
}
