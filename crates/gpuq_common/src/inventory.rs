//! Device inventory: observed devices grouped by architecture.
//!
//! Used when updating the architecture taxonomy: the report shows which
//! observed devices each architecture already covers and which devices no
//! architecture claims yet.

use crate::classifier::Taxonomy;
use crate::devices::{ObservedDevice, ObservedDevices};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Vendor id used by reports that carry none.
pub const NO_VENDOR: u32 = 0x0000;
/// Apple devices are not described by the taxonomy.
pub const APPLE_VENDOR: u32 = 0x106b;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceListing {
    pub device_id: u32,
    pub names: Vec<String>,
    pub count: usize,
}

impl DeviceListing {
    fn new(device_id: u32, device: &ObservedDevice) -> Self {
        Self {
            device_id,
            names: device.names.iter().cloned().collect(),
            count: device.count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchitectureListing {
    pub name: String,
    pub devices: Vec<DeviceListing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorListing {
    pub vendor_id: u32,
    /// Empty for vendors the taxonomy does not know.
    pub name: String,
    /// Devices this listing covers, including device 0 when it is hidden.
    pub device_count: usize,
    pub architectures: Vec<ArchitectureListing>,
    pub unmatched: Vec<DeviceListing>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventoryTotals {
    /// Reports listed in either section.
    pub entries: usize,
    /// Distinct device ids in either section. Hidden device 0 entries of a
    /// listed vendor still count.
    pub devices: usize,
    pub vendors: usize,
    pub categorized_entries: usize,
    pub categorized_devices: usize,
}

impl InventoryTotals {
    pub fn categorized_entries_percent(&self) -> f64 {
        percent(self.categorized_entries, self.entries)
    }

    pub fn categorized_devices_percent(&self) -> f64 {
        percent(self.categorized_devices, self.devices)
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryReport {
    pub used_taxonomy: bool,
    /// Taxonomy vendors with their architecture matches, in declaration order.
    pub classified: Vec<VendorListing>,
    /// Vendors with devices no architecture claimed.
    pub unclassified: Vec<VendorListing>,
    pub totals: InventoryTotals,
    /// Some vendors or devices were hidden because `show_all` was off.
    pub entries_skipped: bool,
}

/// Build the inventory. Without a taxonomy every device is unclassified.
pub fn build(observed: &ObservedDevices, taxonomy: Option<&Taxonomy>, show_all: bool) -> InventoryReport {
    let mut report = InventoryReport {
        used_taxonomy: taxonomy.is_some(),
        ..InventoryReport::default()
    };
    let empty = BTreeMap::new();

    // Taxonomy vendors first, in declaration order, then the rest by id.
    let mut order: Vec<(u32, String)> = taxonomy
        .map(|t| t.vendors.iter().map(|v| (v.vendor_id, v.name.clone())).collect())
        .unwrap_or_default();
    for id in observed.vendor_ids() {
        if !order.iter().any(|(known, _)| *known == id) {
            order.push((id, String::new()));
        }
    }
    report.totals.vendors = order.len();

    let mut remaining: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (vendor_id, name) in &order {
        let devices = observed.devices_of(*vendor_id).unwrap_or(&empty);
        let ids: Vec<u32> = devices.keys().copied().collect();

        let Some(vendor_tax) = taxonomy.and_then(|t| t.vendor(*vendor_id)) else {
            remaining.insert(*vendor_id, ids);
            continue;
        };

        let classification = vendor_tax.classify_all(ids);
        let architectures = classification
            .by_architecture
            .iter()
            .map(|(arch, matched)| ArchitectureListing {
                name: arch.clone(),
                devices: matched.iter().map(|id| DeviceListing::new(*id, &devices[id])).collect(),
            })
            .collect::<Vec<_>>();

        for listing in &architectures {
            report.totals.categorized_devices += listing.devices.len();
            report.totals.categorized_entries += listing.devices.iter().map(|d| d.count).sum::<usize>();
        }
        report.classified.push(VendorListing {
            vendor_id: *vendor_id,
            name: name.clone(),
            device_count: architectures.iter().map(|a| a.devices.len()).sum(),
            architectures,
            unmatched: Vec::new(),
        });
        remaining.insert(*vendor_id, classification.unmatched.into_iter().collect());
    }
    report.totals.devices += report.totals.categorized_devices;
    report.totals.entries += report.totals.categorized_entries;

    for (vendor_id, name) in &order {
        if !show_all && (*vendor_id == NO_VENDOR || *vendor_id == APPLE_VENDOR) {
            report.entries_skipped = true;
            continue;
        }
        let ids = remaining.get(vendor_id).map(Vec::as_slice).unwrap_or_default();
        if ids.is_empty() {
            continue;
        }
        let devices = observed.devices_of(*vendor_id).unwrap_or(&empty);
        let mut unmatched = Vec::new();
        for id in ids {
            if !show_all && *id == 0 {
                report.entries_skipped = true;
                continue;
            }
            unmatched.push(DeviceListing::new(*id, &devices[id]));
        }
        report.totals.devices += ids.len();
        report.totals.entries += unmatched.iter().map(|d| d.count).sum::<usize>();
        report.unclassified.push(VendorListing {
            vendor_id: *vendor_id,
            name: name.clone(),
            device_count: ids.len(),
            architectures: Vec::new(),
            unmatched,
        });
    }

    report
}

fn vendor_heading(listing: &VendorListing) -> String {
    if listing.name.is_empty() {
        format!("VendorId: 0x{:04x}", listing.vendor_id)
    } else {
        format!("{} VendorId: 0x{:04x}", listing.name, listing.vendor_id)
    }
}

/// Render the inventory as plain text.
pub fn render_inventory(report: &InventoryReport) -> String {
    let mut out = String::new();

    if report.used_taxonomy {
        out.push_str("\n=== The following devices have a corresponding entry in GPUInfo ===\n");
        for vendor in &report.classified {
            let _ = writeln!(out, "\n{}", vendor_heading(vendor));
            for arch in &vendor.architectures {
                let _ = writeln!(out, " - {}", arch.name);
                for device in &arch.devices {
                    for name in &device.names {
                        let _ = writeln!(out, "     + DeviceId: 0x{:04x}, {}", device.device_id, name);
                    }
                }
            }
        }
        out.push_str("\n=== The following devices had no corresponding entry in GPUInfo ===\n");
    }

    for vendor in &report.unclassified {
        let _ = writeln!(out, "\n{}, {} Devices", vendor_heading(vendor), vendor.device_count);
        for device in &vendor.unmatched {
            let _ = writeln!(out, " - DeviceId: 0x{:04x}, {} Entries", device.device_id, device.count);
            for name in &device.names {
                let _ = writeln!(out, "  {name}");
            }
        }
    }

    let t = &report.totals;
    let _ = writeln!(out, "\n{} entries, {} unique devices, {} vendors", t.entries, t.devices, t.vendors);
    if report.used_taxonomy {
        let _ = writeln!(
            out,
            "{} entries categorized ({:.2}%)",
            t.categorized_entries,
            t.categorized_entries_percent()
        );
        let _ = writeln!(
            out,
            "{} devices categorized ({:.2}%)",
            t.categorized_devices,
            t.categorized_devices_percent()
        );
    }
    if report.entries_skipped {
        out.push_str(
            "Some devices or vendors were skipped due to not being applicable to GPUInfo. \
             To view all devices use the -a command line option\n",
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed() -> ObservedDevices {
        let mut d = ObservedDevices::new();
        d.record(0x10de, 0x2204, "RTX 3090");
        d.record(0x10de, 0x2204, "RTX 3090");
        d.record(0x10de, 0x2501, "RTX 3060");
        d.record(0x10de, 0x2301, "Mystery");
        d.record(0x10de, 0x0000, "Zero");
        d.record(APPLE_VENDOR, 0x1, "Apple M1");
        d.record(NO_VENDOR, 0x0, "llvmpipe");
        d
    }

    fn taxonomy() -> Taxonomy {
        Taxonomy::parse(
            r#"{"vendors": {"NVIDIA": {"id": "0x10DE", "devices": [
                {"architecture": {"Ampere": ["0x2204"]}},
                {"mask": "0xFF00", "architecture": {"Ampere": ["0x2500"]}}
            ]}}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_build_with_taxonomy() {
        let tax = taxonomy();
        let r = build(&observed(), Some(&tax), false);
        assert_eq!(r.classified.len(), 1);
        let ampere = &r.classified[0].architectures[0];
        let ids: Vec<u32> = ampere.devices.iter().map(|d| d.device_id).collect();
        assert_eq!(ids, vec![0x2204, 0x2501]);

        assert_eq!(r.unclassified.len(), 1);
        let ids: Vec<u32> = r.unclassified[0].unmatched.iter().map(|d| d.device_id).collect();
        assert_eq!(ids, vec![0x2301]);
        assert!(r.entries_skipped);

        assert_eq!(r.totals.categorized_devices, 2);
        assert_eq!(r.totals.categorized_entries, 3);
        // Hidden device 0 of NVIDIA still counts as a device.
        assert_eq!(r.unclassified[0].device_count, 2);
        assert_eq!(r.totals.devices, 4);
        assert_eq!(r.totals.entries, 4);
        assert_eq!(r.totals.vendors, 3);
    }

    #[test]
    fn test_show_all_lists_everything() {
        let r = build(&observed(), None, true);
        assert!(!r.entries_skipped);
        assert!(r.classified.is_empty());
        let listed: usize = r.unclassified.iter().map(|v| v.unmatched.len()).sum();
        assert_eq!(listed, 6);
    }

    #[test]
    fn test_render_inventory() {
        let tax = taxonomy();
        let text = render_inventory(&build(&observed(), Some(&tax), false));
        assert!(text.contains("NVIDIA VendorId: 0x10de\n - Ampere\n     + DeviceId: 0x2204, RTX 3090\n"));
        assert!(text.contains("NVIDIA VendorId: 0x10de, 2 Devices\n - DeviceId: 0x2301, 1 Entries\n  Mystery\n"));
        assert!(text.contains("4 entries, 4 unique devices, 3 vendors\n"));
        assert!(text.contains("3 entries categorized (75.00%)\n"));
        assert!(text.contains("To view all devices use the -a command line option"));
    }

    #[test]
    fn test_vendor_header_kept_when_only_device_zero() {
        let mut d = ObservedDevices::new();
        d.record(0x8086, 0x0, "Intel stub");
        let r = build(&d, None, false);
        assert!(r.entries_skipped);
        assert_eq!(r.unclassified[0].device_count, 1);
        assert!(r.unclassified[0].unmatched.is_empty());

        let text = render_inventory(&r);
        assert!(text.contains("\nVendorId: 0x8086, 1 Devices\n\n0 entries, 1 unique devices, 1 vendors\n"));
    }

    #[test]
    fn test_json_shape() {
        let tax = taxonomy();
        let json = serde_json::to_value(build(&observed(), Some(&tax), false)).unwrap();
        assert_eq!(json["used_taxonomy"], true);
        assert_eq!(json["classified"][0]["name"], "NVIDIA");
        assert_eq!(json["classified"][0]["architectures"][0]["devices"][0]["device_id"], 0x2204);
        assert_eq!(json["unclassified"][0]["unmatched"][0]["names"], serde_json::json!(["Mystery"]));
        assert_eq!(json["totals"]["categorized_entries"], 3);
    }
}
