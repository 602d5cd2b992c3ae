//! Output rendering

use std::collections::BTreeMap;
use std::fmt::Write;

use quake_inventory::{
    InventorySnapshot, ProjectLimits, ProjectUsage, ResourceDescriptor, ResourceKind,
};
use serde_json::{Value, json};

/// Descriptor as a JSON object of its typed fields, without the kind tag
pub fn descriptor_json(descriptor: &ResourceDescriptor) -> serde_json::Result<Value> {
    let mut value = serde_json::to_value(descriptor)?;
    if let Value::Object(fields) = &mut value {
        fields.remove("kind");
    }
    Ok(value)
}

/// Descriptors as aligned text columns
pub fn descriptor_table(kind: ResourceKind, descriptors: &[ResourceDescriptor]) -> String {
    let headers = kind.attributes();
    let rows: Vec<Vec<String>> = descriptors
        .iter()
        .map(|d| {
            headers
                .iter()
                .map(|h| d.attribute(h).map(|v| v.into_owned()).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].len())
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
    push_row(&mut out, &header, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}

/// Summary printed after a refresh
pub fn refresh_summary(snapshot: &InventorySnapshot) -> Value {
    let counts: BTreeMap<String, usize> = snapshot
        .counts()
        .into_iter()
        .map(|(k, n)| (k.to_string(), n))
        .collect();
    json!({
        "generation": snapshot.generation(),
        "fetched_at": snapshot.fetched_at(),
        "counts": counts,
    })
}

/// Project limits as text
pub fn limits_text(limits: &ProjectLimits) -> String {
    fn show<T: ToString>(v: Option<T>) -> String {
        v.map_or_else(|| "unlimited".to_string(), |v| v.to_string())
    }
    let mut out = String::new();
    let _ = writeln!(out, "hosts:            {}", show(limits.hosts));
    let _ = writeln!(out, "volumes:          {}", show(limits.volumes));
    let _ = writeln!(out, "volume_capacity:  {}", show(limits.volume_capacity));
    let _ = writeln!(out, "private_networks: {}", show(limits.private_networks));
    out
}

/// Project usage as text
pub fn usage_text(usage: &ProjectUsage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "hosts:            {}", usage.hosts);
    let _ = writeln!(out, "volumes:          {}", usage.volumes);
    let _ = writeln!(out, "volume_capacity:  {}", usage.volume_capacity);
    let _ = writeln!(out, "private_networks: {}", usage.private_networks);
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quake_inventory::{Image, MachineSize};

    use super::*;

    fn images() -> Vec<ResourceDescriptor> {
        vec![
            ResourceDescriptor::Image(Image {
                id: "i1".into(),
                flavor: "gpu".into(),
                category: "compute".into(),
                version: "1.0".into(),
            }),
            ResourceDescriptor::Image(Image {
                id: "image-2".into(),
                flavor: "cpu".into(),
                category: "compute".into(),
                version: "10.4".into(),
            }),
        ]
    }

    #[test]
    fn test_table_alignment() {
        let table = descriptor_table(ResourceKind::Image, &images());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "ID       FLAVOR  CATEGORY  VERSION");
        assert_eq!(lines[1], "i1       gpu     compute   1.0");
        assert_eq!(lines[2], "image-2  cpu     compute   10.4");
    }

    #[test]
    fn test_descriptor_json() {
        let value = descriptor_json(&images()[0]).unwrap();
        assert_eq!(
            value,
            json!({"id": "i1", "flavor": "gpu", "category": "compute", "version": "1.0"})
        );
    }

    #[test]
    fn test_descriptor_json_keeps_numbers() {
        let size = ResourceDescriptor::MachineSize(MachineSize {
            id: "m1".into(),
            name: "G2i".into(),
            details: "2x Xeon".into(),
            cpu_cores: 16,
            memory_gib: 64,
        });
        let value = descriptor_json(&size).unwrap();
        assert_eq!(value["cpu_cores"], json!(16));
        assert_eq!(value["memory_gib"], json!(64));
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn test_usage_text() {
        let text = usage_text(&ProjectUsage {
            hosts: 2,
            volume_capacity: 40.5,
            ..Default::default()
        });
        assert!(text.contains("hosts:            2"));
        assert!(text.contains("volumes:          0"));
        assert!(text.contains("volume_capacity:  40.5"));
    }

    #[test]
    fn test_limits_text() {
        let text = limits_text(&ProjectLimits {
            hosts: Some(5),
            ..Default::default()
        });
        assert!(text.contains("hosts:            5"));
        assert!(text.contains("volumes:          unlimited"));
    }
}
