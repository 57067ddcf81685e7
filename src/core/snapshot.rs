// src/core/snapshot.rs - Summary snapshot file for the dashboard

use std::path::Path;

/// Write `summary` as pretty JSON, creating parent directories as needed.
/// Readers only ever see a complete file: it is written to a sibling temp
/// file and renamed into place.
pub fn write_snapshot(path: &Path, summary: &serde_json::Value) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_creates_dirs_and_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site").join("summary.json");
        let summary = json!({"ok": true, "models": [{"model": "a", "mean_total": 81.5}]});

        write_snapshot(&path, &summary).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"models\""));
        let back: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, summary);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_snapshot(&path, &json!({"v": 1})).unwrap();
        write_snapshot(&path, &json!({"v": 2})).unwrap();
        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["v"], 2);
    }
}
