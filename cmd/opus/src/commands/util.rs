//! Utility functions for CLI commands.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;

/// Loads a YAML or JSON file, picking the parser by extension.
pub fn load_file<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml");

    let result = match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("parse {}", path.display()))?,
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("parse {}", path.display()))?,
    };

    Ok(result)
}

pub fn read_bytes(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read {}", path.display()))
}

pub fn write_bytes(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, data).with_context(|| format!("write {}", path.display()))
}

/// Splits a stream of fixed-size packets, rejecting a trailing partial one.
pub fn split_packets(stream: &[u8], packet_bytes: usize) -> anyhow::Result<Vec<&[u8]>> {
    if packet_bytes == 0 {
        anyhow::bail!("packet size must be positive");
    }
    if stream.len() % packet_bytes != 0 {
        anyhow::bail!(
            "stream length {} is not a multiple of packet size {}",
            stream.len(),
            packet_bytes
        );
    }
    Ok(stream.chunks(packet_bytes).collect())
}

/// Prints a summary either as JSON or as `key: value` lines.
pub fn print_summary<T: Serialize>(summary: &T, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        print!("{}", serde_yaml::to_string(summary)?);
    }
    Ok(())
}
