//! Packet header listing.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use twetalk_opus::PacketInfo;

use super::{print_summary, read_bytes, split_packets};
use crate::Cli;

/// Print the TOC of every packet in a fixed-size stream.
#[derive(Args)]
pub struct InspectCommand {
    /// Input packet stream
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Size of every packet in the stream
    #[arg(long)]
    packet_bytes: usize,
}

#[derive(Debug, Serialize)]
struct PacketRow {
    index: usize,
    config: u8,
    mode: String,
    bandwidth: String,
    stereo: bool,
    frames: u8,
    duration_us: u64,
    padded: bool,
}

impl InspectCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let stream = read_bytes(&self.input)?;
        let rows = inspect_stream(&stream, self.packet_bytes)?;
        if cli.json {
            return print_summary(&rows, true);
        }
        for row in &rows {
            println!(
                "#{:<5} config={:<2} {:<6} {:<13} stereo={} frames={} {}us padded={}",
                row.index,
                row.config,
                row.mode,
                row.bandwidth,
                row.stereo,
                row.frames,
                row.duration_us,
                row.padded,
            );
        }
        Ok(())
    }
}

fn inspect_stream(stream: &[u8], packet_bytes: usize) -> anyhow::Result<Vec<PacketRow>> {
    split_packets(stream, packet_bytes)?
        .into_iter()
        .enumerate()
        .map(|(index, packet)| {
            let info = PacketInfo::parse(packet)
                .ok_or_else(|| anyhow::anyhow!("packet {}: truncated header", index))?;
            Ok(PacketRow {
                index,
                config: info.config,
                mode: format!("{:?}", info.mode()),
                bandwidth: format!("{:?}", info.bandwidth()),
                stereo: info.stereo,
                frames: info.frame_count,
                duration_us: info.duration().as_micros() as u64,
                padded: info.padded,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_stream() {
        // Two 3-byte packets: SILK WB 60ms code 0, CELT FB 20ms code 3 x3 padded.
        let stream = [0b0101_1000, 0x11, 0x22, 0b1111_1011, 0b0100_0011, 0x00];
        let rows = inspect_stream(&stream, 3).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mode, "Silk");
        assert_eq!(rows[0].duration_us, 60_000);
        assert!(!rows[0].padded);
        assert_eq!(rows[1].mode, "Celt");
        assert_eq!(rows[1].frames, 3);
        assert!(rows[1].padded);
    }

    #[test]
    fn test_inspect_rejects_partial_packet() {
        let stream = [0b0101_1000, 0x11, 0x22, 0b0101_1000];
        let err = inspect_stream(&stream, 3).unwrap_err();
        assert!(err.to_string().contains("not a multiple of packet size 3"));
        assert!(inspect_stream(&stream, 0).is_err());
    }

    #[test]
    fn test_inspect_truncated() {
        let err = inspect_stream(&[0b0000_0011], 1).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }
}
