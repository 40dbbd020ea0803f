//! Packet stream to PCM decoding.

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use twetalk_opus::{pcm, DecoderParams, DecoderSession};

use super::{print_summary, read_bytes, split_packets, write_bytes};
use crate::Cli;

/// Decode a fixed-size packet stream into s16le PCM.
#[derive(Args)]
pub struct DecodeCommand {
    /// Input packet stream
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Output PCM file (s16le, interleaved)
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Output sample rate in Hz
    #[arg(long, default_value_t = 16000)]
    sample_rate: i32,

    /// Output channel count
    #[arg(long, default_value_t = 1)]
    channels: i32,

    /// Size of every packet in the stream
    #[arg(long)]
    packet_bytes: usize,

    /// Packet indices to treat as lost (comma-separated)
    #[arg(long, value_delimiter = ',')]
    drop: Vec<usize>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub(crate) struct DecodeSummary {
    pub packets: usize,
    /// Lost packets decoded with the FEC flag against the packet after them.
    /// The output is only a true rebuild when that packet carries in-band
    /// FEC; otherwise libopus conceals the frame.
    pub fec_requests: usize,
    pub concealed: usize,
    pub samples_per_channel: usize,
}

impl DecodeCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let stream = read_bytes(&self.input)?;
        let mut decoder =
            DecoderSession::new(&DecoderParams::new(self.sample_rate, self.channels))?;

        let lost: BTreeSet<usize> = self.drop.iter().copied().collect();
        let (samples, summary) = decode_stream(&mut decoder, &stream, self.packet_bytes, &lost)?;
        decoder.close();

        write_bytes(&self.output, &pcm::samples_to_bytes(&samples))?;
        tracing::info!(packets = summary.packets, "decoded {}", self.output.display());
        print_summary(&summary, cli.json)
    }
}

/// Splits `stream` into packets and decodes them in order.
///
/// A packet listed in `lost` is decoded with the FEC flag against the next
/// packet when that one arrived, and concealed otherwise.
pub(crate) fn decode_stream(
    decoder: &mut DecoderSession,
    stream: &[u8],
    packet_bytes: usize,
    lost: &BTreeSet<usize>,
) -> anyhow::Result<(Vec<i16>, DecodeSummary)> {
    let packets = split_packets(stream, packet_bytes)?;
    let channels = decoder.channels() as usize;
    let mut out = vec![0i16; decoder.frame_len()];
    let mut samples = Vec::with_capacity(packets.len() * out.len());
    let mut summary = DecodeSummary {
        packets: packets.len(),
        ..Default::default()
    };

    for (index, packet) in packets.iter().enumerate() {
        let next = packets
            .get(index + 1)
            .filter(|_| !lost.contains(&(index + 1)));
        let result = if !lost.contains(&index) {
            decoder.decode(packet, &mut out, false)
        } else if let Some(next) = next {
            summary.fec_requests += 1;
            decoder.decode(next, &mut out, true)
        } else {
            summary.concealed += 1;
            decoder.conceal(&mut out)
        };
        let n = result.map_err(|err| anyhow::anyhow!("packet {}: {}", index, err))?;

        samples.extend_from_slice(&out[..n * channels]);
        summary.samples_per_channel += n;
    }

    Ok((samples, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::encode::encode_stream;
    use twetalk_opus::{EncoderParams, EncoderSession};

    fn encoded(frames: usize) -> Vec<u8> {
        let params = EncoderParams::new(16000, 1).target_bytes(180);
        let mut encoder = EncoderSession::new(&params).unwrap();
        let samples: Vec<i16> = (0..960 * frames)
            .map(|i| (((i as f32) * 0.05).sin() * 6000.0) as i16)
            .collect();
        encode_stream(&mut encoder, &samples).unwrap()
    }

    fn decoder() -> DecoderSession {
        DecoderSession::new(&DecoderParams::new(16000, 1)).unwrap()
    }

    #[test]
    fn test_decode_stream() {
        let stream = encoded(4);
        let (samples, summary) =
            decode_stream(&mut decoder(), &stream, 180, &BTreeSet::new()).unwrap();
        assert_eq!(summary.packets, 4);
        assert_eq!(summary.samples_per_channel, 4 * 960);
        assert_eq!(samples.len(), 4 * 960);
    }

    #[test]
    fn test_decode_stream_with_loss() {
        let stream = encoded(4);
        let lost: BTreeSet<usize> = [1, 3].into_iter().collect();
        let (_, summary) = decode_stream(&mut decoder(), &stream, 180, &lost).unwrap();
        assert_eq!(summary.packets, 4);
        assert_eq!(summary.fec_requests, 1);
        assert_eq!(summary.concealed, 1);
        assert_eq!(summary.samples_per_channel, 4 * 960);
    }

    #[test]
    fn test_decode_stream_rejects_ragged_input() {
        let err = decode_stream(&mut decoder(), &[0u8; 181], 180, &BTreeSet::new()).unwrap_err();
        assert!(err.to_string().contains("not a multiple"));
        assert!(decode_stream(&mut decoder(), &[], 0, &BTreeSet::new()).is_err());
    }
}
