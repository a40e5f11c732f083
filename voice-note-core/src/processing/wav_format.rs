//! Canonical 44-byte RIFF header for the streaming 16-bit PCM writer.

/// Size of the canonical WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

const FORMAT_PCM: u16 = 1;

/// Generate a 44-byte WAV RIFF header.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    file size - 8 (36 + data_size)
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bit_depth / 8
/// [32-33]  block_align = channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(sample_rate: u32, bit_depth: u16, channels: u16, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let block_align = channels * bit_depth / 8;
    let byte_rate = sample_rate * block_align as u32;

    let mut header = [0u8; WAV_HEADER_SIZE];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());
    header
}

/// Patch the RIFF chunk size (offset 4) and data size (offset 40) once
/// the amount of sample data is known.
pub fn patch_sizes(header: &mut [u8], data_size: u64) {
    let data_size = u32::try_from(data_size).unwrap_or(u32::MAX);
    header[4..8].copy_from_slice(&data_size.saturating_add(36).to_le_bytes());
    header[40..44].copy_from_slice(&data_size.to_le_bytes());
}
