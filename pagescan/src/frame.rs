use crate::error::ScanError;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use libsane::{FrameFormat, Parameters};

/// Converts raw frame data read from the device into an image.
///
/// Only complete lines are used. When the device did not report the number of
/// lines up front, the height is whatever was received.
pub fn to_image(parameters: &Parameters, data: Vec<u8>) -> Result<DynamicImage, ScanError> {
    let channels = match parameters.format {
        FrameFormat::Gray => 1,
        FrameFormat::RGB => 3,
        format => {
            return Err(ScanError::UnsupportedFrame {
                format,
                depth: parameters.depth,
            })
        }
    };

    let width = parameters.pixels_per_line;
    let samples = width * channels;

    let row_bytes = match parameters.depth {
        1 => samples.div_ceil(8),
        8 => samples,
        16 => samples * 2,
        depth => {
            return Err(ScanError::UnsupportedFrame {
                format: parameters.format,
                depth,
            })
        }
    };

    if parameters.bytes_per_line < row_bytes {
        return Err(ScanError::MalformedFrame(format!(
            "{} bytes per line is not enough for {width} pixels of depth {}",
            parameters.bytes_per_line, parameters.depth
        )));
    }

    let received_lines = data.len() / parameters.bytes_per_line;
    let height = match parameters.lines {
        Some(lines) => lines.min(received_lines),
        None => received_lines,
    };

    if height == 0 {
        return Err(ScanError::NoImage);
    }

    if height < parameters.lines.unwrap_or(height) {
        log::warn!(
            "Device sent {height} of {} lines, image will be cropped",
            parameters.lines.unwrap_or(height)
        );
    }

    let rows = data
        .chunks_exact(parameters.bytes_per_line)
        .take(height)
        .map(|line| &line[..row_bytes]);

    let (width, height) = (dimension(width)?, dimension(height)?);

    let image = match (channels, parameters.depth) {
        (1, 8) => GrayImage::from_raw(width, height, rows.flatten().copied().collect())
            .map(DynamicImage::ImageLuma8),
        (3, 8) => RgbImage::from_raw(width, height, rows.flatten().copied().collect())
            .map(DynamicImage::ImageRgb8),
        (1, 16) => ImageBuffer::<Luma<u16>, _>::from_raw(width, height, samples16(rows))
            .map(DynamicImage::ImageLuma16),
        (3, 16) => ImageBuffer::<Rgb<u16>, _>::from_raw(width, height, samples16(rows))
            .map(DynamicImage::ImageRgb16),
        (1, 1) => GrayImage::from_raw(width, height, lineart(rows, samples))
            .map(DynamicImage::ImageLuma8),
        (3, 1) => RgbImage::from_raw(width, height, lineart(rows, samples))
            .map(DynamicImage::ImageRgb8),
        _ => unreachable!("channels and depth are checked above"),
    };

    image.ok_or_else(|| ScanError::MalformedFrame("pixel data does not fit image size".to_owned()))
}

fn dimension(value: usize) -> Result<u32, ScanError> {
    u32::try_from(value)
        .map_err(|_| ScanError::MalformedFrame(format!("image dimension {value} is too large")))
}

/// 16-bit samples come in the byte order of the host.
fn samples16<'a>(rows: impl Iterator<Item = &'a [u8]>) -> Vec<u16> {
    rows.flat_map(|row| row.chunks_exact(2))
        .map(|sample| u16::from_ne_bytes([sample[0], sample[1]]))
        .collect()
}

/// In lineart a set bit is black, most significant bit first.
fn lineart<'a>(rows: impl Iterator<Item = &'a [u8]>, samples: usize) -> Vec<u8> {
    rows.flat_map(|row| {
        (0..samples).map(move |i| {
            let bit = (row[i / 8] >> (7 - i % 8)) & 1;
            if bit == 1 {
                0x00
            } else {
                0xff
            }
        })
    })
    .collect()
}
