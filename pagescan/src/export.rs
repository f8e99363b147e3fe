use crate::{config, error::ExportError, pdf_builder::PdfBuilder};
use image::{DynamicImage, ImageFormat};
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use strum::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ExportFormat {
    #[strum(serialize = "PNG")]
    Png,

    #[strum(serialize = "PDF")]
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn filter_name(self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG image",
            ExportFormat::Pdf => "PDF",
        }
    }

    pub fn dialog_title(self) -> &'static str {
        match self {
            ExportFormat::Png => "Save image",
            ExportFormat::Pdf => "Save PDF",
        }
    }
}

/// Appends the format's extension when the chosen path has none.
pub fn with_default_extension(path: PathBuf, format: ExportFormat) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(format.extension())
    }
}

pub fn write(
    image: &DynamicImage,
    path: &Path,
    format: ExportFormat,
    config: &config::Export,
) -> Result<(), ExportError> {
    log::debug!("Export {format} to '{}'", path.display());

    match format {
        ExportFormat::Png => write_png(image, path),
        ExportFormat::Pdf => write_pdf(image, path, config.pdf_dpi),
    }
}

pub fn write_png(image: &DynamicImage, path: &Path) -> Result<(), ExportError> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

pub fn write_pdf(image: &DynamicImage, path: &Path, dpi: f32) -> Result<(), ExportError> {
    let builder = PdfBuilder::new("Scan", dpi);
    builder.add_image(image);

    let file = File::create(path)?;
    builder.write_to(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use lopdf::{Document, Object};
    use strum::IntoEnumIterator;

    fn sample_page() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(40, 30, |x, y| {
            Rgb([(x * 6) as u8, (y * 8) as u8, 128])
        }))
    }

    /// Returns width, height and decoded samples of the only image in the file.
    fn embedded_image(path: &Path) -> (i64, i64, Vec<u8>) {
        let document = Document::load(path).unwrap();

        let images: Vec<_> = document
            .objects
            .values()
            .filter_map(|object| match object {
                Object::Stream(stream)
                    if stream
                        .dict
                        .get(b"Subtype")
                        .and_then(Object::as_name)
                        .is_ok_and(|name| name == b"Image") =>
                {
                    Some(stream)
                }
                _ => None,
            })
            .collect();

        assert_eq!(images.len(), 1, "expected exactly one image");
        let stream = images[0];

        let width = stream.dict.get(b"Width").and_then(Object::as_i64).unwrap();
        let height = stream.dict.get(b"Height").and_then(Object::as_i64).unwrap();
        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        (width, height, content)
    }

    #[test]
    fn default_extension() {
        assert_eq!(
            with_default_extension(PathBuf::from("/tmp/page"), ExportFormat::Pdf),
            PathBuf::from("/tmp/page.pdf")
        );
        assert_eq!(
            with_default_extension(PathBuf::from("/tmp/page.PNG"), ExportFormat::Png),
            PathBuf::from("/tmp/page.PNG")
        );
    }

    #[test]
    fn format_names() {
        let names: Vec<_> = ExportFormat::iter().map(|format| format.to_string()).collect();

        assert_eq!(names, ["PNG", "PDF"]);
    }

    #[test]
    fn png_keeps_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        let image = sample_page();

        write_png(&image, &path).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.to_rgb8(), image.to_rgb8());
    }

    #[test]
    fn pdf_embeds_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.pdf");
        let image = sample_page();

        write_pdf(&image, &path, 100.0).unwrap();

        let (width, height, samples) = embedded_image(&path);
        assert_eq!((width, height), (40, 30));
        assert_eq!(samples, image.to_rgb8().into_raw());
    }

    #[test]
    fn pdf_keeps_gray_pages_gray() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.pdf");
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 4, Luma([200])));

        write_pdf(&image, &path, 100.0).unwrap();

        let (_, _, samples) = embedded_image(&path);
        assert_eq!(samples, vec![200; 32]);
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("page.pdf");

        let result = write(&sample_page(), &path, ExportFormat::Pdf, &Default::default());

        assert!(matches!(result, Err(ExportError::Io(_))));
    }
}
