use crate::{config, error::PreviewError};
use image::{
    imageops::FilterType, DynamicImage, ImageDecoder, ImageFormat, ImageReader, RgbaImage,
};
use std::{io, path::Path};

/// Writes the captured page to the preview file and reads it back the way
/// any other image file would be opened, honouring its EXIF orientation.
pub fn render(image: &DynamicImage, config: &config::Preview) -> Result<RgbaImage, PreviewError> {
    let path = &config.path;

    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| PreviewError::Save {
            path: path.clone(),
            source,
        })?;

    let reloaded = reload(path)?;

    let preview = fit(reloaded, config.max_width, config.max_height);

    log::debug!(
        "Preview {}x{} from '{}'",
        preview.width(),
        preview.height(),
        path.display()
    );

    Ok(preview.to_rgba8())
}

/// Opens an image file and turns it upright according to its EXIF orientation.
pub fn reload(path: &Path) -> Result<DynamicImage, PreviewError> {
    let decode_error = |source: image::ImageError| PreviewError::Decode {
        path: path.to_owned(),
        source,
    };
    let open_error = |source: io::Error| PreviewError::Open {
        path: path.to_owned(),
        source,
    };

    let mut decoder = ImageReader::open(path)
        .map_err(open_error)?
        .with_guessed_format()
        .map_err(open_error)?
        .into_decoder()
        .map_err(decode_error)?;

    let orientation = decoder.orientation().map_err(decode_error)?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(decode_error)?;

    log::trace!("Apply orientation {orientation:?} to '{}'", path.display());
    image.apply_orientation(orientation);

    Ok(image)
}

/// Shrinks the image to fit the bounds, keeping its aspect ratio.
/// Images that already fit are left alone.
pub fn fit(image: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    if image.width() <= max_width && image.height() <= max_height {
        return image;
    }

    image.resize(max_width, max_height, FilterType::Lanczos3)
}
