use crate::error::ExportError;
use ::image::DynamicImage;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument,
    PdfDocumentReference, Px,
};
use std::io;

pub struct PdfBuilder {
    doc: PdfDocumentReference,
    dpi: f32,
}

impl PdfBuilder {
    pub fn new(title: &str, dpi: f32) -> Self {
        Self {
            doc: PdfDocument::empty(title),
            dpi,
        }
    }

    /// Adds a page exactly the size of the image at the builder's resolution.
    pub fn add_image(&self, image: &DynamicImage) {
        let width = Px(image.width() as usize);
        let height = Px(image.height() as usize);

        let (page_width, page_height) = page_size(image.width(), image.height(), self.dpi);
        let (page, layer) = self.doc.add_page(page_width, page_height, "Image Layer");

        // Alpha would need a soft mask, scanned pages have none worth keeping.
        let (color_space, image_data) = match image {
            DynamicImage::ImageLuma8(gray) => (ColorSpace::Greyscale, gray.as_raw().clone()),
            image if image.color().has_color() => (ColorSpace::Rgb, image.to_rgb8().into_raw()),
            image => (ColorSpace::Greyscale, image.to_luma8().into_raw()),
        };

        Image::from(ImageXObject {
            width,
            height,
            color_space,
            bits_per_component: ColorBits::Bit8,
            interpolate: false,
            image_data,
            image_filter: None,
            smask: None,
            clipping_bbox: None,
        })
        .add_to_layer(
            self.doc.get_page(page).get_layer(layer),
            ImageTransform {
                dpi: Some(self.dpi),
                ..Default::default()
            },
        );
    }

    pub fn write_to<W: io::Write>(self, w: W) -> Result<(), ExportError> {
        let mut writer = io::BufWriter::with_capacity(128 * 1024, w);
        self.doc
            .save(&mut writer)
            .map_err(|err| ExportError::Pdf(err.to_string()))?;
        Ok(())
    }
}

pub fn page_size(width: u32, height: u32, dpi: f32) -> (Mm, Mm) {
    (
        Mm::from(Px(width as usize).into_pt(dpi)),
        Mm::from(Px(height as usize).into_pt(dpi)),
    )
}
