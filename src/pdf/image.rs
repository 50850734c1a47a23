//! Raster images as image XObjects, with alpha split off into a
//! `/DeviceGray` soft mask. A color key (`/Mask`) can additionally make
//! one exact color transparent.

use super::object::{Dictionary, IdAllocator, IndirectObject, ObjectId, Stream, Value};
use crate::color::{rgb_to_cmyk_bytes, ColorMode};
use crate::error::{FolioError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceRgb,
    DeviceCmyk,
    DeviceGray,
}

impl ColorSpace {
    pub fn pdf_name(self) -> &'static str {
        match self {
            ColorSpace::DeviceRgb => "DeviceRGB",
            ColorSpace::DeviceCmyk => "DeviceCMYK",
            ColorSpace::DeviceGray => "DeviceGray",
        }
    }

    pub fn channels(self) -> usize {
        match self {
            ColorSpace::DeviceRgb => 3,
            ColorSpace::DeviceCmyk => 4,
            ColorSpace::DeviceGray => 1,
        }
    }
}

/// An 8-bit image XObject. Pixel data is deflated once, at construction.
#[derive(Debug, Clone)]
pub struct XObjectImage {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    stream: Stream,
    smask: Option<Box<XObjectImage>>,
    /// One component value per channel; pixels matching all of them are
    /// not painted.
    color_key: Option<Vec<u8>>,
}

impl XObjectImage {
    /// Split row-major RGBA8 pixels into color channels for `mode` plus an
    /// alpha soft mask. Alpha passes through untouched.
    pub fn from_rgba(
        ids: &mut IdAllocator,
        width: u32,
        height: u32,
        rgba: &[u8],
        mode: ColorMode,
    ) -> Result<Self> {
        let pixels = width as usize * height as usize;
        if rgba.len() != pixels * 4 {
            return Err(FolioError::Image(format!(
                "expected {} bytes of RGBA for {}x{}, got {}",
                pixels * 4,
                width,
                height,
                rgba.len()
            )));
        }

        let color_space = match mode {
            ColorMode::Rgb => ColorSpace::DeviceRgb,
            ColorMode::Cmyk => ColorSpace::DeviceCmyk,
        };
        let mut color = Vec::with_capacity(pixels * color_space.channels());
        let mut alpha = Vec::with_capacity(pixels);
        for px in rgba.chunks_exact(4) {
            match mode {
                ColorMode::Rgb => color.extend_from_slice(&px[..3]),
                ColorMode::Cmyk => color.extend_from_slice(&rgb_to_cmyk_bytes(px[0], px[1], px[2])),
            }
            alpha.push(px[3]);
        }

        // The mask is allocated first so it always numbers below its parent.
        let smask = XObjectImage {
            id: ids.next_id(),
            width,
            height,
            color_space: ColorSpace::DeviceGray,
            stream: Stream::deflated(&alpha),
            smask: None,
            color_key: None,
        };
        Ok(XObjectImage {
            id: ids.next_id(),
            width,
            height,
            color_space,
            stream: Stream::deflated(&color),
            smask: Some(Box::new(smask)),
            color_key: None,
        })
    }

    /// Mask out pixels whose color components equal `key`, given in the
    /// image's own color space (three values for RGB, four for CMYK).
    pub fn set_color_key(&mut self, key: &[u8]) -> Result<()> {
        if key.len() != self.color_space.channels() {
            return Err(FolioError::Image(format!(
                "color key needs {} components for {}, got {}",
                self.color_space.channels(),
                self.color_space.pdf_name(),
                key.len()
            )));
        }
        self.color_key = Some(key.to_vec());
        Ok(())
    }

    pub fn color_key(&self) -> Option<&[u8]> {
        self.color_key.as_deref()
    }

    pub fn smask(&self) -> Option<&XObjectImage> {
        self.smask.as_deref()
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    pub fn resource_name(&self) -> String {
        self.id.resource_name()
    }

    fn dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::typed("XObject");
        dict.set("Subtype", Value::name("Image"))
            .set("Width", self.width)
            .set("Height", self.height)
            .set("BitsPerComponent", 8)
            .set("ColorSpace", Value::name(self.color_space.pdf_name()))
            .set_opt("SMask", self.smask.as_ref().map(|m| m.id))
            .set_opt(
                "Mask",
                self.color_key
                    .as_ref()
                    .map(|key| Value::numbers(key.iter().flat_map(|&v| [v, v]))),
            );
        if self.color_space == ColorSpace::DeviceCmyk {
            dict.set("Decode", Value::numbers([0, 1, 0, 1, 0, 1, 0, 1]));
        }
        dict
    }

    /// The soft mask, then the image itself.
    pub fn objects(&self) -> Vec<IndirectObject> {
        let mut objects = Vec::with_capacity(2);
        if let Some(smask) = &self.smask {
            objects.extend(smask.objects());
        }
        objects.push(IndirectObject::with_stream(self.id, self.dictionary(), self.stream.clone()));
        objects
    }
}
