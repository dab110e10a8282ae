//! Image primitives and utilities.
//!
//! The crate uses a lightweight owned RGB image type (`OwnedImage`) that is
//! optimized for repeated cropping of screenshot regions.
//!
//! For read-only operations we borrow a view (`Image<'a>`) instead of copying
//! pixels. A crop that has to outlive its source (the per-phrase blocks and
//! their halves) is materialized with `to_owned_image()`, so every record owns
//! its pixels exclusively.

use anyhow::{Context, Result};

/// Owned RGB image (no alpha).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl OwnedImage {
    /// Build an image by evaluating `f` at every `(x, y)`.
    ///
    /// Mostly useful for synthetic images in tests and tooling.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Color) -> Self {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Decode an image file from disk (alpha is discarded).
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("decode image {:?}", path))?
            .to_rgb8();
        Ok(Self::from_rgb(&img))
    }

    /// Decode an in-memory image buffer (any format `image` understands).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .context("decode image bytes")?
            .to_rgb8();
        Ok(Self::from_rgb(&img))
    }

    pub fn from_rgb(img: &image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let data = img
            .pixels()
            .map(|p| Color::new(p.0[0], p.0[1], p.0[2]))
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Create a borrowed view of this entire image.
    pub fn as_image<'a>(&'a self) -> Image<'a> {
        Image {
            x1: 0,
            y1: 0,
            x2: self.width,
            y2: self.height,
            true_width: self.width,
            data: &self.data,
        }
    }

    /// Two-color rendition of this image: luminance above `threshold` becomes
    /// pure white, everything else pure black.
    ///
    /// The result keeps RGB encoding with only two luminance values, so the
    /// same pixel type flows through the whole pipeline. Applying the same
    /// threshold twice is a no-op.
    pub fn binarized(&self, threshold: u8) -> OwnedImage {
        use imageproc::contrast::{threshold as binarize, ThresholdType};

        let gray = self.to_gray_image();
        let bin = binarize(&gray, threshold, ThresholdType::Binary);
        Self::from_gray_as_rgb(&bin)
    }

    /// Convert to a grayscale `GrayImage` (luma).
    pub fn to_gray_image(&self) -> image::GrayImage {
        use image::{GrayImage, Luma};
        let mut out = GrayImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.data[(x + y * self.width) as usize];
                out.put_pixel(x, y, Luma([c.luma()]));
            }
        }
        out
    }

    /// Create an RGB `OwnedImage` from a grayscale image (each pixel repeated
    /// into RGB).
    pub fn from_gray_as_rgb(gray: &image::GrayImage) -> Self {
        let (w, h) = gray.dimensions();
        let mut data = Vec::with_capacity((w * h) as usize);
        for p in gray.pixels() {
            let v = p.0[0];
            data.push(Color::new(v, v, v));
        }
        Self {
            width: w,
            height: h,
            data,
        }
    }

    /// Resize this image to the given height (preserving aspect ratio).
    ///
    /// Uses `fast_image_resize` (SIMD-optimized) and keeps output in
    /// `Vec<Color>`.
    pub fn resize_h(&mut self, height: u32) {
        if self.height == height {
            return;
        }

        let height = height.max(1);
        let width = (self.width as u64 * height as u64 / self.height.max(1) as u64) as u32;

        // SAFETY: `Color` is `#[repr(C)]` with 3 x `u8`, so it is
        // layout-compatible with `fast_image_resize::pixels::U8x3`
        // (alignment 1).
        let src_pixels = unsafe {
            std::slice::from_raw_parts(
                self.data.as_ptr() as *const fast_image_resize::pixels::U8x3,
                self.data.len(),
            )
        };

        let src =
            fast_image_resize::images::ImageRef::from_pixels(self.width, self.height, src_pixels)
                .expect("fast_image_resize: ImageRef::from_pixels failed");

        let mut dst =
            fast_image_resize::images::Image::new(width, height, fast_image_resize::PixelType::U8x3);

        let mut resizer = fast_image_resize::Resizer::new();
        let options = fast_image_resize::ResizeOptions::new().resize_alg(
            fast_image_resize::ResizeAlg::Interpolation(fast_image_resize::FilterType::CatmullRom),
        );

        resizer
            .resize(&src, &mut dst, &Some(options))
            .expect("fast_image_resize: resize failed");

        let bytes: Vec<u8> = dst.into_vec();
        let mut data = Vec::with_capacity((width * height) as usize);
        for px in bytes.chunks_exact(3) {
            data.push(Color::new(px[0], px[1], px[2]));
        }

        self.width = width;
        self.height = height;
        self.data = data;
    }

    #[inline]
    pub fn resized_h(mut self, height: u32) -> Self {
        self.resize_h(height);
        self
    }

    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        self.as_image().save_png(path)
    }
}

// ----------

/// Borrowed image view into an `OwnedImage`.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    true_width: u32,
    data: &'a [Color],
}

impl<'a> Image<'a> {
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Pixel at view-relative coordinates. Panics when out of bounds.
    #[inline(always)]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        debug_assert!(x < self.width() && y < self.height());
        self.data[(self.x1 + x + (self.y1 + y) * self.true_width) as usize]
    }

    pub fn to_owned_image(self) -> OwnedImage {
        let mut data = Vec::with_capacity((self.width() * self.height()) as usize);
        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                data.push(self.data[(x + y * self.true_width) as usize]);
            }
        }

        OwnedImage {
            width: self.width(),
            height: self.height(),
            data,
        }
    }

    pub fn get_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; (self.width() * self.height() * 3) as usize];
        let mut i = 0;
        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                let clr = self.data[(x + y * self.true_width) as usize];
                bytes[i] = clr.r;
                bytes[i + 1] = clr.g;
                bytes[i + 2] = clr.b;
                i += 3;
            }
        }
        bytes
    }

    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let bytes = self.get_bytes();
        let img = image::RgbImage::from_raw(self.width(), self.height(), bytes)
            .context("RgbImage::from_raw failed")?;
        img.save_with_format(path, image::ImageFormat::Png)
            .context("save png")?;
        Ok(())
    }

    /// Create an arbitrary subimage (relative coordinates, clamped to bounds).
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);

        Self {
            x1: self.x1 + x,
            y1: self.y1 + y,
            x2: self.x1 + x + width,
            y2: self.y1 + y + height,
            true_width: self.true_width,
            data: self.data,
        }
    }
}

// ----------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Compute luma (grayscale intensity).
    pub fn luma(&self) -> u8 {
        let r = self.r as u32;
        let g = self.g as u32;
        let b = self.b as u32;
        ((299 * r + 587 * g + 114 * b) / 1000) as u8
    }

    /// Sum of the three channels. The gutter detector compares this against a
    /// per-layout reference value.
    #[inline]
    pub fn sum(&self) -> u32 {
        self.r as u32 + self.g as u32 + self.b as u32
    }
}
