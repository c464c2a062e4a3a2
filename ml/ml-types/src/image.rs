//! Dense image type.

use serde::{Deserialize, Serialize};

use crate::error::{MlTypesError, Result};

/// Channel layout of an [`Image`].
///
/// # Example
///
/// ```
/// use ml_types::ColorType;
///
/// assert_eq!(ColorType::Gray.channels(), 1);
/// assert_eq!(ColorType::Rgb.channels(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ColorType {
    /// Single luminance channel.
    Gray,

    /// Red, green, blue.
    #[default]
    Rgb,
}

impl ColorType {
    /// Returns the number of channels.
    #[must_use]
    pub const fn channels(&self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
        }
    }

    /// Returns the color type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Gray => "gray",
            Self::Rgb => "rgb",
        }
    }
}

impl std::fmt::Display for ColorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A dense image in HWC (Height-Width-Channel) layout.
///
/// Pixel values are `f32`, nominally in `[0, 1]` for raw images. Encoded
/// images hold normalized values and may leave that range.
///
/// # Example
///
/// ```
/// use ml_types::{ColorType, Image};
///
/// let mut image = Image::zeros(2, 2, ColorType::Gray);
/// image.set(1, 0, 0, 0.75);
///
/// assert_eq!(image.get(1, 0, 0), 0.75);
/// assert_eq!(image.len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    width: usize,
    height: usize,
    color: ColorType,
    data: Vec<f32>,
}

impl Image {
    /// Creates an image from HWC data.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero or the data length
    /// does not equal `height * width * channels`.
    pub fn new(width: usize, height: usize, color: ColorType, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MlTypesError::invalid_dimensions(width, height));
        }
        let expected = width * height * color.channels();
        if data.len() != expected {
            return Err(MlTypesError::data_size_mismatch(expected, data.len()));
        }
        Ok(Self {
            width,
            height,
            color,
            data,
        })
    }

    /// Creates an image with every value set to `value`.
    #[must_use]
    pub fn filled(width: usize, height: usize, color: ColorType, value: f32) -> Self {
        Self {
            width,
            height,
            color,
            data: vec![value; width * height * color.channels()],
        }
    }

    /// Creates a black image.
    #[must_use]
    pub fn zeros(width: usize, height: usize, color: ColorType) -> Self {
        Self::filled(width, height, color, 0.0)
    }

    /// Creates an RGB image from 8-bit interleaved data.
    ///
    /// # Errors
    ///
    /// Returns an error if the byte count does not match the dimensions.
    pub fn from_rgb8(width: usize, height: usize, bytes: &[u8]) -> Result<Self> {
        let data = bytes.iter().map(|&b| f32::from(b) / 255.0).collect();
        Self::new(width, height, ColorType::Rgb, data)
    }

    /// Creates a gray image from 8-bit data.
    ///
    /// # Errors
    ///
    /// Returns an error if the byte count does not match the dimensions.
    pub fn from_gray8(width: usize, height: usize, bytes: &[u8]) -> Result<Self> {
        let data = bytes.iter().map(|&b| f32::from(b) / 255.0).collect();
        Self::new(width, height, ColorType::Gray, data)
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Channel layout.
    #[must_use]
    pub const fn color(&self) -> ColorType {
        self.color
    }

    /// Number of channels.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.color.channels()
    }

    /// Returns `(height, width, channels)`.
    #[must_use]
    pub const fn dims(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.color.channels())
    }

    /// Total number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the image holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat HWC data.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable flat HWC data.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the image, returning the flat HWC data.
    #[must_use]
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Offset of `(x, y, channel)` in the flat data.
    #[inline]
    #[must_use]
    pub const fn offset(&self, x: usize, y: usize, channel: usize) -> usize {
        (y * self.width + x) * self.color.channels() + channel
    }

    /// Returns the value at `(x, y, channel)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize, channel: usize) -> f32 {
        self.data[self.offset(x, y, channel)]
    }

    /// Sets the value at `(x, y, channel)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, channel: usize, value: f32) {
        let offset = self.offset(x, y, channel);
        self.data[offset] = value;
    }

    /// Returns all channel values of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let start = self.offset(x, y, 0);
        &self.data[start..start + self.channels()]
    }

    /// Reshapes the image in place, keeping the allocation.
    ///
    /// Contents are unspecified afterwards; callers overwrite every value.
    pub fn reshape_buffer(&mut self, width: usize, height: usize, color: ColorType) {
        self.width = width;
        self.height = height;
        self.color = color;
        self.data.resize(width * height * color.channels(), 0.0);
    }

    /// Converts to another color type.
    ///
    /// Gray to RGB replicates the channel. RGB to gray uses Rec. 601 luma
    /// weights.
    #[must_use]
    pub fn to_color(&self, color: ColorType) -> Self {
        if color == self.color {
            return self.clone();
        }
        let data = match (self.color, color) {
            (ColorType::Gray, ColorType::Rgb) => {
                self.data.iter().flat_map(|&v| [v, v, v]).collect()
            }
            (ColorType::Rgb, ColorType::Gray) => self
                .data
                .chunks_exact(3)
                .map(|rgb| 0.114f32.mul_add(rgb[2], 0.299f32.mul_add(rgb[0], 0.587 * rgb[1])))
                .collect(),
            _ => self.data.clone(),
        };
        Self {
            width: self.width,
            height: self.height,
            color,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn image_new_validates_length() {
        assert!(Image::new(2, 2, ColorType::Rgb, vec![0.0; 12]).is_ok());

        let err = Image::new(2, 2, ColorType::Rgb, vec![0.0; 10]);
        assert_eq!(err, Err(MlTypesError::data_size_mismatch(12, 10)));
    }

    #[test]
    fn image_new_rejects_zero_dimensions() {
        let err = Image::new(0, 2, ColorType::Gray, Vec::new());
        assert!(matches!(err, Err(MlTypesError::InvalidDimensions { .. })));
    }

    #[test]
    fn image_dims_are_hwc() {
        let image = Image::zeros(5, 3, ColorType::Rgb);
        assert_eq!(image.dims(), (3, 5, 3));
        assert_eq!(image.len(), 45);
    }

    #[test]
    fn image_get_set() {
        let mut image = Image::zeros(3, 2, ColorType::Rgb);
        image.set(2, 1, 1, 0.25);

        assert_relative_eq!(image.get(2, 1, 1), 0.25);
        assert_eq!(image.offset(2, 1, 1), (3 + 2) * 3 + 1);
        assert_eq!(image.pixel(2, 1), &[0.0, 0.25, 0.0]);
    }

    #[test]
    fn image_from_rgb8() {
        let image = Image::from_rgb8(1, 1, &[255, 0, 51]);
        let image = image.unwrap_or_else(|_| Image::zeros(1, 1, ColorType::Rgb));

        assert_relative_eq!(image.get(0, 0, 0), 1.0);
        assert_relative_eq!(image.get(0, 0, 1), 0.0);
        assert_relative_eq!(image.get(0, 0, 2), 0.2);
    }

    #[test]
    fn image_gray_to_rgb() {
        let gray = Image::filled(2, 2, ColorType::Gray, 0.4);
        let rgb = gray.to_color(ColorType::Rgb);

        assert_eq!(rgb.channels(), 3);
        assert!(rgb.data().iter().all(|&v| (v - 0.4).abs() < 1e-6));
    }

    #[test]
    fn image_rgb_to_gray() {
        let rgb = Image::filled(1, 1, ColorType::Rgb, 1.0);
        let gray = rgb.to_color(ColorType::Gray);

        assert_eq!(gray.channels(), 1);
        assert_relative_eq!(gray.get(0, 0, 0), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn image_reshape_buffer() {
        let mut image = Image::zeros(8, 8, ColorType::Rgb);
        image.reshape_buffer(2, 3, ColorType::Gray);

        assert_eq!(image.dims(), (3, 2, 1));
        assert_eq!(image.len(), 6);
    }

    #[test]
    fn color_type_display() {
        assert_eq!(format!("{}", ColorType::Gray), "gray");
        assert_eq!(format!("{}", ColorType::Rgb), "rgb");
    }

    #[test]
    fn image_serialization() {
        let image = Image::filled(2, 1, ColorType::Gray, 0.5);
        let json = serde_json::to_string(&image);
        assert!(json.is_ok());

        let parsed: std::result::Result<Image, _> = serde_json::from_str(&json.unwrap_or_default());
        assert!(parsed.is_ok());
    }
}
