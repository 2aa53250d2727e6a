use std::fmt;

/// DPI at which stored sizes are displayed unscaled.
pub const DEFAULT_DPI: f64 = 96.0;

/// Converts between stored sizes (at 100% scale) and display pixels.
///
/// Both directions round half up: `floor(x + 0.5)`.
pub trait DpiConverter: Send + Sync + fmt::Debug {
    fn dpi(&self) -> f64;

    /// Display pixels per stored pixel.
    fn factor(&self) -> f64 {
        self.dpi() / DEFAULT_DPI
    }

    /// Stored size to display pixels.
    fn to_display(&self, pixel: i32) -> i32 {
        round_half_up(f64::from(pixel) * self.factor())
    }

    /// Display pixels to stored size.
    fn to_pixel(&self, display: i32) -> i32 {
        let factor = self.factor();
        if factor <= 0.0 {
            return display;
        }
        round_half_up(f64::from(display) / factor)
    }
}

/// A converter with a fixed DPI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedScalingDpiConverter {
    dpi: f64,
}

impl FixedScalingDpiConverter {
    pub fn new(dpi: f64) -> Self {
        Self { dpi }
    }
}

impl Default for FixedScalingDpiConverter {
    fn default() -> Self {
        Self::new(DEFAULT_DPI)
    }
}

impl DpiConverter for FixedScalingDpiConverter {
    fn dpi(&self) -> f64 {
        self.dpi
    }
}

pub(crate) fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}
