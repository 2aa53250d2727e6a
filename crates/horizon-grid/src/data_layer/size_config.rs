use std::collections::BTreeMap;
use std::sync::Arc;

use horizon_grid_core::PerfSpan;
use horizon_grid_core::logging::{span_names, targets};

use super::dpi::{DpiConverter, round_half_up};
use crate::coordinate::Range;
use crate::persistence::Properties;

/// Sizes of the positions along one axis of a data layer.
///
/// Explicit sizes are stored at 100% scale and scaled by the DPI converter
/// on read. In percentage mode sizes are shares of the available space and
/// the pixel sizes are recomputed whenever that space changes.
#[derive(Debug, Clone)]
pub struct SizeConfig {
    default_size: i32,
    sizes: BTreeMap<usize, i32>,
    resizable_by_default: bool,
    resizable: BTreeMap<usize, bool>,
    percentage_sizing: bool,
    percentages: BTreeMap<usize, f64>,
    available_space: i32,
    /// Pixel sizes set in percentage mode before any space was known.
    pending: BTreeMap<usize, i32>,
    /// Pixel sizes computed for percentage mode.
    real_sizes: Vec<i32>,
    converter: Option<Arc<dyn DpiConverter>>,
}

impl SizeConfig {
    pub fn new(default_size: i32) -> Self {
        Self {
            default_size,
            sizes: BTreeMap::new(),
            resizable_by_default: true,
            resizable: BTreeMap::new(),
            percentage_sizing: false,
            percentages: BTreeMap::new(),
            available_space: 0,
            pending: BTreeMap::new(),
            real_sizes: Vec::new(),
            converter: None,
        }
    }

    // =========================================================================
    // Sizes
    // =========================================================================

    /// Display size of `position`.
    pub fn size(&self, position: usize) -> i32 {
        if self.percentage_sizing {
            return self.real_sizes.get(position).copied().unwrap_or(0);
        }
        self.upscale(self.sizes.get(&position).copied().unwrap_or(self.default_size))
    }

    /// The size stored for `position`, before scaling.
    pub fn stored_size(&self, position: usize) -> i32 {
        self.sizes.get(&position).copied().unwrap_or(self.default_size)
    }

    /// Set the size of `position`.
    ///
    /// Without `downscale` the value is stored as given, so it reads back
    /// scaled up. With `downscale` it is first converted back to 100% scale.
    /// In percentage mode the size becomes the matching share of the
    /// available space; until that space is known it is kept as a pixel size
    /// and converted by the next [`calculate_percentages`](Self::calculate_percentages).
    pub fn set_size(&mut self, position: usize, size: i32, downscale: bool) {
        if self.percentage_sizing {
            if self.available_space > 0 {
                self.percentages.insert(position, self.share_of_space(size));
            } else {
                self.pending.insert(position, size.max(0));
            }
            return;
        }
        let stored = if downscale { self.downscale(size) } else { size };
        self.sizes.insert(position, stored.max(0));
    }

    pub fn default_size(&self) -> i32 {
        self.default_size
    }

    pub fn set_default_size(&mut self, size: i32) {
        self.default_size = size.max(0);
    }

    /// Forget all explicit sizes.
    pub fn reset_sizes(&mut self) {
        self.sizes.clear();
        self.percentages.clear();
        self.pending.clear();
    }

    // =========================================================================
    // Resizability
    // =========================================================================

    pub fn is_position_resizable(&self, position: usize) -> bool {
        self.resizable
            .get(&position)
            .copied()
            .unwrap_or(self.resizable_by_default)
    }

    pub fn set_position_resizable(&mut self, position: usize, resizable: bool) {
        self.resizable.insert(position, resizable);
    }

    pub fn set_resizable_by_default(&mut self, resizable: bool) {
        self.resizable_by_default = resizable;
        self.resizable.clear();
    }

    // =========================================================================
    // Scaling
    // =========================================================================

    pub fn set_dpi_converter(&mut self, converter: Option<Arc<dyn DpiConverter>>) {
        self.converter = converter;
    }

    pub fn dpi_converter(&self) -> Option<&Arc<dyn DpiConverter>> {
        self.converter.as_ref()
    }

    fn upscale(&self, size: i32) -> i32 {
        match &self.converter {
            Some(converter) => converter.to_display(size),
            None => size,
        }
    }

    fn downscale(&self, size: i32) -> i32 {
        match &self.converter {
            Some(converter) => converter.to_pixel(size),
            None => size,
        }
    }

    // =========================================================================
    // Percentage sizing
    // =========================================================================

    pub fn is_percentage_sizing(&self) -> bool {
        self.percentage_sizing
    }

    pub fn set_percentage_sizing(&mut self, enabled: bool) {
        self.percentage_sizing = enabled;
    }

    /// Give `position` a fixed share of the available space.
    pub fn set_percentage(&mut self, position: usize, percentage: f64) {
        self.percentages.insert(position, percentage.max(0.0));
    }

    pub fn percentage(&self, position: usize) -> Option<f64> {
        self.percentages.get(&position).copied()
    }

    pub fn available_space(&self) -> i32 {
        self.available_space
    }

    fn share_of_space(&self, size: i32) -> f64 {
        f64::from(size.max(0)) * 100.0 / f64::from(self.available_space)
    }

    /// Recompute percentage sizes of `count` positions for `space` pixels.
    ///
    /// Positions without an explicit percentage share what is left of 100%
    /// equally. When the percentages add up to 100% the last position
    /// absorbs the rounding difference, so the sizes sum to `space`.
    pub fn calculate_percentages(&mut self, space: i32, count: usize) {
        let _span = PerfSpan::new(span_names::PERCENTAGE_SIZING);
        self.available_space = space.max(0);
        if !self.percentage_sizing {
            self.real_sizes.clear();
            return;
        }
        if self.available_space > 0 && !self.pending.is_empty() {
            for (position, size) in std::mem::take(&mut self.pending) {
                let percentage = self.share_of_space(size);
                self.percentages.insert(position, percentage);
            }
        }

        let explicit: f64 = (0..count).filter_map(|p| self.percentages.get(&p)).sum();
        let unspecified = (0..count).filter(|p| !self.percentages.contains_key(p)).count();
        let share = if unspecified > 0 {
            (100.0 - explicit).max(0.0) / unspecified as f64
        } else {
            0.0
        };

        let space = f64::from(self.available_space);
        let mut sizes: Vec<i32> = (0..count)
            .map(|p| {
                let percentage = self.percentages.get(&p).copied().unwrap_or(share);
                round_half_up(space * percentage / 100.0)
            })
            .collect();

        let total = explicit + share * unspecified as f64;
        if count > 0 && (total - 100.0).abs() < 0.01 {
            let others: i32 = sizes[..count - 1].iter().sum();
            sizes[count - 1] = (self.available_space - others).max(0);
        }

        tracing::trace!(
            target: targets::PERF,
            space = self.available_space,
            count,
            "percentage sizes recalculated"
        );
        self.real_sizes = sizes;
    }

    // =========================================================================
    // Structural shifts
    // =========================================================================

    /// Shift explicit settings after positions were inserted at `range`.
    pub fn insert_positions(&mut self, range: Range) {
        let shift = |key: usize| if key >= range.start { key + range.len() } else { key };
        shift_keys(&mut self.sizes, shift);
        shift_keys(&mut self.resizable, shift);
        shift_keys(&mut self.percentages, shift);
        shift_keys(&mut self.pending, shift);
    }

    /// Drop and shift explicit settings after positions at `range` were deleted.
    pub fn delete_positions(&mut self, range: Range) {
        let shift = |key: usize| {
            if range.contains(key) {
                None
            } else if key >= range.end {
                Some(key - range.len())
            } else {
                Some(key)
            }
        };
        filter_shift_keys(&mut self.sizes, shift);
        filter_shift_keys(&mut self.resizable, shift);
        filter_shift_keys(&mut self.percentages, shift);
        filter_shift_keys(&mut self.pending, shift);
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    pub fn save_state(&self, key: &str, properties: &mut Properties) {
        properties.set(format!("{key}.default"), self.default_size);
        properties.set(format!("{key}.resizableByDefault"), self.resizable_by_default);
        properties.set(format!("{key}.percentageSizing"), self.percentage_sizing);
        properties.set_map(format!("{key}.sizes"), &self.sizes);
        properties.set_map(format!("{key}.resizable"), &self.resizable);
        properties.set_map(format!("{key}.percentages"), &self.percentages);
    }

    pub fn load_state(&mut self, key: &str, properties: &Properties) {
        if let Some(size) = properties.parsed(&format!("{key}.default")) {
            self.default_size = size;
        }
        if let Some(resizable) = properties.parsed(&format!("{key}.resizableByDefault")) {
            self.resizable_by_default = resizable;
        }
        if let Some(enabled) = properties.parsed(&format!("{key}.percentageSizing")) {
            self.percentage_sizing = enabled;
        }
        if let Some(sizes) = properties.map(&format!("{key}.sizes")) {
            self.sizes = sizes;
        }
        if let Some(resizable) = properties.map(&format!("{key}.resizable")) {
            self.resizable = resizable;
        }
        if let Some(percentages) = properties.map(&format!("{key}.percentages")) {
            self.percentages = percentages;
        }
    }
}

fn shift_keys<V>(map: &mut BTreeMap<usize, V>, shift: impl Fn(usize) -> usize) {
    *map = std::mem::take(map)
        .into_iter()
        .map(|(key, value)| (shift(key), value))
        .collect();
}

fn filter_shift_keys<V>(map: &mut BTreeMap<usize, V>, shift: impl Fn(usize) -> Option<usize>) {
    *map = std::mem::take(map)
        .into_iter()
        .filter_map(|(key, value)| Some((shift(key)?, value)))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_layer::FixedScalingDpiConverter;

    fn scaled(dpi: f64) -> SizeConfig {
        let mut config = SizeConfig::new(100);
        config.set_dpi_converter(Some(Arc::new(FixedScalingDpiConverter::new(dpi))));
        config
    }

    #[test]
    fn test_default_and_explicit_sizes() {
        let mut config = SizeConfig::new(100);
        config.set_size(3, 150, false);
        assert_eq!(config.size(3), 150);
        assert_eq!(config.size(2), 100);
        assert_eq!(config.size(4), 100);
    }

    #[test]
    fn test_dpi_set_without_downscale_scales_on_read() {
        let mut config = scaled(120.0);
        assert_eq!(config.size(0), 125);
        config.set_size(1, 150, false);
        assert_eq!(config.stored_size(1), 150);
        assert_eq!(config.size(1), 188);
    }

    #[test]
    fn test_dpi_set_with_downscale_round_trips() {
        let mut config = scaled(120.0);
        config.set_size(1, 150, true);
        assert_eq!(config.stored_size(1), 120);
        assert_eq!(config.size(1), 150);
    }

    #[test]
    fn test_percentage_sizing_shares_space() {
        let mut config = SizeConfig::new(100);
        config.set_percentage_sizing(true);
        config.calculate_percentages(500, 4);
        assert_eq!((0..4).map(|p| config.size(p)).collect::<Vec<_>>(), vec![125; 4]);
        config.calculate_percentages(1000, 4);
        assert_eq!((0..4).map(|p| config.size(p)).collect::<Vec<_>>(), vec![250; 4]);
    }

    #[test]
    fn test_percentage_sizing_last_absorbs_rounding() {
        let mut config = SizeConfig::new(100);
        config.set_percentage_sizing(true);
        config.calculate_percentages(100, 3);
        let sizes: Vec<i32> = (0..3).map(|p| config.size(p)).collect();
        assert_eq!(sizes, vec![33, 33, 34]);
        assert_eq!(sizes.iter().sum::<i32>(), 100);
    }

    #[test]
    fn test_percentage_with_explicit_share() {
        let mut config = SizeConfig::new(100);
        config.set_percentage_sizing(true);
        config.set_percentage(0, 50.0);
        config.calculate_percentages(400, 3);
        assert_eq!(config.size(0), 200);
        assert_eq!(config.size(1), 100);
        assert_eq!(config.size(2), 100);
    }

    #[test]
    fn test_percentage_resize_before_space_is_known() {
        let mut config = SizeConfig::new(100);
        config.set_percentage_sizing(true);
        config.set_size(0, 200, false);
        assert_eq!(config.percentage(0), None);

        config.calculate_percentages(400, 3);
        assert_eq!(config.percentage(0), Some(50.0));
        assert_eq!(config.size(0), 200);
        assert_eq!(config.size(1), 100);
        assert_eq!(config.size(2), 100);
    }

    #[test]
    fn test_insert_and_delete_shift_settings() {
        let mut config = SizeConfig::new(100);
        config.set_size(2, 50, false);
        config.set_size(5, 70, false);
        config.insert_positions(Range::new(3, 5));
        assert_eq!(config.size(2), 50);
        assert_eq!(config.size(7), 70);

        config.delete_positions(Range::new(1, 3));
        assert_eq!(config.size(1), 100);
        assert_eq!(config.size(5), 70);
    }

    #[test]
    fn test_resizable_flags() {
        let mut config = SizeConfig::new(100);
        assert!(config.is_position_resizable(0));
        config.set_position_resizable(0, false);
        assert!(!config.is_position_resizable(0));
        config.set_resizable_by_default(false);
        assert!(!config.is_position_resizable(4));
    }
}
