//! Engraving aspect ratio from mesh bounding boxes

use glam::Vec3;

use vitrine_config::EngravingSettings;

/// Aspect used when no engraving mesh is available
pub const DEFAULT_ASPECT: f32 = 1.0;

/// Ratio of the two largest bounding-box extents, clamped to the settings'
/// aspect range. Extents are floored at the settings' epsilon first.
pub fn aspect_from_extents(extents: Vec3, settings: &EngravingSettings) -> f32 {
    let floor = settings.extent_epsilon.max(f32::MIN_POSITIVE);
    let mut sorted = extents.abs().to_array().map(|e| if e.is_nan() { floor } else { e.max(floor) });
    sorted.sort_by(|a, b| b.total_cmp(a));

    let ratio = sorted[0] / sorted[1];
    if !ratio.is_finite() {
        return settings.max_aspect;
    }
    ratio.clamp(settings.min_aspect, settings.max_aspect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_plate_hits_upper_bound() {
        let settings = EngravingSettings::default();
        assert_eq!(aspect_from_extents(Vec3::new(10.0, 1.0, 1.0), &settings), 10.0);
        assert_eq!(aspect_from_extents(Vec3::ONE, &settings), 1.0);
    }

    #[test]
    fn test_two_largest_extents() {
        let settings = EngravingSettings::default();
        assert_eq!(aspect_from_extents(Vec3::new(2.0, 1.0, 0.05), &settings), 2.0);
        assert_eq!(aspect_from_extents(Vec3::new(0.05, 1.0, 4.0), &settings), 4.0);
    }

    #[test]
    fn test_clamped_to_range() {
        let settings = EngravingSettings::default();
        assert_eq!(aspect_from_extents(Vec3::new(50.0, 1.0, 0.0), &settings), 10.0);
        assert_eq!(aspect_from_extents(Vec3::new(1.0, 0.0, 0.0), &settings), 10.0);
    }

    #[test]
    fn test_degenerate_box() {
        let settings = EngravingSettings::default();
        // All extents floored to epsilon
        assert_eq!(aspect_from_extents(Vec3::ZERO, &settings), 1.0);
        assert_eq!(aspect_from_extents(Vec3::splat(f32::NAN), &settings), 1.0);
    }
}
