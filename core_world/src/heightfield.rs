use crate::noise::NoiseField;

/// Dense row-major elevation grid with every cell in [0, 1] once the
/// builder has finished with it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    pub width: u32,
    pub height: u32,
    values: Vec<f32>,
}

impl HeightField {
    pub fn new(width: u32, height: u32, values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), (width as usize) * (height as usize));
        Self {
            width,
            height,
            values,
        }
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y * self.width + x) as usize
    }

    #[inline]
    pub fn sample(&self, x: u32, y: u32) -> f32 {
        self.values[self.index(x, y)]
    }

    #[inline]
    pub fn get(&self, idx: usize) -> f32 {
        self.values[idx]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Elevation at the centre of the grid cell containing `(x, y)` in
    /// world units, clamped to the field bounds.
    pub fn sample_world(&self, x: f32, y: f32) -> f32 {
        let cx = (x.floor().max(0.0) as u32).min(self.width - 1);
        let cy = (y.floor().max(0.0) as u32).min(self.height - 1);
        self.sample(cx, cy)
    }

    pub fn land_cells(&self, coast_threshold: f32) -> usize {
        self.values
            .iter()
            .filter(|&&v| v >= coast_threshold)
            .count()
    }
}

/// Evaluates the warped noise stack across the grid and shapes it with a
/// radial island mask so elevation falls away towards the map edge.
pub fn build_height_field(width: u32, height: u32, noise: &NoiseField) -> HeightField {
    let mut values = Vec::with_capacity((width as usize) * (height as usize));
    for y in 0..height {
        for x in 0..width {
            let nx = x as f64 / width.max(1) as f64;
            let ny = y as f64 / height.max(1) as f64;

            let sample = noise.sample_warped(nx, ny);

            let dx = nx - 0.5;
            let dy = ny - 0.5;
            let radial = (dx * dx + dy * dy).sqrt();
            let mask = (1.0 - radial).max(0.0).powf(1.2);

            values.push((sample * mask).clamp(0.0, 1.0) as f32);
        }
    }
    HeightField::new(width, height, values)
}

/// Remaps the band above `threshold` onto [threshold, 1] through the
/// smoothstep curve, steepening relief while leaving plains untouched.
/// Skipped when the band is empty or degenerate.
pub fn contrast_stretch(field: &mut HeightField, threshold: f32) {
    let mut min_v = f32::MAX;
    let mut max_v = f32::MIN;
    for &v in field.values() {
        if v > threshold {
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }
    }
    let range = max_v - min_v;
    if !(range.is_finite() && range > f32::EPSILON) {
        return;
    }

    for v in field.values_mut() {
        if *v > threshold {
            let t = (*v - min_v) / range;
            let s = t * t * (3.0 - 2.0 * t);
            *v = threshold + s * (1.0 - threshold);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoiseConfig;

    fn field_from(values: Vec<f32>, width: u32) -> HeightField {
        let height = values.len() as u32 / width;
        HeightField::new(width, height, values)
    }

    #[test]
    fn builder_output_is_bounded_and_sized() {
        let noise = NoiseField::new(11, &NoiseConfig::default());
        let field = build_height_field(48, 32, &noise);
        assert_eq!(field.len(), 48 * 32);
        assert!(field.values().iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(field.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn radial_mask_suppresses_corners() {
        let noise = NoiseField::new(3, &NoiseConfig::default());
        let field = build_height_field(64, 64, &noise);
        // The corner sits at radial distance ~0.707 from the centre, so the
        // mask caps elevation there at (1 - 0.707)^1.2 ~ 0.23.
        assert!(field.sample(0, 0) < 0.23);
        assert!(field.sample(63, 63) < 0.23);
    }

    #[test]
    fn contrast_stretch_preserves_plains_and_bounds() {
        let mut field = field_from(vec![0.1, 0.3, 0.48, 0.5, 0.6, 0.9, 0.7, 0.55], 4);
        let before = field.values().to_vec();
        contrast_stretch(&mut field, 0.48);
        for (i, (&old, &new)) in before.iter().zip(field.values()).enumerate() {
            if old <= 0.48 {
                assert_eq!(old, new, "plains cell {i} changed");
            } else {
                assert!((0.48..=1.0).contains(&new), "stretched cell {i} out of band");
            }
        }
        // The extremes of the band map onto the band limits.
        let max = field.values().iter().cloned().fold(f32::MIN, f32::max);
        assert!((max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn contrast_stretch_skips_degenerate_band() {
        let mut field = field_from(vec![0.2, 0.6, 0.6, 0.6], 2);
        let before = field.values().to_vec();
        contrast_stretch(&mut field, 0.48);
        assert_eq!(before, field.values());
    }

    #[test]
    fn contrast_stretch_is_monotone() {
        let mut field = field_from(vec![0.5, 0.55, 0.6, 0.65, 0.7, 0.8, 0.9, 1.0], 4);
        contrast_stretch(&mut field, 0.48);
        let values = field.values();
        for pair in values.windows(2) {
            assert!(pair[0] <= pair[1] + 1e-6);
        }
    }

    #[test]
    fn sample_world_clamps_to_bounds() {
        let field = field_from(vec![0.1, 0.2, 0.3, 0.4], 2);
        assert_eq!(field.sample_world(-3.0, -3.0), field.sample(0, 0));
        assert_eq!(field.sample_world(9.0, 9.0), field.sample(1, 1));
        assert_eq!(field.sample_world(1.5, 0.5), field.sample(1, 0));
    }
}
