//! Cover-fit aspect correction and viewport sizing.
//!
//! The camera never changes: a unit plane always fills the view. Keeping the
//! image undistorted is left to the fragment shader, which rescales its UVs
//! around the centre by the two correction factors computed here.

/// Resolution vector pushed into the material's `resolution` uniform.
///
/// `x`/`y` are the viewport size in CSS pixels, `z`/`w` the horizontal and
/// vertical UV correction factors. Both factors lie in `(0, 1]` and at least
/// one of them is exactly `1`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Resolution {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Resolution {
    /// Computes the "cover" correction for an image of `image_ratio` (width / height)
    /// shown in a `width` x `height` viewport.
    pub fn cover(width: f32, height: f32, image_ratio: f32) -> Self {
        if width <= 0.0 || height <= 0.0 || image_ratio <= 0.0 {
            return Self {
                x: width,
                y: height,
                z: 1.0,
                w: 1.0,
            };
        }
        let screen_ratio = width / height;
        let (z, w) = if image_ratio < screen_ratio {
            (1.0, image_ratio / screen_ratio)
        } else {
            (screen_ratio / image_ratio, 1.0)
        };
        Self {
            x: width,
            y: height,
            z,
            w,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

/// Size of the area we render into.
///
/// `width`/`height` are CSS (logical) pixels. `pixel_ratio` is the device
/// pixel ratio already clamped to the configured maximum, so the drawing
/// buffer is `css size * pixel_ratio`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        let device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            pixel_ratio: device_pixel_ratio.min(max_pixel_ratio),
        }
    }

    /// Builds a viewport from a physical window size and its scale factor.
    pub fn from_physical(
        physical_width: u32,
        physical_height: u32,
        scale_factor: f64,
        max_pixel_ratio: f64,
    ) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        Self::new(
            f64::from(physical_width) / scale,
            f64::from(physical_height) / scale,
            scale,
            max_pixel_ratio,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width < 1.0 || self.height < 1.0
    }

    /// Drawing buffer size in device pixels, never smaller than 1x1.
    pub fn buffer_size(&self) -> (u32, u32) {
        let w = (self.width * self.pixel_ratio).round().max(1.0) as u32;
        let h = (self.height * self.pixel_ratio).round().max(1.0) as u32;
        (w, h)
    }

    pub fn resolution(&self, image_ratio: f32) -> Resolution {
        Resolution::cover(self.width as f32, self.height as f32, image_ratio)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn landscape_viewport_shrinks_vertical_factor() {
        let r = Resolution::cover(1600.0, 900.0, 1.5);
        assert_eq!((r.x, r.y), (1600.0, 900.0));
        assert_eq!(r.z, 1.0);
        assert!(approx(r.w, 0.844), "w = {}", r.w);
    }

    #[test]
    fn portrait_viewport_shrinks_horizontal_factor() {
        let r = Resolution::cover(900.0, 1600.0, 1.5);
        assert_eq!((r.x, r.y), (900.0, 1600.0));
        assert!(approx(r.z, 0.375), "z = {}", r.z);
        assert_eq!(r.w, 1.0);
    }

    #[test]
    fn matching_ratio_needs_no_correction() {
        let r = Resolution::cover(1500.0, 1000.0, 1.5);
        assert_eq!((r.z, r.w), (1.0, 1.0));
    }

    #[test]
    fn repeated_computation_is_stable() {
        let viewport = Viewport::new(1280.0, 720.0, 1.0, 2.0);
        assert_eq!(viewport.resolution(1.5), viewport.resolution(1.5));
    }

    #[test]
    fn pixel_ratio_is_clamped() {
        let viewport = Viewport::new(800.0, 600.0, 3.0, 2.0);
        assert_eq!(viewport.pixel_ratio, 2.0);
        assert_eq!(viewport.buffer_size(), (1600, 1200));
    }

    #[test]
    fn physical_size_is_converted_back_to_css_pixels() {
        let viewport = Viewport::from_physical(3200, 1800, 2.0, 2.0);
        assert_eq!((viewport.width, viewport.height), (1600.0, 900.0));
        assert_eq!(viewport.buffer_size(), (3200, 1800));

        let capped = Viewport::from_physical(3000, 1500, 3.0, 2.0);
        assert_eq!((capped.width, capped.height), (1000.0, 500.0));
        assert_eq!(capped.buffer_size(), (2000, 1000));
    }

    #[test]
    fn empty_viewport_still_has_a_drawable_buffer() {
        let viewport = Viewport::new(0.0, 0.0, 1.0, 2.0);
        assert!(viewport.is_empty());
        assert_eq!(viewport.buffer_size(), (1, 1));
    }

    proptest! {
        #[test]
        fn correction_factors_are_in_unit_range(
            width in 1u32..8000,
            height in 1u32..8000,
            ratio in 0.05f32..20.0,
        ) {
            let r = Resolution::cover(width as f32, height as f32, ratio);
            prop_assert!(r.z > 0.0 && r.z <= 1.0, "z = {}", r.z);
            prop_assert!(r.w > 0.0 && r.w <= 1.0, "w = {}", r.w);
            prop_assert!(r.z == 1.0 || r.w == 1.0);
        }

        #[test]
        fn resize_twice_yields_same_vector(
            width in 1u32..8000,
            height in 1u32..8000,
            ratio in 0.05f32..20.0,
        ) {
            let viewport = Viewport::new(f64::from(width), f64::from(height), 1.0, 2.0);
            prop_assert_eq!(viewport.resolution(ratio), viewport.resolution(ratio));
        }
    }
}
