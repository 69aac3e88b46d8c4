/// Current drawable size of the presentation surface, in device pixels.
///
/// Written whenever the windowing layer observes a resize; read once per tick
/// by the frame loop. A size that changed since the last
/// [`take_pending_resize`](Self::take_pending_resize) is kept as pending so the
/// surface can be reconfigured before the next frame is drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceTracker {
    width: u32,
    height: u32,
    pending: bool,
}

impl SurfaceTracker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pending: true,
        }
    }

    /// Records a new logical size, scaled to device pixels by `scale_factor`.
    ///
    /// Negative or non-finite products collapse to zero.
    pub fn on_resize(&mut self, logical_width: f64, logical_height: f64, scale_factor: f64) {
        let to_px = |v: f64| {
            let px = (v * scale_factor).round();
            if px.is_finite() && px > 0.0 {
                px.min(f64::from(u32::MAX)) as u32
            } else {
                0
            }
        };
        self.on_physical_resize(to_px(logical_width), to_px(logical_height));
    }

    /// Records a size already expressed in device pixels.
    pub fn on_physical_resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        log::debug!("drawable resized to {width}x{height}");
        self.width = width;
        self.height = height;
        self.pending = true;
    }

    /// `width / max(height, 1)`.
    ///
    /// Height is clamped so the aspect is defined before the first resize
    /// notification has arrived.
    #[inline]
    pub fn current_aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn is_zero_area(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the size to configure the surface with, if it changed since the
    /// last call and is drawable.
    pub fn take_pending_resize(&mut self) -> Option<(u32, u32)> {
        if !self.pending || self.is_zero_area() {
            return None;
        }
        self.pending = false;
        Some((self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── aspect ────────────────────────────────────────────────────────────

    #[test]
    fn aspect_before_any_resize_divides_by_one() {
        let tracker = SurfaceTracker::new(640, 0);
        assert_eq!(tracker.current_aspect(), 640.0);

        let tracker = SurfaceTracker::default();
        assert_eq!(tracker.current_aspect(), 0.0);
        assert!(tracker.current_aspect().is_finite());
    }

    #[test]
    fn aspect_is_width_over_height() {
        let mut tracker = SurfaceTracker::default();
        tracker.on_physical_resize(200, 100);
        assert_eq!(tracker.current_aspect(), 2.0);
        tracker.on_physical_resize(100, 200);
        assert_eq!(tracker.current_aspect(), 0.5);
    }

    #[test]
    fn aspect_with_zero_height_after_resize() {
        let mut tracker = SurfaceTracker::new(300, 300);
        tracker.on_physical_resize(300, 0);
        assert_eq!(tracker.current_aspect(), 300.0);
    }

    // ── on_resize ─────────────────────────────────────────────────────────

    #[test]
    fn logical_size_is_scaled_by_pixel_density() {
        let mut tracker = SurfaceTracker::default();
        tracker.on_resize(640.0, 360.0, 2.0);
        assert_eq!(tracker.size(), (1280, 720));

        tracker.on_resize(667.0, 375.0, 1.5);
        assert_eq!(tracker.size(), (1001, 563));
    }

    #[test]
    fn degenerate_sizes_collapse_to_zero() {
        let mut tracker = SurfaceTracker::new(10, 10);
        tracker.on_resize(-5.0, f64::NAN, 1.0);
        assert_eq!(tracker.size(), (0, 0));
        assert!(tracker.is_zero_area());
    }

    // ── pending resize ────────────────────────────────────────────────────

    #[test]
    fn pending_resize_is_reported_once() {
        let mut tracker = SurfaceTracker::new(800, 600);
        assert_eq!(tracker.take_pending_resize(), Some((800, 600)));
        assert_eq!(tracker.take_pending_resize(), None);

        tracker.on_physical_resize(800, 600);
        assert_eq!(tracker.take_pending_resize(), None);

        tracker.on_physical_resize(1024, 768);
        assert_eq!(tracker.take_pending_resize(), Some((1024, 768)));
    }

    #[test]
    fn zero_area_resize_stays_pending_until_drawable() {
        let mut tracker = SurfaceTracker::new(800, 600);
        tracker.take_pending_resize();

        tracker.on_physical_resize(800, 0);
        assert_eq!(tracker.take_pending_resize(), None);

        tracker.on_physical_resize(800, 450);
        assert_eq!(tracker.take_pending_resize(), Some((800, 450)));
    }
}
