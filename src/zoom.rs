//! Animated zoom transitions.
//!
//! A zoom request becomes a [`ZoomAnimation`] that the host advances once per
//! rendered frame. Only one animation exists at a time: a new request
//! replaces the one in flight and starts from whatever scale is on screen.

use crate::config::AnnotatorConfig;

/// Linear interpolation from a start scale to a target over a fixed number
/// of frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomAnimation {
    current: f32,
    target: f32,
    step: f32,
    frame: u32,
    total: u32,
}

impl ZoomAnimation {
    pub fn new(start: f32, target: f32, total: u32) -> Self {
        let total = total.max(1);
        Self {
            current: start,
            target,
            step: (target - start) / total as f32,
            frame: 0,
            total,
        }
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Advance one frame and return the scale to display. The last frame
    /// lands exactly on the target.
    pub fn advance(&mut self) -> f32 {
        self.frame += 1;
        self.current = if self.frame >= self.total {
            self.target
        } else {
            self.current + self.step
        };
        self.current
    }

    pub fn is_finished(&self) -> bool {
        self.frame >= self.total
    }
}

#[derive(Clone, Debug)]
pub struct ZoomController {
    min_scale: f32,
    max_scale: f32,
    factor: f32,
    steps: u32,
    animation: Option<ZoomAnimation>,
}

impl ZoomController {
    pub fn new(config: &AnnotatorConfig) -> Self {
        Self {
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            factor: config.zoom_factor,
            steps: config.zoom_steps,
            animation: None,
        }
    }

    /// Start zooming in from `current`. Returns the target scale.
    pub fn zoom_in(&mut self, current: f32) -> f32 {
        self.animate(current, (current * self.factor).min(self.max_scale))
    }

    /// Start zooming out from `current`. Returns the target scale.
    pub fn zoom_out(&mut self, current: f32) -> f32 {
        self.animate(current, (current / self.factor).max(self.min_scale))
    }

    fn animate(&mut self, current: f32, target: f32) -> f32 {
        if let Some(previous) = self.animation.take() {
            tracing::trace!(
                abandoned_target = previous.target(),
                "replacing in-flight zoom"
            );
        }
        self.animation = Some(ZoomAnimation::new(current, target, self.steps));
        target
    }

    /// Next scale value, or `None` when no animation is running. Call once
    /// per frame.
    pub fn tick(&mut self) -> Option<f32> {
        let animation = self.animation.as_mut()?;
        let scale = animation.advance();
        if animation.is_finished() {
            self.animation = None;
        }
        Some(scale)
    }

    pub fn cancel(&mut self) {
        self.animation = None;
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn target(&self) -> Option<f32> {
        self.animation.map(|a| a.target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> ZoomController {
        ZoomController::new(&AnnotatorConfig::default())
    }

    fn run(zoom: &mut ZoomController, mut scale: f32) -> (f32, u32) {
        let mut frames = 0;
        while let Some(s) = zoom.tick() {
            scale = s;
            frames += 1;
        }
        (scale, frames)
    }

    #[test]
    fn test_zoom_in_lands_exactly_on_target() {
        let mut zoom = controller();
        let target = zoom.zoom_in(1.0);
        assert_eq!(target, 1.2);
        let (scale, frames) = run(&mut zoom, 1.0);
        assert_eq!(frames, 20);
        assert_eq!(scale, 1.2);
        assert!(!zoom.is_animating());
    }

    #[test]
    fn test_steps_are_linear() {
        let mut animation = ZoomAnimation::new(1.0, 3.0, 20);
        let first = animation.advance();
        let second = animation.advance();
        assert!((first - 1.1).abs() < 1e-5);
        assert!((second - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_zoom_in_never_exceeds_max() {
        let mut zoom = controller();
        let mut scale = 1.0;
        for _ in 0..30 {
            zoom.zoom_in(scale);
            scale = run(&mut zoom, scale).0;
            assert!(scale <= 5.0);
        }
        assert_eq!(scale, 5.0);
    }

    #[test]
    fn test_zoom_out_never_below_min() {
        let mut zoom = controller();
        let mut scale = 1.0;
        for _ in 0..30 {
            zoom.zoom_out(scale);
            scale = run(&mut zoom, scale).0;
            assert!(scale >= 0.2);
        }
        assert_eq!(scale, 0.2);
    }

    #[test]
    fn test_new_request_replaces_running_animation() {
        let mut zoom = controller();
        zoom.zoom_in(1.0);
        let mut scale = 1.0;
        for _ in 0..5 {
            scale = zoom.tick().unwrap();
        }
        let target = zoom.zoom_out(scale);
        assert_eq!(zoom.target(), Some(target));
        let (end, frames) = run(&mut zoom, scale);
        assert_eq!(frames, 20);
        assert_eq!(end, target);
    }

    #[test]
    fn test_cancel_stops_ticks() {
        let mut zoom = controller();
        zoom.zoom_in(1.0);
        zoom.cancel();
        assert_eq!(zoom.tick(), None);
    }
}
