use crate::canvas::Canvas;

/// Frames slower than this are simulated as if they took this long.
pub const MAX_FRAME_DT: f32 = 0.05;

/// Something that simulates a population and draws it to a canvas.
pub trait Scene {
    fn resize(&mut self, width: usize, height: usize);
    fn advance(&mut self, dt: f32);
    fn render(&self, canvas: &mut Canvas);
}

/// Owns a scene and the surface it draws on.
///
/// The surface is acquired by [`View::mount`] and released by
/// [`View::unmount`]; while unmounted every tick is a no-op.
pub struct View<S> {
    scene: S,
    surface: Option<Canvas>,
}

impl<S: Scene> View<S> {
    pub fn new(scene: S) -> Self {
        View { scene, surface: None }
    }

    pub fn mount(&mut self, width: usize, height: usize) {
        match self.surface.as_mut() {
            Some(c) => c.resize(width, height),
            None => self.surface = Some(Canvas::new(width, height)),
        }
        self.scene.resize(width, height);
    }

    pub fn unmount(&mut self) {
        self.surface = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn surface(&self) -> Option<&Canvas> {
        self.surface.as_ref()
    }

    /// Simulates then draws one frame. Returns false when nothing was done.
    pub fn tick(&mut self, dt: f32) -> bool {
        let Some(canvas) = self.surface.as_mut() else {
            return false;
        };
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.scene.advance(dt);
        self.scene.render(canvas);
        true
    }

    /// Draws without advancing (used while paused).
    pub fn redraw(&mut self) -> bool {
        let Some(canvas) = self.surface.as_mut() else {
            return false;
        };
        self.scene.render(canvas);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        advanced: Vec<f32>,
        resized: Option<(usize, usize)>,
    }

    impl Scene for Probe {
        fn resize(&mut self, width: usize, height: usize) {
            self.resized = Some((width, height));
        }
        fn advance(&mut self, dt: f32) {
            self.advanced.push(dt);
        }
        fn render(&self, canvas: &mut Canvas) {
            canvas.blend(crate::color::Rgb::WHITE, 1.0);
        }
    }

    #[test]
    fn unmounted_view_is_a_no_op() {
        let mut v = View::new(Probe::default());
        assert!(!v.tick(0.016));
        assert!(!v.redraw());
        assert!(v.scene().advanced.is_empty());
        assert!(v.surface().is_none());
    }

    #[test]
    fn stalled_frames_are_clamped() {
        let mut v = View::new(Probe::default());
        v.mount(4, 4);
        assert_eq!(v.scene().resized, Some((4, 4)));
        assert!(v.tick(2.5));
        assert!(v.tick(-1.0));
        assert!(v.tick(0.01));
        assert_eq!(v.scene().advanced, vec![MAX_FRAME_DT, 0.0, 0.01]);
    }

    #[test]
    fn unmount_releases_surface() {
        let mut v = View::new(Probe::default());
        v.mount(3, 2);
        assert!(v.tick(0.01));
        assert!(v.surface().is_some());
        v.unmount();
        assert!(!v.is_mounted());
        assert!(!v.tick(0.01));
        assert_eq!(v.scene().advanced.len(), 1);
    }
}
