//! Twinkling background starfield with the occasional meteor.

use std::f32::consts::TAU;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::canvas::Canvas;
use crate::color::{clampf, hsv_to_rgb, lerp, Rgb};
use crate::particle::frames;
use crate::view::Scene;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Theme> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggle(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FieldConfig {
    /// Stars per square sub-pixel.
    pub density: f32,
    pub max_stars: usize,
    pub max_meteors: usize,
    /// Chance of a meteor spawning during one reference frame.
    pub meteor_chance: f32,
    pub min_opacity: f32,
    /// Glow radius as a multiple of the star radius.
    pub glow_scale: f32,
    pub brightness: f32,
}

impl FieldConfig {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => FieldConfig {
                density: 0.004,
                max_stars: 1500,
                max_meteors: 3,
                meteor_chance: 0.008,
                min_opacity: 0.1,
                glow_scale: 2.0,
                brightness: 1.0,
            },
            Theme::Light => FieldConfig {
                density: 0.0025,
                max_stars: 900,
                max_meteors: 2,
                meteor_chance: 0.004,
                min_opacity: 0.1,
                glow_scale: 2.0,
                brightness: 0.65,
            },
        }
    }

    /// Population for a `width x height` sub-pixel surface.
    pub fn star_count(&self, width: usize, height: usize) -> usize {
        let n = (width as f32 * height as f32 * self.density).round() as usize;
        n.min(self.max_stars)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Star {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    pub base_alpha: f32,
    pub twinkle_amp: f32,
    /// Radians per second.
    pub twinkle_speed: f32,
    pub phase: f32,
    pub color: Rgb,
    /// Parallax factor in (0, 1]; far stars drift slower.
    pub depth: f32,
}

impl Star {
    pub fn opacity(&self, t: f32, floor: f32) -> f32 {
        let a = self.base_alpha + self.twinkle_amp * (t * self.twinkle_speed + self.phase).sin();
        clampf(a, floor, 1.0)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Meteor {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Trail length in sub-pixels.
    pub trail: f32,
    pub alpha: f32,
    pub age: f32,
    pub max_age: f32,
    pub color: Rgb,
}

impl Meteor {
    /// Fades in over the first 15% of its life and out over the last 40%.
    fn envelope(&self) -> f32 {
        let t = clampf(self.age / self.max_age.max(1e-3), 0.0, 1.0);
        if t < 0.15 {
            t / 0.15
        } else if t > 0.6 {
            (1.0 - t) / 0.4
        } else {
            1.0
        }
    }

    fn expired(&self) -> bool {
        self.age >= self.max_age
    }

    fn off_surface(&self, w: f32, h: f32) -> bool {
        let m = self.trail;
        self.x < -m || self.y < -m || self.x > w + m || self.y > h + m
    }
}

fn wrap(v: f32, extent: f32) -> f32 {
    let r = v.rem_euclid(extent);
    // rem_euclid of a tiny negative rounds up to `extent`
    if r >= extent {
        0.0
    } else {
        r
    }
}

pub struct StarField {
    config: FieldConfig,
    theme: Theme,
    rng: StdRng,
    width: usize,
    height: usize,
    time: f32,
    stars: Vec<Star>,
    meteors: Vec<Meteor>,
}

impl StarField {
    pub fn new(theme: Theme, seed: u64) -> Self {
        StarField::with_config(theme, FieldConfig::for_theme(theme), seed)
    }

    pub fn with_config(theme: Theme, config: FieldConfig, seed: u64) -> Self {
        StarField {
            config,
            theme,
            rng: StdRng::seed_from_u64(seed),
            width: 0,
            height: 0,
            time: 0.0,
            stars: Vec::new(),
            meteors: Vec::new(),
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn meteors(&self) -> &[Meteor] {
        &self.meteors
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Switches theme; density differs per theme so the population is rebuilt.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.config = FieldConfig::for_theme(theme);
        self.reseed();
    }

    pub fn reseed(&mut self) {
        let count = self.config.star_count(self.width, self.height);
        self.stars.clear();
        self.meteors.clear();
        self.stars.reserve(count);
        if self.width == 0 || self.height == 0 {
            return;
        }
        let w = self.width as f32;
        let h = self.height as f32;
        for _ in 0..count {
            let depth = self.rng.gen_range(0.3..1.0_f32);
            // mostly white, a few faint blue or gold tints
            let hue = if self.rng.gen_bool(0.5) { 0.60 } else { 0.12 };
            let sat = self.rng.gen_range(0.0..0.25_f32);
            let star = Star {
                x: self.rng.gen_range(0.0..w),
                y: self.rng.gen_range(0.0..h),
                vx: self.rng.gen_range(-0.25..0.25),
                vy: self.rng.gen_range(-0.25..0.25),
                radius: lerp(0.5, 1.5, self.rng.gen::<f32>()) * depth.sqrt(),
                base_alpha: self.rng.gen_range(0.45..0.85),
                twinkle_amp: self.rng.gen_range(0.1..0.35),
                twinkle_speed: self.rng.gen_range(0.5..3.0),
                phase: self.rng.gen_range(0.0..TAU),
                color: hsv_to_rgb(hue, sat, 1.0),
                depth,
            };
            self.stars.push(star);
        }
        tracing::debug!(stars = self.stars.len(), width = self.width, height = self.height, "starfield reseeded");
    }

    fn spawn_meteor(&mut self) {
        let w = self.width as f32;
        let h = self.height as f32;
        // enter from the top edge or the right edge, heading down-left
        let (x, y) = if self.rng.gen_bool(0.6) {
            (self.rng.gen_range(w * 0.3..w.max(w * 0.3 + 1.0)), 0.0)
        } else {
            (w, self.rng.gen_range(0.0..(h * 0.5).max(1.0)))
        };
        let ang = self.rng.gen_range(0.6..1.1_f32) + std::f32::consts::FRAC_PI_2;
        let speed = self.rng.gen_range(3.0..6.0_f32);
        let tint = self.rng.gen_range(0.0..0.2_f32);
        self.meteors.push(Meteor {
            x,
            y,
            vx: ang.cos() * speed,
            vy: ang.sin() * speed,
            trail: self.rng.gen_range(12.0..30.0),
            alpha: 0.0,
            age: 0.0,
            max_age: self.rng.gen_range(0.8..1.6),
            color: hsv_to_rgb(0.58, tint, 1.0),
        });
    }
}

impl Scene for StarField {
    fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.reseed();
    }

    fn advance(&mut self, dt: f32) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let f = frames(dt);
        self.time += dt;

        let w = self.width as f32;
        let h = self.height as f32;
        for s in self.stars.iter_mut() {
            s.x = wrap(s.x + s.vx * s.depth * f, w);
            s.y = wrap(s.y + s.vy * s.depth * f, h);
        }

        for m in self.meteors.iter_mut() {
            m.x += m.vx * f;
            m.y += m.vy * f;
            m.age += dt;
            m.alpha = m.envelope();
        }
        self.meteors.retain(|m| !m.expired() && !m.off_surface(w, h));

        if self.meteors.len() < self.config.max_meteors {
            let p = 1.0 - (1.0 - clampf(self.config.meteor_chance, 0.0, 1.0)).powf(f);
            if self.rng.gen::<f32>() < p {
                self.spawn_meteor();
            }
        }
    }

    fn render(&self, canvas: &mut Canvas) {
        canvas.clear();
        let cfg = &self.config;
        for s in &self.stars {
            // dimmed themes still respect the floor
            let a = clampf(
                s.opacity(self.time, cfg.min_opacity) * cfg.brightness,
                cfg.min_opacity,
                1.0,
            );
            canvas.glow(s.x, s.y, s.radius * cfg.glow_scale, s.color, a);
        }

        for m in &self.meteors {
            let a = m.alpha * cfg.brightness;
            if a <= 0.0 {
                continue;
            }
            let speed = (m.vx * m.vx + m.vy * m.vy).sqrt().max(1e-3);
            let (nx, ny) = (m.vx / speed, m.vy / speed);
            let steps = m.trail.ceil() as usize;
            for i in 0..steps {
                let t = i as f32 / steps as f32;
                let fade = (1.0 - t) * (1.0 - t);
                let d = m.trail * t;
                canvas.glow(m.x - nx * d, m.y - ny * d, 1.5, m.color, a * fade * 0.6);
            }
            canvas.glow(m.x, m.y, 3.0, m.color, a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_scales_with_area() {
        let mut f = StarField::new(Theme::Dark, 7);
        f.resize(200, 100);
        let small = f.stars().len();
        assert_eq!(small, FieldConfig::for_theme(Theme::Dark).star_count(200, 100));
        assert_eq!(small, 80);

        f.resize(400, 200);
        assert_eq!(f.stars().len(), 320);
        assert!(f.meteors().is_empty());
    }

    #[test]
    fn population_respects_cap() {
        let mut f = StarField::new(Theme::Light, 1);
        f.resize(4000, 4000);
        assert_eq!(f.stars().len(), f.config().max_stars);
    }

    #[test]
    fn light_theme_is_sparser() {
        let mut dark = StarField::new(Theme::Dark, 3);
        let mut light = StarField::new(Theme::Light, 3);
        dark.resize(300, 200);
        light.resize(300, 200);
        assert!(light.stars().len() < dark.stars().len());
        dark.set_theme(Theme::Light);
        assert_eq!(dark.stars().len(), light.stars().len());
    }

    #[test]
    fn meteors_never_exceed_cap() {
        let mut cfg = FieldConfig::for_theme(Theme::Dark);
        cfg.meteor_chance = 1.0;
        let mut f = StarField::with_config(Theme::Dark, cfg, 11);
        f.resize(160, 96);
        for _ in 0..5000 {
            f.advance(1.0 / 60.0);
            assert!(f.meteors().len() <= cfg.max_meteors);
            assert!(f.stars().len() <= cfg.max_stars);
        }
    }

    #[test]
    fn stars_stay_on_surface_while_wrapping() {
        let mut f = StarField::new(Theme::Dark, 5);
        f.resize(64, 48);
        for _ in 0..2000 {
            f.advance(0.05);
        }
        for s in f.stars() {
            assert!(s.x >= 0.0 && s.x < 64.0, "x={}", s.x);
            assert!(s.y >= 0.0 && s.y < 48.0, "y={}", s.y);
        }
    }

    #[test]
    fn opacity_follows_sine_and_is_clamped() {
        let s = Star {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            radius: 1.0,
            base_alpha: 0.6,
            twinkle_amp: 0.3,
            twinkle_speed: 2.0,
            phase: 0.4,
            color: Rgb::WHITE,
            depth: 1.0,
        };
        for i in 0..500 {
            let t = i as f32 * 0.013;
            let expected = clampf(0.6 + 0.3 * (t * 2.0 + 0.4).sin(), 0.1, 1.0);
            assert!((s.opacity(t, 0.1) - expected).abs() < 1e-6);
        }

        let bright = Star { base_alpha: 0.95, twinkle_amp: 0.5, ..s };
        let dim = Star { base_alpha: 0.05, twinkle_amp: 0.5, ..s };
        for i in 0..500 {
            let t = i as f32 * 0.05;
            let a = bright.opacity(t, 0.1);
            let b = dim.opacity(t, 0.1);
            assert!((0.1..=1.0).contains(&a));
            assert!((0.1..=1.0).contains(&b));
        }
    }

    #[test]
    fn opacity_is_continuous_in_time() {
        let mut f = StarField::new(Theme::Dark, 9);
        f.resize(80, 80);
        let floor = f.config().min_opacity;
        let dt = 0.001;
        for s in f.stars() {
            let max_step = s.twinkle_amp * s.twinkle_speed * dt + 1e-5;
            let mut prev = s.opacity(0.0, floor);
            for i in 1..400 {
                let cur = s.opacity(i as f32 * dt, floor);
                assert!((cur - prev).abs() <= max_step);
                prev = cur;
            }
        }
    }

    fn lone_star(base_alpha: f32) -> Star {
        Star {
            x: 4.5,
            y: 4.5,
            vx: 0.0,
            vy: 0.0,
            radius: 1.0,
            base_alpha,
            twinkle_amp: 0.0,
            twinkle_speed: 1.0,
            phase: 0.0,
            color: Rgb::WHITE,
            depth: 1.0,
        }
    }

    #[test]
    fn dimmed_theme_never_draws_below_the_floor() {
        let mut f = StarField::new(Theme::Light, 4);
        f.resize(8, 8);
        let floor = f.config().min_opacity;
        assert!(f.config().brightness < 1.0);

        f.stars = vec![lone_star(0.0)];
        let mut c = Canvas::new(8, 8);
        f.render(&mut c);
        let peak = c.luma(4, 4);
        assert!(peak >= floor - 1e-4, "peak={peak} floor={floor}");

        f.stars = vec![lone_star(1.0)];
        f.render(&mut c);
        assert!((c.luma(4, 4) - f.config().brightness).abs() < 1e-4);
    }

    fn meteor(x: f32, age: f32) -> Meteor {
        Meteor {
            x,
            y: 10.0,
            vx: 0.0,
            vy: 0.0,
            trail: 12.0,
            alpha: 1.0,
            age,
            max_age: 1.0,
            color: Rgb::WHITE,
        }
    }

    #[test]
    fn expired_and_departed_meteors_are_dropped() {
        let mut cfg = FieldConfig::for_theme(Theme::Dark);
        cfg.meteor_chance = 0.0;
        let mut f = StarField::with_config(Theme::Dark, cfg, 12);
        f.resize(64, 48);
        f.meteors = vec![
            meteor(20.0, 1.0),
            meteor(64.0 + 12.0 + 1.0, 0.2),
            meteor(-13.5, 0.2),
            meteor(30.0, 0.2),
        ];
        f.advance(1.0 / 60.0);
        assert_eq!(f.meteors().len(), 1);
        assert_eq!(f.meteors()[0].x, 30.0);

        // the survivor goes once its age passes max_age
        for _ in 0..60 {
            f.advance(1.0 / 60.0);
        }
        assert!(f.meteors().is_empty());
    }

    #[test]
    fn render_lights_up_the_canvas() {
        let mut f = StarField::new(Theme::Dark, 2);
        f.resize(100, 60);
        let mut c = Canvas::new(100, 60);
        f.render(&mut c);
        let lit = (0..60).flat_map(|y| (0..100).map(move |x| (x, y))).filter(|&(x, y)| c.luma(x, y) > 0.0).count();
        assert!(lit > 0);
    }
}
