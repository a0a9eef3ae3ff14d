#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Parses `#RRGGBB` (the leading `#` is optional). Used for palette constants.
    pub const fn hex(s: &str) -> Rgb {
        let b = s.as_bytes();
        let o = if !b.is_empty() && b[0] == b'#' { 1 } else { 0 };
        Rgb {
            r: (nibble(b[o]) << 4) | nibble(b[o + 1]),
            g: (nibble(b[o + 2]) << 4) | nibble(b[o + 3]),
            b: (nibble(b[o + 4]) << 4) | nibble(b[o + 5]),
        }
    }

    pub fn to_linear(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    pub fn from_linear(c: [f32; 3]) -> Rgb {
        Rgb {
            r: (clampf(c[0], 0.0, 1.0) * 255.0) as u8,
            g: (clampf(c[1], 0.0, 1.0) * 255.0) as u8,
            b: (clampf(c[2], 0.0, 1.0) * 255.0) as u8,
        }
    }
}

const fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}

pub fn clampf(v: f32, a: f32, b: f32) -> f32 {
    v.max(a).min(b)
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    // h: 0..1
    let h = (h.fract() + 1.0).fract() * 6.0;
    let i = h.floor() as i32;
    let f = h - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match i.rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgb::from_linear([r, g, b])
}
