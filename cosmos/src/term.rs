//! Braille presentation of a [`Canvas`] on a crossterm terminal.

use std::io::{self, Write};

use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};

use crate::canvas::{Canvas, SUBPIXELS_X, SUBPIXELS_Y};
use crate::color::{clampf, Rgb};

/// Puts the terminal in alternate-screen raw mode; restores it on drop.
pub struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            DisableLineWrap,
            cursor::Hide,
            Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;
        Ok(TerminalGuard { active: true })
    }

    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let mut out = io::stdout();
        execute!(out, EndSynchronizedUpdate).ok();
        execute!(
            out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

pub fn braille_char(mask: u8) -> char {
    char::from_u32(0x2800 + mask as u32).unwrap_or(' ')
}

pub fn dot_bit(dx: usize, dy: usize) -> u8 {
    match (dx, dy) {
        (0, 0) => 0x01, // dot1
        (0, 1) => 0x02, // dot2
        (0, 2) => 0x04, // dot3
        (0, 3) => 0x40, // dot7
        (1, 0) => 0x08, // dot4
        (1, 1) => 0x10, // dot5
        (1, 2) => 0x20, // dot6
        (1, 3) => 0x80, // dot8
        _ => 0,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Cell {
    pub mask: u8,
    pub color: Rgb,
}

impl Cell {
    pub fn glyph(&self) -> char {
        if self.mask == 0 {
            ' '
        } else {
            braille_char(self.mask)
        }
    }
}

/// Folds one 2x4 block of sub-pixels into a braille cell.
pub fn cell_at(canvas: &Canvas, cx: usize, cy: usize, threshold: f32) -> Cell {
    let mut mask = 0u8;
    let mut acc = [0.0f32; 3];
    let mut lit = 0usize;
    let mut peak = 0.0f32;
    for dy in 0..SUBPIXELS_Y {
        for dx in 0..SUBPIXELS_X {
            let sx = cx * SUBPIXELS_X + dx;
            let sy = cy * SUBPIXELS_Y + dy;
            let l = canvas.luma(sx, sy);
            if l > threshold {
                mask |= dot_bit(dx, dy);
                let p = canvas.pixel(sx, sy);
                for k in 0..3 {
                    acc[k] += p[k];
                }
                lit += 1;
                peak = peak.max(l);
            }
        }
    }
    if lit == 0 {
        return Cell::default();
    }
    let n = lit as f32;
    let mut c = [acc[0] / n, acc[1] / n, acc[2] / n];
    // normalise overexposed cells so hue survives additive blowout
    let m = c[0].max(c[1]).max(c[2]);
    if m > 1.0 {
        for v in c.iter_mut() {
            *v /= m;
        }
    }
    // dim cells would be near-black; lift them towards their own hue
    let lift = clampf(0.35 + peak, 0.0, 1.0) / m.max(1e-3).min(1.0);
    Cell {
        mask,
        color: Rgb::from_linear([c[0] * lift, c[1] * lift, c[2] * lift]),
    }
}

/// Diff-based braille renderer; only changed cells are rewritten.
pub struct Presenter {
    cols: u16,
    rows: u16,
    hud_rows: u16,
    threshold: f32,
    prev: Vec<Option<Cell>>,
}

impl Presenter {
    pub fn new(cols: u16, rows: u16, hud_rows: u16) -> Self {
        Presenter {
            cols,
            rows,
            hud_rows,
            threshold: 0.08,
            prev: vec![None; cols as usize * rows as usize],
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) -> io::Result<()> {
        self.cols = cols;
        self.rows = rows;
        self.prev.clear();
        self.prev.resize(cols as usize * rows as usize, None);
        execute!(io::stdout(), Clear(ClearType::All))
    }

    /// Rows below the HUD, in terminal cells.
    pub fn field_rows(&self) -> u16 {
        self.rows.saturating_sub(self.hud_rows)
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Draws `canvas` below the HUD and the HUD lines above it.
    pub fn present<W: Write>(&mut self, out: &mut W, canvas: &Canvas, hud: &[String]) -> io::Result<()> {
        queue!(out, BeginSynchronizedUpdate, SetBackgroundColor(Color::Black))?;

        let w = self.cols as usize;
        for (i, line) in hud.iter().take(self.hud_rows as usize).enumerate() {
            queue!(
                out,
                cursor::MoveTo(0, i as u16),
                SetForegroundColor(Color::DarkGrey),
                Print(pad_to(line, w))
            )?;
        }

        let field_rows = self.field_rows() as usize;
        for cy in 0..field_rows {
            for cx in 0..w {
                let cell = cell_at(canvas, cx, cy, self.threshold);
                let ty = cy + self.hud_rows as usize;
                let slot = &mut self.prev[ty * w + cx];
                if *slot == Some(cell) {
                    continue;
                }
                *slot = Some(cell);
                queue!(
                    out,
                    cursor::MoveTo(cx as u16, ty as u16),
                    SetForegroundColor(Color::Rgb {
                        r: cell.color.r,
                        g: cell.color.g,
                        b: cell.color.b,
                    }),
                    Print(cell.glyph())
                )?;
            }
        }

        queue!(out, ResetColor, EndSynchronizedUpdate)?;
        out.flush()
    }

    /// Forces a full redraw on the next [`Presenter::present`].
    pub fn invalidate(&mut self) {
        for c in self.prev.iter_mut() {
            *c = None;
        }
    }
}

pub fn pad_to(s: &str, w: usize) -> String {
    let n = s.chars().count();
    if n >= w {
        s.chars().take(w).collect()
    } else {
        let mut out = String::with_capacity(w);
        out.push_str(s);
        out.extend(std::iter::repeat(' ').take(w - n));
        out
    }
}

/// Centered ASCII box with a title and one entry per line.
pub fn draw_help<W: Write>(out: &mut W, w: usize, h: usize, title: &str, lines: &[&str]) -> io::Result<()> {
    let box_w = w.saturating_sub(4).min(60);
    let box_h = h.saturating_sub(4).min(lines.len() + 4);
    let x0 = w.saturating_sub(box_w) / 2;
    let y0 = h.saturating_sub(box_h) / 2;

    queue!(
        out,
        SetForegroundColor(Color::DarkGrey),
        cursor::MoveTo(x0 as u16, y0 as u16),
        Print(format!("+{}+", "-".repeat(box_w.saturating_sub(2))))
    )?;
    for i in 1..box_h.saturating_sub(1) {
        queue!(
            out,
            cursor::MoveTo(x0 as u16, (y0 + i) as u16),
            Print(format!("|{}|", " ".repeat(box_w.saturating_sub(2))))
        )?;
    }
    queue!(
        out,
        cursor::MoveTo(x0 as u16, (y0 + box_h.saturating_sub(1)) as u16),
        Print(format!("+{}+", "-".repeat(box_w.saturating_sub(2))))
    )?;

    queue!(
        out,
        SetForegroundColor(Color::Grey),
        cursor::MoveTo((x0 + 2) as u16, (y0 + 1) as u16),
        Print(pad_to(title, box_w.saturating_sub(4)))
    )?;
    for (i, l) in lines.iter().enumerate() {
        let yy = y0 + 2 + i;
        if yy >= y0 + box_h.saturating_sub(1) {
            break;
        }
        queue!(
            out,
            cursor::MoveTo((x0 + 2) as u16, yy as u16),
            Print(pad_to(l, box_w.saturating_sub(4)))
        )?;
    }
    out.flush()
}
