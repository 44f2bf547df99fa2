//! Board layout and the 1-bit frame it is drawn onto.
//!
//! The board is split by a vertical rule at `divider_x`:
//!
//! | Left column          | Right column                               |
//! |----------------------|--------------------------------------------|
//! | "Uptime" heading     | "!! Down Monitors !!" (only when any down) |
//! | service / percentage | "Backend" heading + incidents              |
//! | ...                  | "Frontend" heading + incidents (optional)  |
//!
//! Every coordinate lives in [`Layout`] so the board can be retuned for another
//! panel without touching the drawing code. Text that would run past the right
//! edge is cut and ends in `...`; rows that start below the bottom edge are
//! skipped.

use std::borrow::Cow;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};
use embedded_graphics::text::{Baseline, Text};
use profont::{PROFONT_12_POINT, PROFONT_14_POINT, PROFONT_18_POINT, PROFONT_24_POINT};
use serde::{Deserialize, Serialize};

use crate::incidents::Incident;
use crate::snapshot::Snapshot;

const ELLIPSIS: &str = "...";

pub const UPTIME_HEADING: &str = "Uptime";
pub const DOWN_HEADING: &str = "!! Down Monitors !!";
pub const BACKEND_HEADING: &str = "Backend";
pub const FRONTEND_HEADING: &str = "Frontend";

// =============================================================================
// Frame
// =============================================================================

/// Monochrome bitmap, packed 8 pixels per byte, MSB first, set bit = black.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    row_bytes: usize,
    bits: Vec<u8>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("black_pixels", &self.black_pixels())
            .finish()
    }
}

impl Frame {
    /// An all-white frame
    pub fn new(width: u32, height: u32) -> Self {
        let row_bytes = width.div_ceil(8) as usize;
        Self {
            width,
            height,
            row_bytes,
            bits: vec![0; row_bytes * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let byte = y as usize * self.row_bytes + x as usize / 8;
        Some((byte, 0x80 >> (x as usize % 8)))
    }

    pub fn set_pixel(&mut self, point: Point, color: BinaryColor) {
        if let Some((byte, mask)) = self.index(point.x, point.y) {
            match color {
                BinaryColor::On => self.bits[byte] |= mask,
                BinaryColor::Off => self.bits[byte] &= !mask,
            }
        }
    }

    /// Whether the pixel is inked; out-of-bounds pixels read as white
    pub fn is_black(&self, x: i32, y: i32) -> bool {
        self.index(x, y)
            .map(|(byte, mask)| self.bits[byte] & mask != 0)
            .unwrap_or(false)
    }

    pub fn black_pixels(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Buffer in the panel's native convention: set bit = white
    pub fn to_device_buffer(&self) -> Vec<u8> {
        self.bits.iter().map(|b| !b).collect()
    }

    /// Binary PBM (`P4`) image of the frame
    pub fn to_pbm(&self) -> Vec<u8> {
        let mut out = format!("P4\n{} {}\n", self.width, self.height).into_bytes();
        out.extend_from_slice(&self.bits);
        out
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point, color);
        }
        Ok(())
    }
}

// =============================================================================
// Fonts
// =============================================================================

/// What a piece of text is used for; each role maps to one font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRole {
    Heading,
    Label,
    Number,
    Detail,
}

/// Font lookup and text measurement
pub trait TextMeasurer: Send + Sync {
    fn font(&self, role: FontRole) -> &MonoFont<'static>;

    /// Rendered width of `text` in pixels
    fn measure(&self, role: FontRole, text: &str) -> u32 {
        let font = self.font(role);
        let n = text.chars().count() as u32;
        if n == 0 {
            return 0;
        }
        n * font.character_size.width + (n - 1) * font.character_spacing
    }
}

/// ProFont set sized for an 800x480 panel
#[derive(Debug, Clone, Copy)]
pub struct MonoFonts {
    pub heading: &'static MonoFont<'static>,
    pub label: &'static MonoFont<'static>,
    pub number: &'static MonoFont<'static>,
    pub detail: &'static MonoFont<'static>,
}

impl Default for MonoFonts {
    fn default() -> Self {
        Self {
            heading: &PROFONT_24_POINT,
            label: &PROFONT_14_POINT,
            number: &PROFONT_18_POINT,
            detail: &PROFONT_12_POINT,
        }
    }
}

impl TextMeasurer for MonoFonts {
    fn font(&self, role: FontRole) -> &MonoFont<'static> {
        match role {
            FontRole::Heading => self.heading,
            FontRole::Label => self.label,
            FontRole::Number => self.number,
            FontRole::Detail => self.detail,
        }
    }
}

/// Cut `text` so it fits in `max_width`, ending with `...` when shortened
pub fn fit_text<'a>(
    fonts: &dyn TextMeasurer,
    role: FontRole,
    text: &'a str,
    max_width: u32,
) -> Cow<'a, str> {
    if fonts.measure(role, text) <= max_width {
        return Cow::Borrowed(text);
    }
    let mut kept: String = text.to_string();
    while !kept.is_empty() {
        kept.pop();
        let candidate = format!("{}{}", kept.trim_end(), ELLIPSIS);
        if fonts.measure(role, &candidate) <= max_width {
            return Cow::Owned(candidate);
        }
    }
    Cow::Owned(String::new())
}

// =============================================================================
// Layout
// =============================================================================

/// Pixel positions and row heights of the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub rule_width: u32,

    pub heading_x: i32,
    pub heading_y: i32,

    pub uptime_x: i32,
    pub uptime_top: i32,
    /// Advance after a service name
    pub label_advance: i32,
    pub number_indent: i32,
    /// Advance after a percentage
    pub number_advance: i32,

    pub divider_x: i32,
    pub header_rule_y: i32,

    pub right_x: i32,
    pub down_list_y: i32,
    /// Where the incident sections start when monitors are down
    pub down_section_offset: i32,

    /// Rule under a section heading, relative to the heading
    pub section_rule_offset: i32,
    pub section_rule_inset: i32,
    /// First incident row, relative to the heading
    pub section_body_offset: i32,
    pub title_advance: i32,
    pub culprit_indent: i32,
    pub culprit_advance: i32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
            rule_width: 3,
            heading_x: 5,
            heading_y: 0,
            uptime_x: 10,
            uptime_top: 50,
            label_advance: 20,
            number_indent: 8,
            number_advance: 26,
            divider_x: 150,
            header_rule_y: 50,
            right_x: 160,
            down_list_y: 50,
            down_section_offset: 80,
            section_rule_offset: 50,
            section_rule_inset: 10,
            section_body_offset: 60,
            title_advance: 18,
            culprit_indent: 12,
            culprit_advance: 20,
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// A piece of text placed on the board (top-left anchored)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedText {
    pub role: FontRole,
    pub text: String,
    pub position: Point,
}

/// A frame together with what was placed on it
#[derive(Debug)]
pub struct Canvas {
    pub frame: Frame,
    pub texts: Vec<PlacedText>,
    pub rules: Vec<(Point, Point)>,
}

impl Canvas {
    /// First placed text with exactly this content
    pub fn find(&self, text: &str) -> Option<&PlacedText> {
        self.texts.iter().find(|t| t.text == text)
    }
}

/// Draws snapshots onto frames
pub struct Renderer {
    layout: Layout,
    fonts: Box<dyn TextMeasurer>,
    ratio_precision: usize,
}

impl Renderer {
    pub fn new(layout: Layout, fonts: Box<dyn TextMeasurer>, ratio_precision: u32) -> Self {
        Self {
            layout,
            fonts,
            ratio_precision: ratio_precision as usize,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn render(&self, snapshot: &Snapshot) -> Frame {
        self.draw(snapshot).frame
    }

    pub fn draw(&self, snapshot: &Snapshot) -> Canvas {
        let l = &self.layout;
        let mut canvas = Canvas {
            frame: Frame::new(l.width, l.height),
            texts: Vec::new(),
            rules: Vec::new(),
        };
        let right_edge = l.width as i32;
        let left = l.divider_x;

        tracing::debug!("Drawing uptimes");
        self.text(&mut canvas, FontRole::Heading, UPTIME_HEADING, (l.heading_x, l.heading_y), left);
        let mut y = l.uptime_top;
        for service in &snapshot.service_ratios {
            if y >= l.height as i32 {
                break;
            }
            self.text(&mut canvas, FontRole::Label, &service.service_name, (l.uptime_x, y), left);
            y += l.label_advance;
            let percent = format!("{:.*}%", self.ratio_precision, service.average_ratio);
            let at = (l.uptime_x + l.number_indent, y);
            self.text(&mut canvas, FontRole::Number, &percent, at, left);
            y += l.number_advance;
        }
        self.rule(&mut canvas, (0, l.header_rule_y), (l.divider_x, l.header_rule_y));
        self.rule(&mut canvas, (l.divider_x, 0), (l.divider_x, l.height as i32));

        tracing::debug!("Drawing down monitors");
        let x = l.right_x;
        let mut y = if snapshot.down_monitor_names.is_empty() {
            0
        } else {
            self.text(&mut canvas, FontRole::Heading, DOWN_HEADING, (x, 0), right_edge);
            let list = snapshot.down_monitor_names.join(", ");
            self.text(&mut canvas, FontRole::Label, &list, (x, l.down_list_y), right_edge);
            self.rule(
                &mut canvas,
                (l.divider_x, l.down_section_offset),
                (right_edge, l.down_section_offset),
            );
            l.down_section_offset
        };

        tracing::debug!("Drawing backend events");
        y = self.section(&mut canvas, BACKEND_HEADING, &snapshot.backend_incidents, x, y);

        if let Some(frontend) = &snapshot.frontend_incidents {
            tracing::debug!("Drawing frontend events");
            self.section(&mut canvas, FRONTEND_HEADING, frontend, x, y);
        }

        canvas
    }

    /// Heading, rule and incident rows; returns the cursor after the last row
    fn section(
        &self,
        canvas: &mut Canvas,
        heading: &str,
        incidents: &[Incident],
        x: i32,
        mut y: i32,
    ) -> i32 {
        let l = &self.layout;
        let right_edge = l.width as i32;
        self.text(canvas, FontRole::Heading, heading, (x, y), right_edge);
        let rule_y = y + l.section_rule_offset;
        self.rule(
            canvas,
            (x - l.section_rule_inset, rule_y),
            (right_edge, rule_y),
        );
        y += l.section_body_offset;

        for incident in incidents {
            let line = format!("({}) {}", incident.occurrence_count, incident.title);
            self.text(canvas, FontRole::Detail, &line, (x, y), right_edge);
            y += l.title_advance;
            let at = (x + l.culprit_indent, y);
            self.text(canvas, FontRole::Detail, &incident.culprit, at, right_edge);
            y += l.culprit_advance;
        }
        y
    }

    /// Place `text` with its top-left at `at`, cut to end before `column_end`
    fn text(
        &self,
        canvas: &mut Canvas,
        role: FontRole,
        text: &str,
        at: (i32, i32),
        column_end: i32,
    ) {
        let (x, y) = at;
        if y >= self.layout.height as i32 {
            return;
        }
        let available = (column_end - x).max(0) as u32;
        let fitted = fit_text(self.fonts.as_ref(), role, text, available);
        let position = Point::new(x, y);
        let style = MonoTextStyle::new(self.fonts.font(role), BinaryColor::On);
        Text::with_baseline(&fitted, position, style, Baseline::Top)
            .draw(&mut canvas.frame)
            .ok();
        canvas.texts.push(PlacedText {
            role,
            text: fitted.into_owned(),
            position,
        });
    }

    fn rule(&self, canvas: &mut Canvas, from: (i32, i32), to: (i32, i32)) {
        let (from, to) = (Point::new(from.0, from.1), Point::new(to.0, to.1));
        Line::new(from, to)
            .into_styled(PrimitiveStyle::with_stroke(
                BinaryColor::On,
                self.layout.rule_width,
            ))
            .draw(&mut canvas.frame)
            .ok();
        canvas.rules.push((from, to));
    }
}
