//! Draw commands

use glam::Vec2;

use crate::sim::Rect;

/// An sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    /// Background when the city image is missing
    pub const BACKDROP: Color = Color::rgb(0x33, 0x33, 0x33);
    /// Ground band and placeholder rider
    pub const SLATE: Color = Color::rgb(0x54, 0x5a, 0x74);
    pub const BUS_BLUE: Color = Color::rgb(0x00, 0x66, 0xff);
    pub const GLOVE_RED: Color = Color::rgb(0xff, 0x00, 0x00);
    pub const CUFF_RED: Color = Color::rgb(0xaa, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex notation
    pub fn css(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// One drawing operation, in canvas coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    FillRect {
        rect: Rect,
        color: Color,
    },
    FillCircle {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    /// A bicycle wheel: filled disc with a cross of spokes
    Wheel {
        center: Vec2,
        radius: f32,
        rotation: f32,
    },
    /// A named image stretched into `rect`
    Image {
        name: &'static str,
        rect: Rect,
    },
    Text {
        text: String,
        pos: Vec2,
        size_px: u32,
        color: Color,
    },
}

/// Commands in paint order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub cmds: Vec<DrawCmd>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: DrawCmd) {
        self.cmds.push(cmd);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.push(DrawCmd::FillRect {
            rect: Rect::new(x, y, w, h),
            color,
        });
    }

    pub fn image(&mut self, name: &'static str, rect: Rect) {
        self.push(DrawCmd::Image { name, rect });
    }

    pub fn text(&mut self, text: impl Into<String>, x: f32, y: f32, size_px: u32) {
        self.push(DrawCmd::Text {
            text: text.into(),
            pos: Vec2::new(x, y),
            size_px,
            color: Color::WHITE,
        });
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Names of every image referenced
    pub fn images(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.cmds.iter().filter_map(|cmd| match cmd {
            DrawCmd::Image { name, .. } => Some(*name),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_hex() {
        assert_eq!(Color::SLATE.css(), "#545a74");
        assert_eq!(Color::BUS_BLUE.css(), "#0066ff");
    }
}
