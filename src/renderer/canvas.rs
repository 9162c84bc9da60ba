//! Replays draw lists on a `CanvasRenderingContext2d`

use std::collections::HashMap;
use std::f64::consts::TAU;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::draw::{Color, DrawCmd, DrawList};

const SPOKE_COLOR: Color = Color::rgb(0x33, 0x33, 0x33);

/// A 2D context plus the decoded `<img>` elements it can draw
pub struct CanvasPainter {
    ctx: CanvasRenderingContext2d,
    images: HashMap<&'static str, HtmlImageElement>,
}

impl CanvasPainter {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self {
            ctx,
            images: HashMap::new(),
        }
    }

    /// Make an image element available to `Image` commands
    pub fn add_image(&mut self, name: &'static str, image: HtmlImageElement) {
        self.images.insert(name, image);
    }

    /// Paint every command in order
    pub fn paint(&self, list: &DrawList) -> Result<(), JsValue> {
        for cmd in &list.cmds {
            self.paint_cmd(cmd)?;
        }
        Ok(())
    }

    fn paint_cmd(&self, cmd: &DrawCmd) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        match cmd {
            DrawCmd::FillRect { rect, color } => {
                ctx.set_fill_style_str(&color.css());
                ctx.fill_rect(rect.x as f64, rect.y as f64, rect.w as f64, rect.h as f64);
            }
            DrawCmd::FillCircle {
                center,
                radius,
                color,
            } => {
                ctx.set_fill_style_str(&color.css());
                ctx.begin_path();
                ctx.arc(center.x as f64, center.y as f64, *radius as f64, 0.0, TAU)?;
                ctx.fill();
            }
            DrawCmd::Wheel {
                center,
                radius,
                rotation,
            } => {
                let r = *radius as f64;
                ctx.save();
                ctx.translate(center.x as f64, center.y as f64)?;
                ctx.rotate(*rotation as f64)?;
                ctx.set_fill_style_str(&Color::BLACK.css());
                ctx.begin_path();
                ctx.arc(0.0, 0.0, r, 0.0, TAU)?;
                ctx.fill();
                ctx.set_stroke_style_str(&SPOKE_COLOR.css());
                ctx.set_line_width(2.0);
                ctx.begin_path();
                let spoke = r * 0.8;
                ctx.move_to(-spoke, 0.0);
                ctx.line_to(spoke, 0.0);
                ctx.move_to(0.0, -spoke);
                ctx.line_to(0.0, spoke);
                ctx.stroke();
                ctx.restore();
            }
            DrawCmd::Image { name, rect } => {
                if let Some(img) = self.images.get(name) {
                    ctx.draw_image_with_html_image_element_and_dw_and_dh(
                        img,
                        rect.x as f64,
                        rect.y as f64,
                        rect.w as f64,
                        rect.h as f64,
                    )?;
                }
            }
            DrawCmd::Text {
                text,
                pos,
                size_px,
                color,
            } => {
                ctx.set_fill_style_str(&color.css());
                ctx.set_font(&format!("{}px monospace", size_px));
                ctx.fill_text(text, pos.x as f64, pos.y as f64)?;
            }
        }
        Ok(())
    }
}
