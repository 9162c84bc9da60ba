//! Collision detection between axis-aligned sprites
//!
//! The tricky part of Bike Dash: sprites are drawn scaled and carry
//! transparent margins, so a bounding-box hit is only a candidate. When both
//! sprites have pixel data, the overlap region is resampled from each source
//! image and the alpha channels are intersected.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::PixelSource;

/// Axis-aligned rectangle in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Strict overlap test (touching edges do not collide)
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Intersecting region, if it has positive area
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let w = self.right().min(other.right()) - x;
        let h = self.bottom().min(other.bottom()) - y;
        if w <= 0.0 || h <= 0.0 {
            return None;
        }
        Some(Rect::new(x, y, w, h))
    }

    /// Inclusive point containment
    #[inline]
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// What a collision box was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxKind {
    Player,
    Dog,
    Bus,
    Collectible,
}

/// Ephemeral view of a sprite for a single collision test
#[derive(Clone, Copy)]
pub struct CollisionBox<'a> {
    pub rect: Rect,
    /// Source image the sprite is drawn from (scaled to `rect`)
    pub image: Option<&'a dyn PixelSource>,
    pub kind: BoxKind,
}

impl std::fmt::Debug for CollisionBox<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionBox")
            .field("rect", &self.rect)
            .field("has_image", &self.image.is_some())
            .field("kind", &self.kind)
            .finish()
    }
}

impl<'a> CollisionBox<'a> {
    pub fn new(rect: Rect, kind: BoxKind) -> Self {
        Self {
            rect,
            image: None,
            kind,
        }
    }

    pub fn with_image(mut self, image: &'a dyn PixelSource) -> Self {
        self.image = Some(image);
        self
    }

    /// Attach an image when one is available
    pub fn with_image_opt(mut self, image: Option<&'a dyn PixelSource>) -> Self {
        self.image = image;
        self
    }

    /// Image only if it is fully loaded
    fn loaded_image(&self) -> Option<&'a dyn PixelSource> {
        self.image.filter(|img| img.is_loaded())
    }
}

/// Why pixel resampling could not run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResampleError {
    #[error("sprite has no loaded image")]
    MissingImage,
    #[error("overlap region {0}x{1} is too small to sample")]
    DegenerateOverlap(f32, f32),
    #[error("sprite has zero rendered size")]
    ZeroSizeSprite,
    #[error("image has zero natural size")]
    EmptyImage,
}

/// Alpha channel of a resampled region
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaMask {
    pub width: u32,
    pub height: u32,
    pub alpha: Vec<u8>,
}

impl AlphaMask {
    /// True if any pixel is opaque in both masks
    pub fn intersects(&self, other: &AlphaMask) -> bool {
        self.alpha
            .iter()
            .zip(other.alpha.iter())
            .any(|(&a, &b)| a > 0 && b > 0)
    }
}

/// Rectangle test between two boxes
#[inline]
pub fn rect_collision(a: &Rect, b: &Rect) -> bool {
    a.overlaps(b)
}

/// Resample the part of `sprite` covered by `overlap` into an
/// overlap-sized alpha mask (nearest-neighbour, like a scaled blit).
pub fn resample_alpha(sprite: &CollisionBox<'_>, overlap: &Rect) -> Result<AlphaMask, ResampleError> {
    let image = sprite.loaded_image().ok_or(ResampleError::MissingImage)?;

    // The scratch surface has whole-pixel dimensions
    let width = overlap.w.floor() as u32;
    let height = overlap.h.floor() as u32;
    if width == 0 || height == 0 {
        return Err(ResampleError::DegenerateOverlap(overlap.w, overlap.h));
    }
    if sprite.rect.w <= 0.0 || sprite.rect.h <= 0.0 {
        return Err(ResampleError::ZeroSizeSprite);
    }
    let (nat_w, nat_h) = image.natural_size();
    if nat_w == 0 || nat_h == 0 {
        return Err(ResampleError::EmptyImage);
    }

    // Image pixels per rendered pixel
    let scale_x = nat_w as f32 / sprite.rect.w;
    let scale_y = nat_h as f32 / sprite.rect.h;
    let src_x = (overlap.x - sprite.rect.x) * scale_x;
    let src_y = (overlap.y - sprite.rect.y) * scale_y;
    let step_x = overlap.w * scale_x / width as f32;
    let step_y = overlap.h * scale_y / height as f32;

    let mut alpha = Vec::with_capacity(width as usize * height as usize);
    for j in 0..height {
        let sy = ((src_y + (j as f32 + 0.5) * step_y).floor().max(0.0) as u32).min(nat_h - 1);
        for i in 0..width {
            let sx = ((src_x + (i as f32 + 0.5) * step_x).floor().max(0.0) as u32).min(nat_w - 1);
            alpha.push(image.alpha_at(sx, sy).unwrap_or(0));
        }
    }

    Ok(AlphaMask {
        width,
        height,
        alpha,
    })
}

/// Alpha intersection inside the overlap of two boxes that already pass
/// the rectangle test
fn pixel_overlap(a: &CollisionBox<'_>, b: &CollisionBox<'_>) -> Result<bool, ResampleError> {
    let overlap = a
        .rect
        .intersection(&b.rect)
        .ok_or(ResampleError::DegenerateOverlap(0.0, 0.0))?;
    let mask_a = resample_alpha(a, &overlap)?;
    let mask_b = resample_alpha(b, &overlap)?;
    Ok(mask_a.intersects(&mask_b))
}

/// Pixel-accurate collision with automatic fallback
///
/// Uses the rectangle test as a pre-filter, then compares alpha in the
/// overlap. Any resampling failure degrades to the rectangle result.
pub fn pixel_collision(a: &CollisionBox<'_>, b: &CollisionBox<'_>) -> bool {
    if a.loaded_image().is_none() || b.loaded_image().is_none() {
        return rect_collision(&a.rect, &b.rect);
    }
    if !rect_collision(&a.rect, &b.rect) {
        return false;
    }
    match pixel_overlap(a, b) {
        Ok(hit) => hit,
        Err(err) => {
            log::warn!(
                "Pixel collision {:?}/{:?} fell back to rectangle test: {}",
                a.kind,
                b.kind,
                err
            );
            true
        }
    }
}

/// A box with an optional inset hitbox
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hitbox {
    pub rect: Rect,
    pub offset_x: f32,
    pub offset_y: f32,
    /// Defaults to the full box width
    pub hitbox_w: Option<f32>,
    /// Defaults to the full box height
    pub hitbox_h: Option<f32>,
}

impl Hitbox {
    pub fn full(rect: Rect) -> Self {
        Self {
            rect,
            ..Default::default()
        }
    }

    pub fn inset(rect: Rect, offset_x: f32, offset_y: f32, w: f32, h: f32) -> Self {
        Self {
            rect,
            offset_x,
            offset_y,
            hitbox_w: Some(w),
            hitbox_h: Some(h),
        }
    }

    /// The rectangle actually tested
    pub fn effective(&self) -> Rect {
        Rect::new(
            self.rect.x + self.offset_x,
            self.rect.y + self.offset_y,
            self.hitbox_w.unwrap_or(self.rect.w),
            self.hitbox_h.unwrap_or(self.rect.h),
        )
    }
}

/// Rectangle test on the derived inset hitboxes
pub fn hitbox_collision(a: &Hitbox, b: &Hitbox) -> bool {
    rect_collision(&a.effective(), &b.effective())
}

/// A round object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

/// Centers closer than the sum of radii
pub fn circle_collision(a: &Circle, b: &Circle) -> bool {
    a.center.distance(b.center) < a.radius + b.radius
}

/// Inclusive point-in-box test
pub fn point_in_rect(point: Vec2, rect: &Rect) -> bool {
    rect.contains_point(point)
}

/// Stateless collision service injected into the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionService {
    /// Use alpha testing when both sprites have pixel data
    pub pixel_perfect: bool,
}

impl Default for CollisionService {
    fn default() -> Self {
        Self {
            pixel_perfect: true,
        }
    }
}

impl CollisionService {
    pub fn new(pixel_perfect: bool) -> Self {
        Self { pixel_perfect }
    }

    /// Default entry point; callers never learn which path ran
    pub fn collide(&self, a: &CollisionBox<'_>, b: &CollisionBox<'_>) -> bool {
        if self.pixel_perfect {
            pixel_collision(a, b)
        } else {
            rect_collision(&a.rect, &b.rect)
        }
    }

    /// Indices of every target the subject collides with
    pub fn colliding_indices(
        &self,
        subject: &CollisionBox<'_>,
        targets: &[CollisionBox<'_>],
    ) -> Vec<usize> {
        targets
            .iter()
            .enumerate()
            .filter(|(_, t)| self.collide(subject, t))
            .map(|(i, _)| i)
            .collect()
    }

    /// Inclusive point-in-box test
    pub fn point_in_box(&self, point: Vec2, target: &CollisionBox<'_>) -> bool {
        point_in_rect(point, &target.rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::SpriteImage;
    use proptest::prelude::*;

    fn opaque(w: u32, h: u32) -> SpriteImage {
        SpriteImage::solid(w, h, [255, 0, 0, 255])
    }

    fn clear(w: u32, h: u32) -> SpriteImage {
        SpriteImage::solid(w, h, [0, 0, 0, 0])
    }

    #[test]
    fn test_rect_overlap_and_gap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect_collision(&a, &a));
        assert!(rect_collision(&a, &Rect::new(5.0, 5.0, 10.0, 10.0)));
        // Touching edges do not collide
        assert!(!rect_collision(&a, &Rect::new(10.0, 0.0, 10.0, 10.0)));
        // Gap on y only
        assert!(!rect_collision(&a, &Rect::new(0.0, 10.5, 10.0, 10.0)));
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(4.0, 6.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(4.0, 6.0, 6.0, 4.0)));
        assert_eq!(a.intersection(&Rect::new(20.0, 0.0, 1.0, 1.0)), None);
    }

    #[test]
    fn test_pixel_opaque_identical_hits() {
        let img = opaque(16, 16);
        let a = CollisionBox::new(Rect::new(10.0, 10.0, 32.0, 32.0), BoxKind::Player)
            .with_image(&img);
        let b = CollisionBox::new(Rect::new(10.0, 10.0, 32.0, 32.0), BoxKind::Dog)
            .with_image(&img);
        assert!(pixel_collision(&a, &b));
    }

    #[test]
    fn test_pixel_transparent_misses() {
        let solid = opaque(10, 10);
        let empty = clear(10, 10);
        let a = CollisionBox::new(Rect::new(0.0, 0.0, 10.0, 10.0), BoxKind::Player)
            .with_image(&solid);
        let b = CollisionBox::new(Rect::new(0.0, 0.0, 10.0, 10.0), BoxKind::Dog)
            .with_image(&empty);
        assert!(rect_collision(&a.rect, &b.rect));
        assert!(!pixel_collision(&a, &b));
    }

    #[test]
    fn test_pixel_transparent_margin_scaled() {
        // 4x4 image, opaque only in its left half, drawn at 40x40
        let left_half = SpriteImage::from_alpha_fn(4, 4, |x, _| if x < 2 { 255 } else { 0 });
        let solid = opaque(2, 2);
        let a = CollisionBox::new(Rect::new(0.0, 0.0, 40.0, 40.0), BoxKind::Player)
            .with_image(&left_half);

        // Overlaps only the transparent right half
        let b = CollisionBox::new(Rect::new(25.0, 0.0, 40.0, 40.0), BoxKind::Dog)
            .with_image(&solid);
        assert!(rect_collision(&a.rect, &b.rect));
        assert!(!pixel_collision(&a, &b));

        // Reaches into the opaque half
        let c = CollisionBox::new(Rect::new(15.0, 0.0, 40.0, 40.0), BoxKind::Dog)
            .with_image(&solid);
        assert!(pixel_collision(&a, &c));
    }

    #[test]
    fn test_missing_image_uses_rectangles() {
        let img = clear(8, 8);
        let a = CollisionBox::new(Rect::new(0.0, 0.0, 10.0, 10.0), BoxKind::Player)
            .with_image(&img);
        let b = CollisionBox::new(Rect::new(5.0, 5.0, 10.0, 10.0), BoxKind::Bus);
        // Transparent image is ignored because the other side has no pixels
        assert!(pixel_collision(&a, &b));
    }

    #[test]
    fn test_degenerate_overlap_degrades_to_rectangle() {
        let img = clear(8, 8);
        let a = CollisionBox::new(Rect::new(0.0, 0.0, 10.0, 10.0), BoxKind::Player)
            .with_image(&img);
        // Sub-pixel overlap cannot be sampled
        let b = CollisionBox::new(Rect::new(9.5, 0.0, 10.0, 10.0), BoxKind::Dog)
            .with_image(&img);
        let overlap = a.rect.intersection(&b.rect).unwrap();
        assert!(matches!(
            resample_alpha(&a, &overlap),
            Err(ResampleError::DegenerateOverlap(..))
        ));
        assert!(pixel_collision(&a, &b));
    }

    #[test]
    fn test_hitbox_inset() {
        let a = Hitbox::inset(Rect::new(0.0, 0.0, 100.0, 80.0), 20.0, 10.0, 60.0, 60.0);
        let b = Hitbox::full(Rect::new(85.0, 0.0, 40.0, 40.0));
        // Full boxes overlap, inset hitbox ends at x=80
        assert!(rect_collision(&a.rect, &b.rect));
        assert!(!hitbox_collision(&a, &b));
        assert_eq!(Hitbox::full(b.rect).effective(), b.rect);
    }

    #[test]
    fn test_circle_and_point() {
        let a = Circle {
            center: Vec2::new(0.0, 0.0),
            radius: 5.0,
        };
        let b = Circle {
            center: Vec2::new(9.0, 0.0),
            radius: 5.0,
        };
        let c = Circle {
            center: Vec2::new(10.0, 0.0),
            radius: 5.0,
        };
        assert!(circle_collision(&a, &b));
        assert!(!circle_collision(&a, &c));

        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(point_in_rect(Vec2::new(10.0, 10.0), &r));
        assert!(!point_in_rect(Vec2::new(10.1, 5.0), &r));
    }

    #[test]
    fn test_service_toggle() {
        let empty = clear(10, 10);
        let a = CollisionBox::new(Rect::new(0.0, 0.0, 10.0, 10.0), BoxKind::Player)
            .with_image(&empty);
        let b = a;
        assert!(!CollisionService::new(true).collide(&a, &b));
        assert!(CollisionService::new(false).collide(&a, &b));

        let targets = [
            CollisionBox::new(Rect::new(50.0, 0.0, 5.0, 5.0), BoxKind::Collectible),
            CollisionBox::new(Rect::new(5.0, 5.0, 5.0, 5.0), BoxKind::Collectible),
        ];
        let subject = CollisionBox::new(Rect::new(0.0, 0.0, 10.0, 10.0), BoxKind::Player);
        assert_eq!(
            CollisionService::default().colliding_indices(&subject, &targets),
            vec![1]
        );
    }

    fn arb_rect() -> impl Strategy<Value = Rect> {
        (-50.0f32..50.0, -50.0f32..50.0, 0.5f32..40.0, 0.5f32..40.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_rect_symmetric(a in arb_rect(), b in arb_rect()) {
            prop_assert_eq!(rect_collision(&a, &b), rect_collision(&b, &a));
        }

        #[test]
        fn prop_gap_never_collides(a in arb_rect(), gap in 0.01f32..20.0, h in 0.5f32..40.0) {
            let right = Rect::new(a.right() + gap, a.y, 10.0, h);
            prop_assert!(!rect_collision(&a, &right));
            let below = Rect::new(a.x, a.bottom() + gap, 10.0, h);
            prop_assert!(!rect_collision(&a, &below));
        }

        #[test]
        fn prop_pixel_implies_rect(
            a in arb_rect(),
            b in arb_rect(),
            cutoff in 0u32..8,
        ) {
            let img_a = SpriteImage::from_alpha_fn(8, 8, |x, _| if x >= cutoff { 255 } else { 0 });
            let img_b = SpriteImage::from_alpha_fn(8, 8, |_, y| if y < 8 - cutoff { 255 } else { 0 });
            let box_a = CollisionBox::new(a, BoxKind::Player).with_image(&img_a);
            let box_b = CollisionBox::new(b, BoxKind::Dog).with_image(&img_b);
            if pixel_collision(&box_a, &box_b) {
                prop_assert!(rect_collision(&a, &b));
            }
            prop_assert_eq!(pixel_collision(&box_a, &box_b), pixel_collision(&box_b, &box_a));
        }
    }
}
