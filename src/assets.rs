//! Sprite images and the registry the host fills as they finish loading
//!
//! The simulation never waits on an image: it asks whether one is ready and
//! falls back to rectangles (collision) or placeholder shapes (rendering).

use std::collections::HashMap;

/// Player animation frames, in playback order
pub const PLAYER_FRAMES: [&str; 3] = ["player1", "player2", "player3"];
pub const DOG: &str = "dog";
pub const BUS: &str = "bus";
pub const GLOVE: &str = "glove";
pub const BACKGROUND: &str = "background";

/// Every image the game requests, with its relative path
pub const IMAGE_SOURCES: [(&str, &str); 7] = [
    ("player1", "images/player1.png"),
    ("player2", "images/player2.png"),
    ("player3", "images/player3.png"),
    (DOG, "images/dog.png"),
    (BUS, "images/bus.png"),
    (GLOVE, "images/glove.png"),
    (BACKGROUND, "images/city-background.png"),
];

/// Pixel access needed by the collision engine's resampling step
pub trait PixelSource {
    /// Native (unscaled) size in pixels
    fn natural_size(&self) -> (u32, u32);
    /// Whether the pixel data is complete
    fn is_loaded(&self) -> bool;
    /// Alpha of the pixel at (x, y), `None` outside the image
    fn alpha_at(&self, x: u32, y: u32) -> Option<u8>;
}

/// A decoded RGBA8 image
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, 4 bytes per pixel
    pub rgba: Vec<u8>,
}

impl SpriteImage {
    /// Wrap raw RGBA data. Returns `None` when the buffer size does not match.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        if rgba.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba,
        })
    }

    /// A single-colour image
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            rgba,
        }
    }

    /// Build an image from a per-pixel alpha function (colour is white)
    pub fn from_alpha_fn(width: u32, height: u32, alpha: impl Fn(u32, u32) -> u8) -> Self {
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&[255, 255, 255, alpha(x, y)]);
            }
        }
        Self {
            width,
            height,
            rgba,
        }
    }
}

impl PixelSource for SpriteImage {
    fn natural_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_loaded(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4 + 3;
        self.rgba.get(idx).copied()
    }
}

/// Images keyed by name, populated by asset-ready callbacks
#[derive(Debug, Default)]
pub struct ImageRegistry {
    images: HashMap<String, SpriteImage>,
    failed: Vec<String>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fully loaded image
    pub fn insert(&mut self, name: &str, image: SpriteImage) {
        log::info!("Image loaded: {} ({}x{})", name, image.width, image.height);
        self.failed.retain(|n| n != name);
        self.images.insert(name.to_string(), image);
    }

    /// Record an image that failed to load; callers keep using fallbacks
    pub fn mark_failed(&mut self, name: &str) {
        log::warn!("Failed to load image: {}", name);
        if !self.failed.iter().any(|n| n == name) {
            self.failed.push(name.to_string());
        }
    }

    /// The image, if it is fully loaded
    pub fn get(&self, name: &str) -> Option<&SpriteImage> {
        self.images.get(name).filter(|img| img.is_loaded())
    }

    pub fn is_ready(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn has_failed(&self, name: &str) -> bool {
        self.failed.iter().any(|n| n == name)
    }

    /// Number of ready images
    pub fn ready_count(&self) -> usize {
        self.images.values().filter(|img| img.is_loaded()).count()
    }
}

/// Player frame shown for an animation phase counter
pub fn player_frame_name(animation_phase: u32) -> &'static str {
    let idx = (animation_phase / crate::consts::ANIMATION_SPEED) as usize % PLAYER_FRAMES.len();
    PLAYER_FRAMES[idx]
}
