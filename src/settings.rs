//! Player preferences
//!
//! Persisted separately from the leaderboard in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, KeyValueStore, PersistError};

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Alpha-accurate collisions (rectangles only when off)
    pub pixel_perfect: bool,
    /// Name last used for a leaderboard submission
    pub player_name: String,

    // === HUD ===
    /// Show the difficulty level next to the score
    pub show_level: bool,

    // === Visual ===
    /// Scroll the city background
    pub background_scroll: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pixel_perfect: true,
            player_name: String::new(),
            show_level: true,
            background_scroll: true,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "bike_dash_settings";

    /// Load settings, defaulting when nothing valid is stored
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match persistence::load_json(store, Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings");
                settings
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), PersistError> {
        persistence::save_json(store, Self::STORAGE_KEY, self)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Remember the submitted name, trimmed
    pub fn remember_name(&mut self, name: &str) {
        self.player_name = name.trim().to_string();
    }
}
