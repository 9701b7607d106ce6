use std::collections::HashMap;
use std::path::{Path, PathBuf};

use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use group_core::ItemRecord;
use group_core::icon_cache::IconCacheService;
use tokio::runtime::Handle;

/// GPU textures for item icons, resolved through the on-disk icon cache.
/// A `None` entry remembers that an item has no icon so extraction is not
/// retried every frame. New cache entries are saved on the runtime as soon
/// as they are extracted.
pub struct IconTextures {
    cache: IconCacheService,
    textures: HashMap<PathBuf, Option<TextureHandle>>,
    runtime: Handle,
}

impl IconTextures {
    pub fn new(cache: IconCacheService, runtime: Handle) -> Self {
        Self {
            cache,
            textures: HashMap::new(),
            runtime,
        }
    }

    pub fn get(&mut self, ctx: &egui::Context, item: &ItemRecord) -> Option<TextureHandle> {
        let key = item.icon_override.clone().unwrap_or_else(|| item.file_path.clone());
        if let Some(texture) = self.textures.get(&key) {
            return texture.clone();
        }

        let image_path = match &item.icon_override {
            Some(path) => Some(path.clone()),
            None => self.cache.icon_path(&item.file_path),
        };
        if self.cache.is_dirty() {
            self.cache.flush_in_background(&self.runtime);
        }
        let texture = image_path.and_then(|p| load_texture(ctx, &p));
        self.textures.insert(key, texture.clone());
        texture
    }

    /// Drops resolved textures so edited items pick up new icons.
    pub fn invalidate(&mut self) {
        self.textures.clear();
    }
}

fn load_texture(ctx: &egui::Context, path: &Path) -> Option<TextureHandle> {
    let img = match image::open(path) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "icon image unreadable");
            return None;
        }
    };
    let size = [img.width() as usize, img.height() as usize];
    let color = ColorImage::from_rgba_unmultiplied(size, img.as_raw());
    Some(ctx.load_texture(path.display().to_string(), color, TextureOptions::LINEAR))
}
