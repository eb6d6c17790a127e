use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::errors::Result;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub struct ImageInner {
    pub id: u64,
    pub uuid: Uuid,
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows
    pub data: Vec<u8>,
}

/// Decoded RGBA8 pixels, cheap to clone.
///
/// Equality and hashing go by id, so two images with the same pixels are
/// still distinct GPU textures.
#[derive(Debug, Clone)]
pub struct Image(Arc<ImageInner>);

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}
impl Eq for Image {}
impl std::hash::Hash for Image {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl Image {
    /// Wraps raw RGBA8 data. `data` must hold `width * height * 4` bytes.
    #[must_use]
    pub fn from_rgba8(label: &str, width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height * 4) as usize);
        Self(Arc::new(ImageInner {
            id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
            uuid: Uuid::new_v4(),
            label: label.to_string(),
            width,
            height,
            data,
        }))
    }

    /// Decodes an encoded PNG/JPEG/WebP file into RGBA8.
    pub fn decode(label: &str, bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba8(label, width, height, img.into_raw()))
    }

    /// 1x1 image of a single color, used as the fallback texture.
    #[must_use]
    pub fn solid(label: &str, rgba: [u8; 4]) -> Self {
        Self::from_rgba8(label, 1, 1, rgba.to_vec())
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0.uuid
    }
    #[must_use]
    pub fn label(&self) -> &str {
        &self.0.label
    }
    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.width
    }
    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.height
    }
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.0.data
    }
}
