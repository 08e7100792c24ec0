use std::collections::HashMap;

/// Uploaded textures keyed by the id the runtime chose in `LOAD_TEXTURE`.
#[derive(Debug)]
pub struct TextureTable<T> {
    entries: HashMap<i32, TextureEntry<T>>,
}

#[derive(Debug)]
pub struct TextureEntry<T> {
    pub width: u32,
    pub height: u32,
    pub handle: T,
}

impl<T> Default for TextureTable<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> TextureTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a texture, returning the one it replaced.
    pub fn insert(&mut self, id: i32, width: u32, height: u32, handle: T) -> Option<TextureEntry<T>> {
        self.entries.insert(id, TextureEntry { width, height, handle })
    }

    #[inline]
    pub fn get(&self, id: i32) -> Option<&TextureEntry<T>> {
        self.entries.get(&id)
    }

    #[inline]
    pub fn contains(&self, id: i32) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn remove(&mut self, id: i32) -> Option<TextureEntry<T>> {
        self.entries.remove(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
