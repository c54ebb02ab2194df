//! Scene-owned image namespace
//!
//! Images are addressed by [`ImageId`] handles and carry a unique name.
//! Other owners (materials, exported objects) register as users of an image;
//! removing an image first detaches all of them.
//!
//! Replacing an image by name goes through an [`EvictionPolicy`], which decides
//! what "same image" means and reports what was thrown away.

use hashbrown::HashMap;

use super::LinearImage;
use crate::error::{LightmapError, Result};
use crate::naming::dedup_name;

/// Handle to an image in an [`ImageStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(u32);

/// An image owned by the store
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub name: String,
    pub image: LinearImage,
    /// Object the image was derived from, if any
    pub source: Option<String>,
    users: Vec<String>,
    packed: Option<Vec<u8>>,
}

impl StoredImage {
    /// Owners currently referencing this image
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// True once the pixels are embedded as PNG bytes
    pub fn is_packed(&self) -> bool {
        self.packed.is_some()
    }

    /// Embedded PNG bytes, if packed
    pub fn packed_data(&self) -> Option<&[u8]> {
        self.packed.as_deref()
    }
}

/// Record of an image removed to make room for a replacement
#[derive(Debug, Clone, PartialEq)]
pub struct EvictedImage {
    pub id: ImageId,
    pub name: String,
    pub source: Option<String>,
    /// Owners that referenced the removed image. They now hold a dangling
    /// handle and are not fixed up.
    pub detached_users: Vec<String>,
}

/// Lookup-and-evict step run before a named image is inserted
pub trait EvictionPolicy {
    /// Remove whatever `name` should replace and report it
    fn evict(&mut self, store: &mut ImageStore, name: &str) -> Option<EvictedImage>;
}

/// Last writer wins: the image with the same name is detached and removed,
/// regardless of which object it was derived from
#[derive(Debug, Clone, Copy, Default)]
pub struct EvictByName;

impl EvictionPolicy for EvictByName {
    fn evict(&mut self, store: &mut ImageStore, name: &str) -> Option<EvictedImage> {
        let id = store.find(name)?;
        let detached_users = store.user_clear(id);
        let removed = store.remove(id)?;
        Some(EvictedImage {
            id,
            name: removed.name,
            source: removed.source,
            detached_users,
        })
    }
}

/// Named image namespace
#[derive(Debug, Default)]
pub struct ImageStore {
    images: HashMap<ImageId, StoredImage>,
    by_name: HashMap<String, ImageId>,
    next_id: u32,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an image. A taken name gets a `.001`-style suffix.
    pub fn insert(&mut self, name: &str, image: LinearImage) -> ImageId {
        self.insert_with_source(name, image, None)
    }

    /// Insert an image derived from the named object
    pub fn insert_with_source(
        &mut self,
        name: &str,
        image: LinearImage,
        source: Option<String>,
    ) -> ImageId {
        let name = dedup_name(name, |n| self.by_name.contains_key(n));
        let id = ImageId(self.next_id);
        self.next_id += 1;
        self.by_name.insert(name.clone(), id);
        self.images.insert(
            id,
            StoredImage {
                name,
                image,
                source,
                users: Vec::new(),
                packed: None,
            },
        );
        id
    }

    /// Evict through `policy`, then insert under exactly `name`
    pub fn replace(
        &mut self,
        name: &str,
        image: LinearImage,
        source: Option<String>,
        policy: &mut dyn EvictionPolicy,
    ) -> (ImageId, Option<EvictedImage>) {
        let evicted = policy.evict(self, name);
        if let Some(old) = &evicted {
            tracing::debug!(
                "Removed image '{}' ({} users detached)",
                old.name,
                old.detached_users.len()
            );
        }
        let id = self.insert_with_source(name, image, source);
        (id, evicted)
    }

    pub fn get(&self, id: ImageId) -> Option<&StoredImage> {
        self.images.get(&id)
    }

    pub fn get_mut(&mut self, id: ImageId) -> Option<&mut StoredImage> {
        self.images.get_mut(&id)
    }

    /// Image pixels, or [`LightmapError::MissingImage`]
    pub fn image(&self, id: ImageId) -> Result<&LinearImage> {
        self.get(id)
            .map(|stored| &stored.image)
            .ok_or(LightmapError::MissingImage(id))
    }

    pub fn find(&self, name: &str) -> Option<ImageId> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, id: ImageId) -> bool {
        self.images.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Remove an image. Users are not consulted; call [`Self::user_clear`] first.
    pub fn remove(&mut self, id: ImageId) -> Option<StoredImage> {
        let removed = self.images.remove(&id)?;
        self.by_name.remove(&removed.name);
        Some(removed)
    }

    /// Register `owner` as a user of the image
    pub fn add_user(&mut self, id: ImageId, owner: &str) -> Result<()> {
        let stored = self.get_mut(id).ok_or(LightmapError::MissingImage(id))?;
        if !stored.users.iter().any(|u| u == owner) {
            stored.users.push(owner.to_string());
        }
        Ok(())
    }

    /// Detach every user and return who they were
    pub fn user_clear(&mut self, id: ImageId) -> Vec<String> {
        self.get_mut(id)
            .map(|stored| std::mem::take(&mut stored.users))
            .unwrap_or_default()
    }

    /// Embed the current pixels as PNG bytes so the image survives without
    /// its source file
    pub fn pack(&mut self, id: ImageId) -> Result<()> {
        let stored = self.get_mut(id).ok_or(LightmapError::MissingImage(id))?;
        let bytes = stored.image.encode_png()?;
        tracing::debug!("Packed image '{}' ({} bytes)", stored.name, bytes.len());
        stored.packed = Some(bytes);
        Ok(())
    }

    /// Iterate over all images in id order
    pub fn iter(&self) -> impl Iterator<Item = (ImageId, &StoredImage)> {
        let mut ids: Vec<ImageId> = self.images.keys().copied().collect();
        ids.sort();
        ids.into_iter().filter_map(move |id| self.get(id).map(|s| (id, s)))
    }
}
