//! Host scene model
//!
//! Objects are addressed by [`ObjectId`] and never removed, so handles stay
//! valid for the lifetime of the scene. Names are unique across the scene.

use crate::error::{LightmapError, Result};
use crate::mesh::Mesh;
use crate::naming::{dedup_name, mapped_name};
use crate::texture::store::ImageStore;

/// Handle to an object in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

/// Scene-wide interaction mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractionMode {
    #[default]
    Object,
    Edit,
}

/// Data block carried by an object
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectData {
    Mesh(Mesh),
    /// Transform-only object (empty, light, camera)
    Empty,
}

/// Animation bound to an object
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationLink {
    pub action: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub data: ObjectData,
    pub selected: bool,
    pub hidden: bool,
    pub animation: Option<AnimationLink>,
    /// Base material assigned by the material converter
    pub material: Option<String>,
}

impl SceneObject {
    /// Selected, visible mesh object
    pub fn mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            data: ObjectData::Mesh(mesh),
            selected: true,
            hidden: false,
            animation: None,
            material: None,
        }
    }

    /// Selected, visible object without geometry
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: ObjectData::Empty,
            selected: true,
            hidden: false,
            animation: None,
            material: None,
        }
    }

    pub fn mesh_data(&self) -> Option<&Mesh> {
        match &self.data {
            ObjectData::Mesh(mesh) => Some(mesh),
            ObjectData::Empty => None,
        }
    }

    pub fn mesh_data_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.data {
            ObjectData::Mesh(mesh) => Some(mesh),
            ObjectData::Empty => None,
        }
    }
}

/// Objects, images and mode of one editing session
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    pub images: ImageStore,
    pub mode: InteractionMode,
    active: Option<ObjectId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link an object into the scene. A taken name gets a `.001`-style suffix.
    pub fn add_object(&mut self, mut object: SceneObject) -> ObjectId {
        object.name = dedup_name(&object.name, |n| self.name_exists(n));
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    pub fn name_exists(&self, name: &str) -> bool {
        self.objects.iter().any(|o| o.name == name)
    }

    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .position(|o| o.name == name)
            .map(|i| ObjectId(i as u32))
    }

    pub fn object(&self, id: ObjectId) -> Result<&SceneObject> {
        self.objects
            .get(id.0 as usize)
            .ok_or(LightmapError::MissingObject(id))
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject> {
        self.objects
            .get_mut(id.0 as usize)
            .ok_or(LightmapError::MissingObject(id))
    }

    /// Iterate over all objects in link order
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, o)| (ObjectId(i as u32), o))
    }

    /// Selected objects carrying mesh data, in link order
    pub fn selected_meshes(&self) -> Vec<ObjectId> {
        self.objects()
            .filter(|(_, o)| o.selected && matches!(o.data, ObjectData::Mesh(_)))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn active(&self) -> Option<ObjectId> {
        self.active
    }

    pub fn set_active(&mut self, id: ObjectId) -> Result<()> {
        self.object(id)?;
        self.active = Some(id);
        Ok(())
    }

    /// Deep-copy an object for lightmap mapping
    ///
    /// The copy drops animation, is named `<base>_mapped` (or
    /// `<base>_mapped_N`) and is selected; the original is hidden.
    pub fn duplicate_for_mapping(&mut self, id: ObjectId) -> Result<ObjectId> {
        let original = self.object(id)?;
        let name = mapped_name(&original.name, |n| self.name_exists(n));

        let mut copy = original.clone();
        copy.name = name;
        copy.animation = None;
        copy.selected = true;
        copy.hidden = false;

        let copy_id = self.add_object(copy);
        self.object_mut(id)?.hidden = true;

        tracing::debug!(
            "Duplicated '{}' as '{}'",
            self.object(id)?.name,
            self.object(copy_id)?.name
        );
        Ok(copy_id)
    }
}
