//! Manifest parsing and build orchestration
//!
//! Parses lightmap.toml, loads the bakes and meshes into a scene and runs the
//! lightmap operator with the file exporter as material converter.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::combine::{ClampPolicy, CombinedNaming, DEFAULT_AO_STRENGTH};
use crate::convert::{apply_lightmap, LightmapSettings, OperatorReport};
use crate::material::ExportConverter;
use crate::mesh::{load_meshes, SmartProject};
use crate::scene::{Scene, SceneObject};
use crate::texture::store::EvictByName;
use crate::texture::LinearImage;

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    pub lightmap: LightmapConfig,
    /// Keyed by object name; iteration is in name order
    #[serde(default)]
    pub meshes: BTreeMap<String, MeshEntry>,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("lightmap/")
}

#[derive(Debug, Deserialize)]
pub struct LightmapConfig {
    pub image: PathBuf,
    #[serde(default)]
    pub ao: Option<PathBuf>,
    #[serde(default = "default_ao_strength")]
    pub ao_strength: f32,
    #[serde(default)]
    pub fog: bool,
    #[serde(default)]
    pub replace_originals: bool,
    #[serde(default)]
    pub clamp: ClampPolicy,
    #[serde(default)]
    pub naming: CombinedNaming,
}

fn default_ao_strength() -> f32 {
    DEFAULT_AO_STRENGTH
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MeshEntry {
    Simple(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default)]
        active: bool,
    },
}

impl MeshEntry {
    pub fn path(&self) -> &Path {
        match self {
            MeshEntry::Simple(p) => p,
            MeshEntry::Detailed { path, .. } => path,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            MeshEntry::Simple(_) => false,
            MeshEntry::Detailed { active, .. } => *active,
        }
    }
}

impl Manifest {
    /// Resolve a manifest-relative path
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let mut manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
    manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(manifest)
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    let image = manifest.resolve(&manifest.lightmap.image);
    if !image.exists() {
        bail!("Lightmap image not found: {:?}", image);
    }
    if let Some(ao) = &manifest.lightmap.ao {
        let ao = manifest.resolve(ao);
        if !ao.exists() {
            bail!("Ambient occlusion image not found: {:?}", ao);
        }
    }
    if !manifest.lightmap.ao_strength.is_finite() {
        bail!(
            "Ambient occlusion strength must be finite, got {}",
            manifest.lightmap.ao_strength
        );
    }

    if manifest.meshes.is_empty() {
        bail!("No meshes listed in manifest");
    }
    for (name, entry) in &manifest.meshes {
        let path = manifest.resolve(entry.path());
        if !path.exists() {
            bail!("Mesh '{}' source not found: {:?}", name, path);
        }
    }
    let active = manifest.meshes.values().filter(|e| e.is_active()).count();
    if active > 1 {
        bail!("{} mesh entries are marked active, expected at most one", active);
    }
    Ok(())
}

/// Load bakes and meshes into a fresh scene
///
/// Every mesh is selected. A file holding several meshes yields one object
/// per mesh, named `<entry>_<mesh>`. The first object of the entry marked
/// active (else of the first entry) becomes the active object.
pub fn load_scene(manifest: &Manifest) -> Result<(Scene, LightmapSettings)> {
    let mut scene = Scene::new();

    let image_path = manifest.resolve(&manifest.lightmap.image);
    let image = LinearImage::open(&image_path)
        .with_context(|| format!("Failed to load lightmap image: {:?}", image_path))?;
    let lightmap = scene.images.insert(&image_stem(&image_path), image);

    let mut settings = LightmapSettings::new(lightmap);
    if let Some(ao) = &manifest.lightmap.ao {
        let ao_path = manifest.resolve(ao);
        let image = LinearImage::open(&ao_path)
            .with_context(|| format!("Failed to load ambient occlusion image: {:?}", ao_path))?;
        settings.ao = Some(scene.images.insert(&image_stem(&ao_path), image));
    }
    settings.ao_strength = manifest.lightmap.ao_strength;
    settings.fog = manifest.lightmap.fog;
    settings.replace_originals = manifest.lightmap.replace_originals;
    settings.clamp = manifest.lightmap.clamp;
    settings.naming = manifest.lightmap.naming;

    for (name, entry) in &manifest.meshes {
        let path = manifest.resolve(entry.path());
        tracing::info!("Loading mesh: {} <- {:?}", name, path);
        let meshes =
            load_meshes(&path).with_context(|| format!("Failed to load mesh '{}'", name))?;

        let single = meshes.len() == 1;
        for (i, mesh) in meshes.into_iter().enumerate() {
            let object_name = if single {
                name.clone()
            } else {
                format!("{}_{}", name, mesh.name)
            };
            let id = scene.add_object(SceneObject::mesh(object_name, mesh));
            if i == 0 && (entry.is_active() || scene.active().is_none()) {
                scene.set_active(id)?;
            }
        }
    }

    Ok((scene, settings))
}

fn image_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string()
}

/// Build all outputs from a manifest, returning the files written
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<Vec<PathBuf>> {
    let output_dir = match output_override {
        Some(dir) => dir.to_path_buf(),
        None => manifest.resolve(&manifest.output.dir),
    };

    let (mut scene, settings) = load_scene(manifest)?;
    let mut converter = ExportConverter::new(&output_dir);

    let report = apply_lightmap(
        &mut scene,
        &settings,
        &SmartProject::default(),
        &mut EvictByName,
        &mut converter,
    );
    match report {
        OperatorReport::Finished(conversion) => {
            tracing::info!(
                "Built {} object(s) with '{}' into {:?}",
                conversion.objects.len(),
                conversion.combined.name,
                output_dir
            );
            Ok(converter.written().to_vec())
        }
        OperatorReport::Cancelled { message } => bail!("{}", message),
    }
}
