//! Integration tests for lightmap-export
//!
//! Tests the CLI: generate test assets -> run command -> verify output


use lightmap_common::{
    decode_uv_rgba8, vertex_stride_packed, LightmapMeshHeader, LightmapTextureHeader,
    FORMAT_COLOR, FORMAT_UV,
};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn lightmap_export(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lightmap-export"))
        .args(args)
        .output()
        .expect("Failed to run lightmap-export")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// Test OBJ -> .lmmesh with an unwrapped lightmap channel
#[test]
fn test_encode_cube_obj() {
    let dir = tempdir().expect("Failed to create temp dir");
    let obj_path = dir.path().join("cube.obj");
    let mesh_path = dir.path().join("cube.lmmesh");
    generate_test_assets::generate_cube_obj(&obj_path).expect("Failed to generate OBJ");

    let out = lightmap_export(&["encode", path_arg(&obj_path), "-o", path_arg(&mesh_path)]);
    assert!(out.status.success(), "encode failed: {:?}", out);

    let data = std::fs::read(&mesh_path).expect("Failed to read mesh file");
    let header = LightmapMeshHeader::from_bytes(&data).expect("Failed to parse mesh header");
    assert_eq!(header.format, FORMAT_UV | FORMAT_COLOR);
    assert_eq!(header.vertex_count, 24, "one vertex per corner");
    assert_eq!(header.index_count, 36);

    let stride = vertex_stride_packed(header.format) as usize;
    assert_eq!(
        data.len(),
        LightmapMeshHeader::SIZE + 24 * stride + 36 * 2
    );

    // Every decoded lightmap UV lands in the unit square
    for v in 0..24 {
        let offset = LightmapMeshHeader::SIZE + v * stride + 12;
        let bytes = [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]];
        let [u, v] = decode_uv_rgba8(bytes);
        assert!((0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v));
    }
}

/// Default output path swaps the extension
#[test]
fn test_encode_default_output() {
    let dir = tempdir().expect("Failed to create temp dir");
    let obj_path = dir.path().join("crate.obj");
    generate_test_assets::generate_cube_obj(&obj_path).expect("Failed to generate OBJ");

    let out = lightmap_export(&["encode", path_arg(&obj_path)]);
    assert!(out.status.success());
    assert!(dir.path().join("crate.lmmesh").exists());
}

/// A mesh without UVs is refused with the precondition message
#[test]
fn test_encode_rejects_mesh_without_uvs() {
    let dir = tempdir().expect("Failed to create temp dir");
    let obj_path = dir.path().join("tri.obj");
    generate_test_assets::generate_bare_triangle_obj(&obj_path).unwrap();

    let out = lightmap_export(&["encode", path_arg(&obj_path)]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("No regular UV map."), "stderr: {}", stderr);
}

/// Combine without AO matches the gamma curve per channel
#[test]
fn test_combine_png() {
    let dir = tempdir().expect("Failed to create temp dir");
    let lm_path = dir.path().join("bake.png");
    let out_path = dir.path().join("combined.png");
    generate_test_assets::generate_two_pixel_lightmap(&lm_path);

    let out = lightmap_export(&["combine", path_arg(&lm_path), "-o", path_arg(&out_path)]);
    assert!(out.status.success(), "combine failed: {:?}", out);

    let img = image::open(&out_path).unwrap().to_rgba8();
    // 128/255 -> gamma ~0.7366 -> 188; 0 -> -0.055 clamps to 0 on export
    assert_eq!(img.get_pixel(0, 0).0, [188, 188, 188, 255]);
    assert_eq!(img.get_pixel(1, 0).0, [255, 0, 0, 255]);
}

/// Zero strength ignores the AO image entirely, even one of the wrong size
#[test]
fn test_combine_zero_strength_ignores_ao() {
    let dir = tempdir().expect("Failed to create temp dir");
    let lm_path = dir.path().join("bake.png");
    let ao_path = dir.path().join("ao.png");
    let out_path = dir.path().join("combined.lmtex");
    generate_test_assets::generate_two_pixel_lightmap(&lm_path);
    generate_test_assets::generate_solid_png(&ao_path, 8, 8, [0, 0, 0, 255]);

    let out = lightmap_export(&[
        "combine",
        path_arg(&lm_path),
        "--ao",
        path_arg(&ao_path),
        "--strength",
        "0",
        "-o",
        path_arg(&out_path),
    ]);
    assert!(out.status.success(), "combine failed: {:?}", out);

    let data = std::fs::read(&out_path).unwrap();
    let header = LightmapTextureHeader::from_bytes(&data).unwrap();
    assert_eq!((header.width, header.height), (2, 1));
    assert_eq!(data.len(), LightmapTextureHeader::SIZE + header.rgba8_size());
    assert_eq!(&data[4..8], &[188, 188, 188, 255]);
}

/// Mismatched AO with positive strength fails
#[test]
fn test_combine_rejects_mismatched_ao() {
    let dir = tempdir().expect("Failed to create temp dir");
    let lm_path = dir.path().join("bake.png");
    let ao_path = dir.path().join("ao.png");
    generate_test_assets::generate_two_pixel_lightmap(&lm_path);
    generate_test_assets::generate_solid_png(&ao_path, 8, 8, [0, 0, 0, 255]);

    let out = lightmap_export(&[
        "combine",
        path_arg(&lm_path),
        "--ao",
        path_arg(&ao_path),
        "-o",
        path_arg(&dir.path().join("out.png")),
    ]);
    assert!(!out.status.success());
}

/// Full manifest build
#[test]
fn test_build_manifest() {
    let dir = tempdir().expect("Failed to create temp dir");
    generate_test_assets::generate_solid_png(&dir.path().join("bake.png"), 4, 4, [200, 180, 160, 255]);
    generate_test_assets::generate_solid_png(&dir.path().join("ao.png"), 4, 4, [128, 128, 128, 255]);
    generate_test_assets::generate_cube_obj(&dir.path().join("crate.obj")).unwrap();
    generate_test_assets::generate_cube_obj(&dir.path().join("pillar.obj")).unwrap();

    let manifest = dir.path().join("lightmap.toml");
    std::fs::write(
        &manifest,
        r#"
[output]
dir = "build/"

[lightmap]
image = "bake.png"
ao = "ao.png"
fog = true

[meshes]
crate = "crate.obj"
pillar = { path = "pillar.obj", active = true }
"#,
    )
    .unwrap();

    let out = lightmap_export(&["check", path_arg(&manifest)]);
    assert!(out.status.success(), "check failed: {:?}", out);

    let out = lightmap_export(&["build", path_arg(&manifest)]);
    assert!(out.status.success(), "build failed: {:?}", out);

    let build = dir.path().join("build");
    assert!(build.join("lightmap_pillar.png").exists());
    assert!(build.join("lightmap_pillar.lmtex").exists());
    assert!(build.join("crate_mapped.lmmesh").exists());
    assert!(build.join("pillar_mapped.lmmesh").exists());

    let sidecar = std::fs::read_to_string(build.join("crate_mapped.material.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&sidecar).unwrap();
    assert_eq!(value["material"], "sm64_lightmap_fog_texture");
    assert_eq!(value["texture"], "lightmap_pillar.png");
}

/// Check fails when a referenced file is missing
#[test]
fn test_check_reports_missing_mesh() {
    let dir = tempdir().expect("Failed to create temp dir");
    generate_test_assets::generate_solid_png(&dir.path().join("bake.png"), 2, 2, [0, 0, 0, 255]);
    let manifest = dir.path().join("lightmap.toml");
    std::fs::write(
        &manifest,
        "[lightmap]\nimage = \"bake.png\"\n[meshes]\nfloor = \"floor.obj\"\n",
    )
    .unwrap();

    let out = lightmap_export(&["check", path_arg(&manifest)]);
    assert!(!out.status.success());
}
