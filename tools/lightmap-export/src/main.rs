//! lightmap-export - lightmap conversion tool
//!
//! Combines lightmap and ambient-occlusion bakes into a gamma-encoded texture
//! and encodes lightmap UVs into vertex colors (.lmmesh, .lmtex)

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lightmap_export::formats::LIGHTMAP_MESH_EXT;
use lightmap_export::{combine, manifest, mesh, ClampPolicy, SmartProject};

#[derive(Parser)]
#[command(name = "lightmap-export")]
#[command(about = "Lightmap conversion tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every mesh in a manifest file
    Build {
        /// Path to lightmap.toml manifest
        #[arg(default_value = "lightmap.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest without building
    Check {
        /// Path to lightmap.toml manifest
        #[arg(default_value = "lightmap.toml")]
        manifest: PathBuf,
    },

    /// Combine a lightmap with an optional AO bake
    Combine {
        /// Lightmap image (PNG/JPG)
        lightmap: PathBuf,

        /// Ambient occlusion image
        #[arg(long)]
        ao: Option<PathBuf>,

        /// Ambient occlusion strength
        #[arg(short, long, default_value_t = 0.75)]
        strength: f32,

        /// Clamp blended values into [0, 1] before gamma encoding
        #[arg(long)]
        clamp: bool,

        /// Output file (.png or .lmtex)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Encode lightmap UVs of a single mesh file into vertex colors
    Encode {
        /// Input mesh file (glTF/GLB/OBJ)
        input: PathBuf,

        /// Output .lmmesh file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building lightmap outputs from {:?}", manifest);
            }
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            let written = manifest::build_all(&config, output.as_deref())?;
            if verbose {
                for path in &written {
                    tracing::info!("  wrote {:?}", path);
                }
            }
            tracing::info!("Build complete!");
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Combine {
            lightmap,
            ao,
            strength,
            clamp,
            output,
        } => {
            let clamp = if clamp {
                ClampPolicy::Unit
            } else {
                ClampPolicy::None
            };
            tracing::info!("Combining {:?} -> {:?}", lightmap, output);
            combine::combine_files(&lightmap, ao.as_deref(), strength, clamp, &output)?;
            tracing::info!("Done!");
        }

        Commands::Encode { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension(LIGHTMAP_MESH_EXT));
            tracing::info!("Encoding {:?} -> {:?}", input, output);
            mesh::encode_mesh_file(&input, &output, &SmartProject::default())?;
            tracing::info!("Done!");
        }
    }

    Ok(())
}
