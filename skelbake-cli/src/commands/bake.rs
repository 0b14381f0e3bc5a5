//! `skelbake bake`: deform meshes into a pose and write OBJ

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use console::style;
use log::info;
use skelbake::{
    AnimationSelector, BakeOptions, EvaluationOptions, HierarchyPolicy, KeyBoundary,
    MeshSelector, ObjWriter, SkinningMode, load_gltf,
};

use crate::utils::{format_bytes, format_progress};

#[derive(Args, Debug)]
pub struct BakeArgs {
    /// Input scene (.gltf or .glb)
    pub input: PathBuf,

    /// Output OBJ file [default: <input stem>.baked.obj]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Sample time in seconds
    #[arg(
        short,
        long,
        default_value_t = 0.0,
        env = "SKELBAKE_TIME",
        allow_negative_numbers = true
    )]
    pub time: f64,

    /// Animation to sample, by name
    #[arg(long, conflicts_with = "animation_index")]
    pub animation: Option<String>,

    /// Animation to sample, by position in the file
    #[arg(long)]
    pub animation_index: Option<usize>,

    /// Mesh to bake, by position in the file
    #[arg(long, conflicts_with = "all_meshes")]
    pub mesh: Option<usize>,

    /// Bake every mesh into one OBJ
    #[arg(long)]
    pub all_meshes: bool,

    /// How joint poses are combined down the hierarchy
    #[arg(long, value_enum, default_value_t)]
    pub policy: PolicyArg,

    /// How bone influences are combined per vertex
    #[arg(long, value_enum, default_value_t)]
    pub skinning: SkinningArg,

    /// Key lookup outside the animated time range
    #[arg(long, value_enum, default_value_t)]
    pub boundary: BoundaryArg,

    /// Move unskinned meshes with their scene node
    #[arg(long)]
    pub rigid: bool,

    /// Write vertex normals
    #[arg(long)]
    pub normals: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PolicyArg {
    #[default]
    Accumulating,
    SingleLevel,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SkinningArg {
    #[default]
    Weighted,
    Sequential,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundaryArg {
    #[default]
    Wrap,
    Clamp,
}

impl From<PolicyArg> for HierarchyPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Accumulating => Self::Accumulating,
            PolicyArg::SingleLevel => Self::SingleLevel,
        }
    }
}

impl From<SkinningArg> for SkinningMode {
    fn from(value: SkinningArg) -> Self {
        match value {
            SkinningArg::Weighted => Self::Weighted,
            SkinningArg::Sequential => Self::SequentialProduct,
        }
    }
}

impl From<BoundaryArg> for KeyBoundary {
    fn from(value: BoundaryArg) -> Self {
        match value {
            BoundaryArg::Wrap => Self::Wrap,
            BoundaryArg::Clamp => Self::Clamp,
        }
    }
}

impl BakeArgs {
    pub fn animation_selector(&self) -> AnimationSelector {
        match (&self.animation, self.animation_index) {
            (Some(name), _) => AnimationSelector::ByName(name.clone()),
            (None, Some(index)) => AnimationSelector::ByIndex(index),
            (None, None) => AnimationSelector::First,
        }
    }

    pub fn mesh_selector(&self) -> MeshSelector {
        match (self.all_meshes, self.mesh) {
            (true, _) => MeshSelector::All,
            (false, Some(index)) => MeshSelector::Index(index),
            (false, None) => MeshSelector::First,
        }
    }

    pub fn options(&self) -> BakeOptions {
        BakeOptions {
            evaluation: EvaluationOptions {
                policy: self.policy.into(),
                boundary: self.boundary.into(),
            },
            skinning: self.skinning.into(),
            rigid_meshes: self.rigid,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output(&self.input))
    }
}

/// `model.gltf` becomes `model.baked.obj` in the same directory
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension("baked.obj")
}

pub fn execute(args: &BakeArgs) -> Result<()> {
    if !args.time.is_finite() {
        bail!("Sample time must be finite, got {}", args.time);
    }

    let scene = load_gltf(&args.input)
        .with_context(|| format!("Failed to load scene: {}", args.input.display()))?;

    let selector = args.animation_selector();
    let animation = scene
        .select_animation(&selector)
        .context("Failed to select animation")?;
    let ticks = match animation {
        Some(animation) => {
            info!(
                "Sampling animation '{}' at {}",
                animation.name,
                format_progress(args.time, animation.duration_seconds())
            );
            animation.seconds_to_ticks(args.time)
        }
        None => {
            info!("No animation selected, baking the rest pose");
            args.time
        }
    };

    let baked = scene
        .bake(&selector, args.mesh_selector(), ticks, args.options())
        .context("Failed to bake pose")?;

    let output = args.output_path();
    let file = File::create(&output)
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;
    let mut writer = ObjWriter::new(BufWriter::new(file)).with_normals(args.normals);
    let reports = writer
        .write_meshes(&baked)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    writer
        .into_inner()
        .with_context(|| format!("Failed to flush {}", output.display()))?;

    for warning in reports.iter().filter_map(|report| report.warning.as_ref()) {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }

    let vertices: usize = baked.iter().map(|mesh| mesh.vertex_count()).sum();
    let deformed: usize = baked.iter().map(|mesh| mesh.deformed_vertices).sum();
    let faces: usize = reports.iter().map(|report| report.faces).sum();
    let size = fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
    println!(
        "Baked {} mesh(es) at t={}: {} vertices ({} deformed), {} faces -> {} ({})",
        baked.len(),
        args.time,
        vertices,
        deformed,
        faces,
        output.display(),
        format_bytes(size)
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse(args: &[&str]) -> BakeArgs {
        let argv = ["skelbake", "bake"].iter().chain(args).copied();
        match Cli::parse_from(argv).command {
            Commands::Bake(args) => args,
            _ => unreachable!("bake subcommand expected"),
        }
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["model.gltf"]);
        assert_eq!(args.animation_selector(), AnimationSelector::First);
        assert_eq!(args.mesh_selector(), MeshSelector::First);
        assert_eq!(args.options(), BakeOptions::default());
        assert_eq!(args.output_path(), PathBuf::from("model.baked.obj"));
    }

    #[test]
    fn test_selectors_and_modes() {
        let args = parse(&[
            "dir/rig.glb",
            "--animation",
            "Walk",
            "--all-meshes",
            "--policy",
            "single-level",
            "--skinning",
            "sequential",
            "--boundary",
            "clamp",
            "--rigid",
            "-t",
            "-1.5",
        ]);
        assert_eq!(
            args.animation_selector(),
            AnimationSelector::ByName("Walk".into())
        );
        assert_eq!(args.mesh_selector(), MeshSelector::All);
        assert_eq!(args.time, -1.5);

        let options = args.options();
        assert_eq!(options.evaluation.policy, HierarchyPolicy::SingleLevel);
        assert_eq!(options.evaluation.boundary, KeyBoundary::Clamp);
        assert_eq!(options.skinning, SkinningMode::SequentialProduct);
        assert!(options.rigid_meshes);
        assert_eq!(args.output_path(), PathBuf::from("dir/rig.baked.obj"));
    }

    #[test]
    fn test_conflicting_animation_flags() {
        let result = Cli::try_parse_from([
            "skelbake",
            "bake",
            "a.gltf",
            "--animation",
            "Walk",
            "--animation-index",
            "1",
        ]);
        assert!(result.is_err());
    }
}
