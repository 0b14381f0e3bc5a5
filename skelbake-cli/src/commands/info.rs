//! `skelbake info`: summarize a scene file

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use skelbake::{Scene, load_gltf};

use crate::utils::{
    TreeOptions, add_table_row, create_table, format_bytes, format_seconds, render_tree,
    scene_tree,
};

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Input scene (.gltf or .glb)
    pub input: PathBuf,

    /// Maximum depth of the joint tree
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct SceneSummary {
    pub file: String,
    pub file_size: u64,
    pub joints: Vec<JointSummary>,
    pub animations: Vec<AnimationSummary>,
    pub meshes: Vec<MeshSummary>,
}

#[derive(Debug, Serialize)]
pub struct JointSummary {
    pub name: String,
    pub parent: Option<String>,
    pub depth: usize,
}

#[derive(Debug, Serialize)]
pub struct AnimationSummary {
    pub name: String,
    pub duration: f64,
    pub ticks_per_second: f64,
    pub channels: usize,
    pub keys: usize,
}

#[derive(Debug, Serialize)]
pub struct MeshSummary {
    pub name: String,
    pub vertices: usize,
    pub faces: usize,
    pub bones: usize,
    pub normals: bool,
    pub node: Option<String>,
}

impl SceneSummary {
    pub fn new(file: String, file_size: u64, scene: &Scene) -> Self {
        let skeleton = &scene.skeleton;
        let joint_name = |id: skelbake::JointId| skeleton.joint(id).map(|j| j.name.clone());

        let joints = skeleton
            .preorder()
            .iter()
            .filter_map(|&id| {
                let joint = skeleton.joint(id)?;
                Some(JointSummary {
                    name: joint.name.clone(),
                    parent: joint.parent.and_then(joint_name),
                    depth: skeleton.depth(id),
                })
            })
            .collect();

        let animations = scene
            .animations
            .iter()
            .map(|animation| AnimationSummary {
                name: animation.name.clone(),
                duration: animation.duration,
                ticks_per_second: animation.ticks_per_second,
                channels: animation.channels().len(),
                keys: animation.channels().iter().map(|c| c.key_count()).sum(),
            })
            .collect();

        let meshes = scene
            .meshes
            .iter()
            .map(|mesh| MeshSummary {
                name: mesh.name.clone(),
                vertices: mesh.vertex_count(),
                faces: mesh.faces.len(),
                bones: mesh.bones.len(),
                normals: mesh.normals.is_some(),
                node: mesh.node.and_then(joint_name),
            })
            .collect();

        Self {
            file,
            file_size,
            joints,
            animations,
            meshes,
        }
    }
}

pub fn execute(args: &InfoArgs) -> Result<()> {
    let scene = load_gltf(&args.input)
        .with_context(|| format!("Failed to load scene: {}", args.input.display()))?;
    let file_size = fs::metadata(&args.input).map(|m| m.len()).unwrap_or(0);
    let file = args.input.display().to_string();

    if args.json {
        let summary = SceneSummary::new(file, file_size, &scene);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("=== Scene Information ===");
    println!("File: {file}");
    println!("Size: {}", format_bytes(file_size));
    println!();

    let label = args
        .input
        .file_name()
        .map_or_else(|| file.clone(), |name| name.to_string_lossy().into_owned());
    let options = TreeOptions {
        max_depth: args.depth,
        no_color: args.no_color,
        ..Default::default()
    };
    print!("{}", render_tree(&scene_tree(&label, &scene), &options));

    if !scene.animations.is_empty() {
        println!("\n=== Animations ===");
        let mut table = create_table(&["#", "Name", "Duration", "Ticks/s", "Channels", "Keys"]);
        for (i, animation) in scene.animations.iter().enumerate() {
            let keys: usize = animation.channels().iter().map(|c| c.key_count()).sum();
            add_table_row(
                &mut table,
                vec![
                    i.to_string(),
                    animation.name.clone(),
                    format_seconds(animation.duration_seconds()),
                    animation.ticks_per_second.to_string(),
                    animation.channels().len().to_string(),
                    keys.to_string(),
                ],
            );
        }
        table.printstd();
    }

    if !scene.meshes.is_empty() {
        println!("\n=== Meshes ===");
        let mut table = create_table(&[
            "#", "Name", "Vertices", "Faces", "Bones", "Normals", "Node",
        ]);
        for (i, mesh) in scene.meshes.iter().enumerate() {
            let node = mesh
                .node
                .and_then(|id| scene.skeleton.joint(id))
                .map_or_else(|| "-".to_string(), |joint| joint.name.clone());
            add_table_row(
                &mut table,
                vec![
                    i.to_string(),
                    mesh.name.clone(),
                    mesh.vertex_count().to_string(),
                    mesh.faces.len().to_string(),
                    mesh.bones.len().to_string(),
                    if mesh.normals.is_some() { "yes" } else { "no" }.to_string(),
                    node,
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}
