//! Tree rendering for joint hierarchies

use console::Style;
use skelbake::Scene;

/// A node in a rendered tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Vec<TreeNode>,
    /// Key/value lines shown under the node, in insertion order
    pub metadata: Vec<(String, String)>,
}

/// Types of nodes in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Scene,
    Joint,
    /// A joint driven by the selected animation
    AnimatedJoint,
    Mesh,
}

/// Options for tree rendering
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub no_color: bool,
    pub show_metadata: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            no_color: false,
            show_metadata: true,
        }
    }
}

impl TreeNode {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: Vec::new(),
            metadata: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }
}

impl NodeType {
    /// Marker drawn before the node name
    pub fn icon(self) -> &'static str {
        match self {
            Self::Scene => "📁",
            Self::Joint => "🦴",
            Self::AnimatedJoint => "🎞️",
            Self::Mesh => "🔺",
        }
    }

    pub fn style(self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self {
                Self::Scene => Style::new().bold().cyan(),
                Self::Joint => Style::new().white(),
                Self::AnimatedJoint => Style::new().yellow(),
                Self::Mesh => Style::new().green(),
            }
        }
    }
}

/// Build the joint tree of `scene`, with meshes hung under their nodes
///
/// Joints targeted by a channel of the first animation are marked as animated.
pub fn scene_tree(label: &str, scene: &Scene) -> TreeNode {
    let skeleton = &scene.skeleton;
    let animation = scene.first_animation();

    let mut nodes: Vec<Option<TreeNode>> = skeleton
        .joints()
        .iter()
        .map(|joint| {
            let animated = animation.is_some_and(|a| a.channel(&joint.name).is_some());
            let node_type = if animated {
                NodeType::AnimatedJoint
            } else {
                NodeType::Joint
            };
            Some(TreeNode::new(joint.name.clone(), node_type))
        })
        .collect();

    let mut loose = Vec::new();
    for mesh in &scene.meshes {
        let leaf = TreeNode::new(mesh.name.clone(), NodeType::Mesh)
            .with_metadata("vertices", mesh.vertex_count())
            .with_metadata("bones", mesh.bones.len());
        match mesh
            .node
            .and_then(|id| nodes.get_mut(id.index()))
            .and_then(Option::as_mut)
        {
            Some(owner) => owner.children.push(leaf),
            None => loose.push(leaf),
        }
    }

    // Descendants follow their ancestors in preorder, so attach in reverse
    for &id in skeleton.preorder().iter().rev() {
        let Some(parent) = skeleton.parent(id) else {
            continue;
        };
        if let Some(child) = nodes[id.index()].take()
            && let Some(parent_node) = nodes[parent.index()].as_mut()
        {
            parent_node.children.insert(0, child);
        }
    }

    let mut root = TreeNode::new(label, NodeType::Scene)
        .with_metadata("joints", skeleton.len())
        .with_metadata("animations", scene.animations.len());
    root.children.extend(
        skeleton
            .roots()
            .iter()
            .filter_map(|id| nodes[id.index()].take()),
    );
    root.children.extend(loose);
    root
}

/// Render a tree structure to string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

fn render_node(
    node: &TreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
) {
    if let Some(max_depth) = options.max_depth
        && depth > max_depth
    {
        return;
    }

    let style = node.node_type.style(options.no_color);
    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };

    output.push_str(&format!(
        "{}{}{} {}\n",
        prefix,
        connector,
        node.node_type.icon(),
        style.apply_to(&node.name)
    ));

    let child_prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}{}", prefix, if is_last { "    " } else { "│   " })
    };

    if options.show_metadata && !node.metadata.is_empty() {
        let meta_style = if options.no_color {
            Style::new()
        } else {
            Style::new().dim()
        };
        for (key, value) in &node.metadata {
            output.push_str(&format!(
                "{}    {}: {}\n",
                child_prefix,
                meta_style.apply_to(key),
                value
            ));
        }
    }

    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == node.children.len() - 1;
        render_node(
            child,
            output,
            &child_prefix,
            is_last_child,
            depth + 1,
            options,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skelbake::glam::{Mat4, Quat, Vec3};
    use skelbake::{Animation, AnimationChannel, Joint, JointId, Mesh, Skeleton};

    fn scene() -> Scene {
        let skeleton = Skeleton::new(vec![
            Joint::root("Hips", Mat4::IDENTITY),
            Joint::child("Spine", JointId(0), Mat4::IDENTITY),
            Joint::child("Head", JointId(1), Mat4::IDENTITY),
            Joint::child("Leg", JointId(0), Mat4::IDENTITY),
        ])
        .unwrap();
        let animation = Animation::from_channels(
            "Nod",
            vec![AnimationChannel::constant(
                "Head",
                Vec3::ZERO,
                Quat::IDENTITY,
                Vec3::ONE,
            )],
        );
        let mesh = Mesh::new("Body.0", vec![Vec3::ZERO]).with_node(JointId(1));
        Scene::new(skeleton, vec![animation], vec![mesh])
    }

    #[test]
    fn test_scene_tree_structure() {
        let tree = scene_tree("rig.gltf", &scene());

        assert_eq!(tree.children.len(), 1);
        let hips = &tree.children[0];
        assert_eq!(hips.name, "Hips");
        let names: Vec<&str> = hips.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Spine", "Leg"]);

        let spine = &hips.children[0];
        assert_eq!(spine.children.len(), 2);
        // Child joints first, then meshes owned by the joint
        assert_eq!(spine.children[0].node_type, NodeType::AnimatedJoint);
        assert_eq!(spine.children[1].node_type, NodeType::Mesh);
    }

    #[test]
    fn test_tree_rendering() {
        let options = TreeOptions {
            no_color: true,
            ..Default::default()
        };
        let output = render_tree(&scene_tree("rig.gltf", &scene()), &options);

        assert!(output.starts_with("📁 rig.gltf\n"));
        assert!(output.contains("├── 🦴 Spine"));
        assert!(output.contains("└── 🦴 Leg"));
        assert!(output.contains("vertices: 1"));
    }

    #[test]
    fn test_max_depth() {
        let options = TreeOptions {
            max_depth: Some(1),
            no_color: true,
            show_metadata: false,
        };
        let output = render_tree(&scene_tree("rig.gltf", &scene()), &options);

        assert!(output.contains("Hips"));
        assert!(!output.contains("Spine"));
    }
}
