//! Joint hierarchy and world transform evaluation

mod evaluator;
mod joint;

pub use evaluator::{
    EvaluationOptions, HierarchyPolicy, WorldTransformTable, evaluate_world_transforms,
    local_poses,
};
pub use joint::{Joint, JointId, Skeleton};
