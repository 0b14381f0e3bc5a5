//! Property tests for track lookup and skinning

use glam::{Mat4, Quat, Vec3};
use proptest::prelude::*;
use skelbake::animation::Interpolate;
use skelbake::{
    BakeOptions, Joint, JointId, KeyBoundary, Keyframe, KeyframeTrack, Mesh, MeshBone, Skeleton,
    VertexWeight, bake_pose,
};

fn finite_vec3() -> impl Strategy<Value = Vec3> {
    (-1000.0f32..1000.0, -1000.0f32..1000.0, -1000.0f32..1000.0)
        .prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn unit_quat() -> impl Strategy<Value = Quat> {
    (finite_vec3(), -10.0f32..10.0).prop_filter_map("degenerate axis", |(axis, angle)| {
        (axis.length() > 1e-3).then(|| Quat::from_axis_angle(axis.normalize(), angle))
    })
}

proptest! {
    #[test]
    fn single_key_is_constant(value in finite_vec3(), time in -1.0e9f64..1.0e9) {
        let track = KeyframeTrack::new(vec![Keyframe::new(3.0, value)]).unwrap();
        prop_assert_eq!(track.value_at(time, KeyBoundary::Wrap).unwrap(), value);
        prop_assert_eq!(track.value_at(time, KeyBoundary::Clamp).unwrap(), value);
    }

    #[test]
    fn slerp_of_equal_rotations_is_identity_op(q in unit_quat(), t in 0.0f32..=1.0) {
        let result = q.interpolate(&q, t);
        prop_assert!(result.abs_diff_eq(q, 1e-4) || result.abs_diff_eq(-q, 1e-4));
    }

    #[test]
    fn two_key_midpoint_is_mean(a in finite_vec3(), b in finite_vec3(), start in -100.0f64..100.0, span in 0.01f64..100.0) {
        let track = KeyframeTrack::new(vec![
            Keyframe::new(start, a),
            Keyframe::new(start + span, b),
        ])
        .unwrap();

        let mid = track.value_at(start + span / 2.0, KeyBoundary::Wrap).unwrap();
        prop_assert!((mid - (a + b) / 2.0).length() < 1e-2);
        prop_assert!((track.value_at(start, KeyBoundary::Wrap).unwrap() - a).length() < 1e-3);
    }

    #[test]
    fn unbound_vertices_are_untouched(
        positions in prop::collection::vec(finite_vec3(), 2..32),
        offset in finite_vec3(),
    ) {
        let skeleton = Skeleton::new(vec![
            Joint::root("Root", Mat4::from_translation(offset)),
            Joint::child("Leaf", JointId(0), Mat4::from_rotation_y(0.7)),
        ])
        .unwrap();
        // Only the first vertex is bound
        let mesh = Mesh::new("cloud", positions.clone()).with_bone(MeshBone::new(
            "Leaf",
            Mat4::IDENTITY,
            vec![VertexWeight::new(0, 1.0)],
        ));

        let baked = bake_pose(&mesh, &skeleton, None, 0.0, BakeOptions::default()).unwrap();
        for (before, after) in positions.iter().zip(&baked.positions).skip(1) {
            prop_assert_eq!(before.to_array().map(f32::to_bits), after.to_array().map(f32::to_bits));
        }
    }

    #[test]
    fn identity_bone_is_noop(p in finite_vec3(), weight in 0.01f32..10.0) {
        let skeleton = Skeleton::new(vec![Joint::root("Root", Mat4::IDENTITY)]).unwrap();
        let mesh = Mesh::new("m", vec![p]).with_bone(MeshBone::new(
            "Root",
            Mat4::IDENTITY,
            vec![VertexWeight::new(0, weight)],
        ));

        let baked = bake_pose(&mesh, &skeleton, None, 0.0, BakeOptions::default()).unwrap();
        prop_assert!((baked.positions[0] - p).length() <= p.length() * 1e-5 + 1e-5);
    }
}
