// ECS systems for the museum scene
// Plain functions over &mut World, called once per frame by the walkthrough

use bevy_ecs::prelude::*;
use glam::{Mat4, Vec3};

use super::components::*;
use crate::scene::{DrawableConfig, DrawableKind};

/// Spawn one entity per configured drawable. Slots follow config order.
pub fn spawn_drawables(world: &mut World, drawables: &[DrawableConfig]) {
    for (slot, config) in drawables.iter().enumerate() {
        let transform = Transform::from_position_scale(
            Vec3::from_array(config.position),
            Vec3::from_array(config.scale),
        );
        log::debug!("drawable {} = {:?} ({:?})", slot, config.name, config.kind);
        let mut entity = world.spawn((transform, Drawable { slot }));
        if let DrawableKind::Statue { spin_speed } = config.kind {
            entity.insert(Spin { speed: spin_speed });
        }
    }
    log::info!("Spawned {} drawables", drawables.len());
}

/// Set every spinning entity's yaw from the animation clock
pub fn spin_system(world: &mut World, clock: f32) {
    let mut query = world.query::<(&mut Transform, &Spin)>();
    for (mut transform, spin) in query.iter_mut(world) {
        transform.yaw = (clock * spin.speed) % std::f32::consts::TAU;
    }
}

/// Model matrix per drawable, ordered by slot
pub fn collect_models(world: &mut World) -> Vec<(usize, Mat4)> {
    let mut query = world.query::<(&Transform, &Drawable)>();
    let mut models: Vec<(usize, Mat4)> = query
        .iter(world)
        .map(|(transform, drawable)| (drawable.slot, transform.model_matrix()))
        .collect();
    models.sort_by_key(|(slot, _)| *slot);
    models
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configs() -> Vec<DrawableConfig> {
        vec![
            DrawableConfig {
                name: "floor".into(),
                position: [-4.5, 0.0, 2.5],
                scale: [9.0, 0.05, 5.0],
                kind: DrawableKind::Static,
            },
            DrawableConfig {
                name: "statue".into(),
                position: [-2.0, 0.5, 1.0],
                scale: [0.3, 1.0, 0.3],
                kind: DrawableKind::Statue { spin_speed: 1.0 },
            },
        ]
    }

    #[test]
    fn static_geometry_keeps_its_model() {
        let mut world = World::new();
        spawn_drawables(&mut world, &configs());
        spin_system(&mut world, 1.0);

        let models = collect_models(&mut world);
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].0, 0);
        let expected = Mat4::from_scale_rotation_translation(
            Vec3::new(9.0, 0.05, 5.0),
            glam::Quat::IDENTITY,
            Vec3::new(-4.5, 0.0, 2.5),
        );
        assert!(models[0].1.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn statues_follow_animation_clock() {
        let mut world = World::new();
        spawn_drawables(&mut world, &configs());
        spin_system(&mut world, 0.5);

        let mut query = world.query::<(&Transform, &Spin)>();
        let (transform, _) = query.single(&world);
        assert!((transform.yaw - 0.5).abs() < 1e-6);

        // Translation is untouched by the spin.
        let models = collect_models(&mut world);
        let origin = models[1].1.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(-2.0, 0.5, 1.0), 1e-6));
    }
}
