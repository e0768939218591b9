use eframe::egui::{Vec2, vec2};

use super::{PhysicsConfig, RenderGraph};

pub(super) fn step_physics(cache: &mut RenderGraph, config: PhysicsConfig) -> bool {
    let node_count = cache.nodes.len();
    if node_count < 2 {
        return false;
    }

    let forces = &mut cache.physics_scratch.forces;
    forces.clear();
    forces.resize(node_count, Vec2::ZERO);

    let intensity = config.intensity.clamp(0.2, 2.5);
    let repulsion_strength = 52_000.0 * intensity * config.repulsion_scale.clamp(0.25, 2.6);
    let spring_strength = 0.018 * intensity * config.spring_scale.clamp(0.2, 2.2);
    let spring_damping = 0.22;
    let softening = 620.0;
    let center_pull = 0.0014 * intensity;
    let origin_pull = 0.036 * intensity;
    let damping = (config.velocity_damping - (intensity * 0.015)).clamp(0.78, 0.97);
    let time_step_scale = (config.delta_seconds * 60.0).clamp(0.25, 3.0);
    let damping_factor = damping.powf(time_step_scale);
    let origin_index = cache.origin_index.filter(|&index| index < node_count);

    for i in 0..node_count {
        for j in (i + 1)..node_count {
            let delta = cache.nodes[i].world_pos - cache.nodes[j].world_pos;
            let distance_sq = delta.length_sq();
            let distance = distance_sq.sqrt();
            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                let angle = ((i as f32) * 0.618_034 + (j as f32) * 0.414_214) * std::f32::consts::TAU;
                vec2(angle.cos(), angle.sin())
            };

            let push = direction * (repulsion_strength / (distance_sq + softening));
            forces[i] += push;
            forces[j] -= push;

            let min_distance = (cache.nodes[i].base_radius + cache.nodes[j].base_radius) * 2.6;
            if distance < min_distance {
                let overlap = direction * ((min_distance - distance) * 1.6 * intensity);
                forces[i] += overlap;
                forces[j] -= overlap;
            }
        }
    }

    for edge in &cache.edges {
        let (from, to) = (edge.source, edge.target);
        if from >= node_count || to >= node_count || from == to {
            continue;
        }

        let delta = cache.nodes[from].world_pos - cache.nodes[to].world_pos;
        let distance_sq = delta.length_sq();
        if distance_sq <= 0.0001 * 0.0001 {
            continue;
        }
        let distance = distance_sq.sqrt();
        let direction = delta / distance;

        // Heavier links (route hops) pull tighter and shorter.
        let weight_scale = (edge.weight.max(1) as f32).sqrt();
        let preferred = (150.0 / weight_scale.sqrt())
            + (cache.nodes[from].base_radius + cache.nodes[to].base_radius) * 2.0;
        let spring = (distance - preferred) * spring_strength * weight_scale.min(3.0);
        let relative_velocity = cache.nodes[from].velocity - cache.nodes[to].velocity;
        let damping_force = relative_velocity.dot(direction) * spring_damping;
        let correction = direction * (spring + damping_force);

        forces[from] -= correction;
        forces[to] += correction;
    }

    for (index, force) in forces.iter_mut().enumerate() {
        *force -= cache.nodes[index].world_pos * center_pull;
        if Some(index) == origin_index {
            *force -= cache.nodes[index].world_pos * origin_pull;
        }
    }

    let max_force = 165.0 + (intensity * 90.0);
    let max_speed = 11.0 + (intensity * 15.0);
    let min_sleep_speed_sq = 0.02 * 0.02;
    let min_sleep_force_sq = 0.08 * 0.08;
    let mut any_motion = false;

    for (node, force) in cache.nodes.iter_mut().zip(forces.iter()) {
        let mut force = *force;
        let force_sq = force.length_sq();
        if force_sq > max_force * max_force {
            force *= max_force / force_sq.sqrt();
        }

        let mut velocity = (node.velocity + (force * (0.055 * time_step_scale))) * damping_factor;
        let mut speed_sq = velocity.length_sq();
        if speed_sq > max_speed * max_speed {
            velocity *= max_speed / speed_sq.sqrt();
            speed_sq = max_speed * max_speed;
        }

        if speed_sq < min_sleep_speed_sq && force_sq < min_sleep_force_sq {
            velocity = Vec2::ZERO;
            speed_sq = 0.0;
        }

        node.velocity = velocity;
        node.world_pos += velocity * time_step_scale;
        if speed_sq > 0.000_001 {
            any_motion = true;
        }
    }

    if origin_index.is_none() {
        let mut centroid = Vec2::ZERO;
        for node in &cache.nodes {
            centroid += node.world_pos;
        }
        centroid /= node_count as f32;
        for node in &mut cache.nodes {
            node.world_pos -= centroid;
        }
    }

    any_motion
}
