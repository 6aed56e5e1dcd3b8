use approx::{assert_abs_diff_eq, assert_relative_eq};
use glam::{vec2, vec3, vec4, Mat4, Vec3, Vec4};
use lightbake::lightbake_gpu::{
    rgbm_decode, sh_project, sh_slot, BufferId, ConvergenceOutputData,
    FaultReason, GatherRequest, Intersection, Light, LightKind, ProbeSample,
    ShadowRayRequest, TexelSamples, SH_COEFF_COUNT,
};
use lightbake::{
    BakeConfig, BakeError, CpuExecutor, Executor, Mesh, Scene, Validation,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn point_light(position: Vec3, range: f32, falloff_index: u32) -> Light {
    Light {
        position,
        shadow_radius: 0.0,
        color: vec3(1.0, 0.5, 0.25),
        intensity: 1.0,
        direction: Vec3::NEG_Y,
        range,
        direct_bake_mode: 0,
        probe_occlusion_light_index: -1,
        cast_shadow: true,
        kind: LightKind::Point { falloff_index },
    }
}

fn lit_scene() -> Scene {
    let mut scene = Scene::default();
    let falloff = scene.add_distance_falloff(|x| (1.0 - x * x).max(0.0));

    scene.set_angular_falloff(|x| 1.0 - x.min(1.0));
    scene.add_light(&point_light(vec3(0.0, 2.0, 0.0), 10.0, falloff));
    scene
}

fn config(validation: Validation) -> BakeConfig {
    BakeConfig {
        validation,
        force_hard_shadow: true,
        ..Default::default()
    }
}

fn request(
    position: Vec3,
    light_idx: u32,
    texel_idx: i32,
) -> ShadowRayRequest {
    ShadowRayRequest::new(
        position,
        Vec3::Y,
        vec2(0.5, 0.5),
        light_idx,
        texel_idx,
    )
}

#[test]
fn direct_lighting() {
    let scene = lit_scene();
    let mut executor = CpuExecutor::new(&scene, config(Validation::Enabled));

    let requests = [
        request(Vec3::ZERO, 0, 0),
        request(vec3(1.0, 0.0, 0.0), 0, 1),
        // out of the light's range
        request(vec3(0.0, -20.0, 0.0), 0, 2),
    ];

    let rays = executor.prepare_shadow_rays(&requests).unwrap();

    assert!(rays[0].is_active());
    assert!(rays[1].is_active());
    assert!(!rays[2].is_active());
    assert_eq!(
        vec![0, 1, 2],
        rays.iter().map(|ray| ray.texel_idx).collect::<Vec<_>>()
    );

    assert_relative_eq!(2.0, rays[0].max_distance());
    assert_eq!(Vec3::Y, rays[0].direction());

    let radiance = executor
        .shade_direct(&requests, &rays, &[1.0, 0.0, 1.0])
        .unwrap();

    // (1 - (2/10)^2) * n·l
    let expected = 0.96 * vec3(1.0, 0.5, 0.25);

    assert_abs_diff_eq!(expected.x, radiance[0].x, epsilon = 0.01);
    assert_abs_diff_eq!(expected.y, radiance[0].y, epsilon = 0.01);
    assert_abs_diff_eq!(expected.z, radiance[0].z, epsilon = 0.01);
    assert_eq!(Vec4::ZERO, radiance[1]);
    assert_eq!(Vec4::ZERO, radiance[2]);

    assert_eq!(None, executor.take_fault().unwrap());
}

#[test]
fn both_validation_modes_agree() {
    let scene = lit_scene();
    let mut rng = StdRng::seed_from_u64(1234);

    let requests: Vec<_> = (0..256)
        .map(|idx| {
            let position = vec3(
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-5.0..1.0),
                rng.gen_range(-5.0..5.0),
            );

            request(position, 0, idx)
        })
        .collect();

    let occlusion: Vec<_> = (0..256).map(|_| rng.gen_range(0.0..1.0)).collect();

    let mut checked = CpuExecutor::new(&scene, config(Validation::Enabled));
    let mut unchecked = CpuExecutor::new(&scene, config(Validation::Disabled));

    let rays_a = checked.prepare_shadow_rays(&requests).unwrap();
    let rays_b = unchecked.prepare_shadow_rays(&requests).unwrap();

    assert_eq!(rays_a, rays_b);

    let radiance_a = checked.shade_direct(&requests, &rays_a, &occlusion);
    let radiance_b = unchecked.shade_direct(&requests, &rays_b, &occlusion);

    assert_eq!(radiance_a.unwrap(), radiance_b.unwrap());
    assert_eq!(None, checked.take_fault().unwrap());
}

#[test]
fn out_of_bounds_light_is_reported() {
    let scene = lit_scene();
    let mut executor = CpuExecutor::new(&scene, config(Validation::Enabled));

    let requests = [request(Vec3::ZERO, 0, 0), request(Vec3::ZERO, 7, 1)];
    let rays = executor.prepare_shadow_rays(&requests).unwrap();

    // The faulting work-item falls back to the first light
    assert_eq!(rays[0].direction(), rays[1].direction());
    assert_eq!(1, rays[1].texel_idx);

    let fault = executor.take_fault().unwrap().unwrap();

    assert_eq!(FaultReason::OutOfBounds, fault.reason());
    assert_eq!(Some(BufferId::Lights), BufferId::from_raw(fault.buffer_id));
    assert_eq!(7, fault.index);
    assert_eq!(1, fault.capacity);
    assert_eq!(None, executor.take_fault().unwrap());
}

#[test]
fn unoccupied_position_is_reported() {
    let scene = lit_scene();
    let mut executor = CpuExecutor::new(&scene, config(Validation::Enabled));
    let mut request = request(Vec3::ZERO, 0, 0);

    request.position.w = -1.0;

    executor.prepare_shadow_rays(&[request]).unwrap();

    let fault = executor.take_fault().unwrap().unwrap();

    assert_eq!(FaultReason::AssertionFailed, fault.reason());
}

#[test]
fn mismatched_inputs() {
    let scene = lit_scene();
    let mut executor = CpuExecutor::new(&scene, config(Validation::Enabled));
    let requests = [request(Vec3::ZERO, 0, 0)];
    let rays = executor.prepare_shadow_rays(&requests).unwrap();

    assert!(matches!(
        executor.shade_direct(&requests, &rays, &[]),
        Err(BakeError::LengthMismatch {
            name: "occlusion",
            expected: 1,
            actual: 0,
        })
    ));
}

#[test]
fn hits() {
    let mut scene = Scene::default();

    let mesh = scene
        .add_mesh(&Mesh {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: vec![Vec3::Z; 3],
            uvs: vec![vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(0.0, 1.0)],
            indices: vec![0, 1, 2],
        })
        .unwrap();

    let albedo = scene.add_albedo_texture(1, 1, &[0xffffffff]).unwrap();

    let emission = scene
        .add_emissive_texture(1, 1, &[vec4(2.0, 0.0, 0.0, 1.0)])
        .unwrap();

    let instance = scene.add_instance(mesh, Mat4::IDENTITY, albedo, emission);
    let mut executor = CpuExecutor::new(&scene, config(Validation::Enabled));

    let hit = Intersection {
        shape_id: instance + 1,
        prim_id: 0,
        uvwt: vec4(0.25, 0.5, 0.0, 3.0),
        ..Default::default()
    };

    let surfaces = executor
        .resolve_hits(&[hit, Intersection::default()])
        .unwrap();

    assert!(surfaces[0].is_hit());
    assert_eq!(0, surfaces[0].instance_id);
    assert_relative_eq!(3.0, surfaces[0].distance);
    assert_eq!(Vec4::ONE, surfaces[0].albedo);
    assert_eq!(vec4(2.0, 0.0, 0.0, 1.0), surfaces[0].emission);
    assert_eq!(vec2(0.25, 0.5), surfaces[0].uv);
    assert_eq!(Vec4::Z, surfaces[0].plane_normal);

    assert!(!surfaces[1].is_hit());
    assert_eq!(None, executor.take_fault().unwrap());
}

#[test]
fn environment_gather() {
    let mut scene = Scene::default();

    // 4x4, 2x2 and 1x1 faces, bordered
    let texels = vec![vec4(0.5, 0.25, 0.125, 1.0); 6 * (36 + 16 + 9)];

    scene.set_environment(4, 3, texels).unwrap();

    let mut executor = CpuExecutor::new(&scene, config(Validation::Enabled));
    let mut rng = StdRng::seed_from_u64(4321);

    let requests: Vec<_> = (0..64)
        .map(|idx| {
            let direction = vec3(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(0.1..1.0),
                rng.gen_range(-1.0..1.0),
            )
            .normalize();

            GatherRequest::new(direction, Vec3::Y, idx % 2 == 0)
        })
        .collect();

    let radiance = executor.final_gather(&requests).unwrap();

    for (idx, radiance) in radiance.iter().enumerate() {
        if idx % 2 == 0 {
            assert_abs_diff_eq!(0.5, radiance.x, epsilon = 1e-5);
            assert_abs_diff_eq!(0.25, radiance.y, epsilon = 1e-5);
            assert_abs_diff_eq!(0.125, radiance.z, epsilon = 1e-5);
        } else {
            assert_eq!(Vec4::ZERO, *radiance);
        }
    }

    assert_eq!(None, executor.take_fault().unwrap());
}

#[test]
fn probe_sh() {
    let scene = Scene::default();
    let mut executor = CpuExecutor::new(&scene, config(Validation::Enabled));
    let mut probe_sh = vec![Vec4::ZERO; 2 * SH_COEFF_COUNT];

    let a = ProbeSample::new(vec3(1.0, 0.5, 0.0), Vec3::Z, 0.5, 1);
    let b = ProbeSample::new(vec3(0.0, 0.5, 1.0), Vec3::NEG_Z, 0.5, 1);

    executor.accumulate_probe_sh(&[a, b], &mut probe_sh).unwrap();

    let sh_a = sh_project(a.color(), a.direction(), a.weight());
    let sh_b = sh_project(b.color(), b.direction(), b.weight());

    for coeff in 0..SH_COEFF_COUNT {
        let slot = |probe| sh_slot(coeff as i32, probe, 2) as usize;

        assert_eq!(Vec4::ZERO, probe_sh[slot(0)]);
        assert_eq!(sh_a[coeff] + sh_b[coeff], probe_sh[slot(1)]);
    }

    assert_eq!(None, executor.take_fault().unwrap());

    // Probe #2 doesn't exist
    let c = ProbeSample::new(Vec3::ONE, Vec3::X, 1.0, 2);

    executor.accumulate_probe_sh(&[c], &mut probe_sh).unwrap();

    let fault = executor.take_fault().unwrap().unwrap();

    assert_eq!(FaultReason::OutOfBounds, fault.reason());

    assert_eq!(
        Some(BufferId::OutputProbeSh),
        BufferId::from_raw(fault.buffer_id)
    );

    assert!(executor
        .accumulate_probe_sh(&[a], &mut probe_sh[..10])
        .is_err());
}

#[test]
fn rgbm_image() {
    let scene = Scene::default();
    let config = config(Validation::Enabled);
    let max_range = config.rgbm_max_range;
    let mut executor = CpuExecutor::new(&scene, config);

    let colors = [
        Vec4::ZERO,
        Vec4::ONE,
        vec4(4.0, 1.0, 0.5, 1.0),
        vec4(0.1, 0.2, 0.3, 1.0),
        vec4(1.0, 0.0, 0.0, 1.0),
    ];

    let image = executor.encode_rgbm(&colors, 2).unwrap();

    assert_eq!(6, image.len());
    assert_eq!(Vec4::ZERO, image[5]);

    for (color, texel) in colors.iter().zip(&image) {
        let decoded = rgbm_decode(*texel, max_range);

        assert_abs_diff_eq!(color.x, decoded.x, epsilon = 1e-4);
        assert_abs_diff_eq!(color.y, decoded.y, epsilon = 1e-4);
        assert_abs_diff_eq!(color.z, decoded.z, epsilon = 1e-4);
    }

    assert!(matches!(
        executor.encode_rgbm(&colors, 0),
        Err(BakeError::ZeroImageWidth)
    ));

    assert_eq!(None, executor.take_fault().unwrap());
}

#[test]
fn convergence() {
    let scene = Scene::default();

    let config = BakeConfig {
        max_direct_samples: 16,
        max_gi_samples: 64,
        ..config(Validation::Enabled)
    };

    let mut executor = CpuExecutor::new(&scene, config);

    let texels = [
        TexelSamples::new(16, 4, true),
        TexelSamples::unoccupied(),
        TexelSamples::new(8, 64, true),
        TexelSamples::new(32, 64, false),
    ];

    let stats = executor.convergence(&texels).unwrap();

    assert_eq!(3, stats.occupied_texel_count);
    assert_eq!(2, stats.visible_texel_count);
    assert_eq!(2, stats.converged_direct_texel_count);
    assert_eq!(2, stats.converged_gi_texel_count);
    assert_eq!(1, stats.visible_converged_direct_texel_count);
    assert_eq!(1, stats.visible_converged_gi_texel_count);
    assert_eq!(56, stats.total_direct_samples);
    assert_eq!(132, stats.total_gi_samples);
    assert_eq!(8, stats.min_direct_samples);
    assert_eq!(4, stats.min_gi_samples);
    assert_eq!(32, stats.max_direct_samples);
    assert_eq!(64, stats.max_gi_samples);
    assert!(!stats.is_converged());

    let stats = executor.convergence(&texels[1..]).unwrap();

    assert!(!stats.is_converged());

    let stats = executor.convergence(&texels[3..]).unwrap();

    assert!(stats.is_converged());

    assert_eq!(
        ConvergenceOutputData::default(),
        executor.convergence(&[]).unwrap()
    );

    assert_eq!(None, executor.take_fault().unwrap());
}

#[test]
fn convergence_matches_sequential_statistics() {
    let scene = Scene::default();
    let mut rng = StdRng::seed_from_u64(7);

    let texels: Vec<_> = (0..500)
        .map(|_| {
            if rng.gen_bool(0.1) {
                TexelSamples::unoccupied()
            } else {
                TexelSamples::new(
                    rng.gen_range(0..64),
                    rng.gen_range(0..1024),
                    rng.gen_bool(0.5),
                )
            }
        })
        .collect();

    let mut expected = ConvergenceOutputData::default();

    for texel in &texels {
        expected.record(*texel, 32, 512);
    }

    for validation in [Validation::Enabled, Validation::Disabled] {
        let mut executor = CpuExecutor::new(&scene, config(validation));

        assert_eq!(expected, executor.convergence(&texels).unwrap());
        assert_eq!(None, executor.take_fault().unwrap());
    }
}
