// tests/background_bounds.rs
//
// Long-running scene properties across several seeds and surface sizes.

use rand::rngs::StdRng;
use rand::SeedableRng;

use jeevadhara_live::background::canvas::{DrawOp, RecordingCanvas};
use jeevadhara_live::background::grid::{close_pairs, close_pairs_naive};
use jeevadhara_live::background::{Scene, SceneConfig, Viewport};

fn in_bounds(scene: &Scene<StdRng>) -> bool {
    let vp = scene.viewport();
    scene
        .particles()
        .iter()
        .all(|p| (0.0..=vp.width).contains(&p.x) && (0.0..=vp.height).contains(&p.y))
}

#[test]
fn particles_stay_inside_across_seeds() {
    for seed in [1u64, 7, 42, 2024] {
        for (w, h) in [(800.0, 600.0), (64.0, 48.0), (1.0, 1.0)] {
            let vp = Viewport::new(w, h).unwrap();
            let mut scene = Scene::new(SceneConfig::default(), vp, StdRng::seed_from_u64(seed));
            let mut canvas = RecordingCanvas::new();
            for frame in 0..2_000 {
                scene.step(&mut canvas);
                assert!(in_bounds(&scene), "seed {seed} {w}x{h} left bounds at frame {frame}");
            }
        }
    }
}

#[test]
fn resize_reseeds_inside_the_new_surface() {
    let big = Viewport::new(1920.0, 1080.0).unwrap();
    let small = Viewport::new(300.0, 200.0).unwrap();
    let mut scene = Scene::new(SceneConfig::default(), big, StdRng::seed_from_u64(5));
    let mut canvas = RecordingCanvas::new();
    for _ in 0..100 {
        scene.step(&mut canvas);
    }

    scene.resize(small);
    assert_eq!(scene.viewport(), small);
    assert_eq!(scene.particles().len(), 50);
    assert!(in_bounds(&scene));

    for _ in 0..500 {
        scene.step(&mut canvas);
        assert!(in_bounds(&scene));
    }
}

#[test]
fn drawn_links_match_the_exhaustive_scan() {
    let vp = Viewport::new(640.0, 480.0).unwrap();
    let cfg = SceneConfig {
        particle_count: 120,
        ..SceneConfig::default()
    };
    let mut scene = Scene::new(cfg, vp, StdRng::seed_from_u64(31));
    let mut canvas = RecordingCanvas::new();

    for _ in 0..50 {
        let stats = scene.step(&mut canvas);
        let points: Vec<(f64, f64)> = scene.particles().iter().map(|p| (p.x, p.y)).collect();

        let mut fast: Vec<_> = close_pairs(&points, cfg.link_distance)
            .into_iter()
            .map(|l| (l.a, l.b))
            .collect();
        let mut slow: Vec<_> = close_pairs_naive(&points, cfg.link_distance)
            .into_iter()
            .map(|l| (l.a, l.b))
            .collect();
        fast.sort_unstable();
        slow.sort_unstable();

        assert_eq!(fast, slow);
        assert_eq!(stats.links, slow.len());
        assert_eq!(canvas.count(|op| matches!(op, DrawOp::Line { .. })), slow.len());
    }
}
