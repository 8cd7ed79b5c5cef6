//! Headless runner: places the models of a script onto a floor, runs the
//! drops to completion and prints the resulting session as JSON.

use floor_placement_lib::fixtures;
use floor_placement_lib::harness::TestHarness;
use floor_placement_lib::state::PlacementSettings;
use floor_placement_lib::viewport::camera::ArcBallCamera;
use shared::{PlacementOptions, PlacementScript, ScriptedModel, ScriptedPlacement};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "floor_placement=info,floor_placement_lib=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse --scene <path> argument
    let script = parse_scene_arg().unwrap_or_else(demo_script);

    let mut harness = TestHarness::with_scene(fixtures::floor_scene(), PlacementSettings::load());
    harness.loader = fixtures::script_loader(&script.models);
    harness
        .controller
        .set_camera(Box::new(ArcBallCamera::new(harness.rect.aspect())));

    for placement in &script.placements {
        match harness.place(&placement.url, placement.options.clone()).await {
            Ok(node) => tracing::info!("Placed {} as {node}", placement.url),
            Err(e) => tracing::error!("Failed to place {}: {e}", placement.url),
        }
        // let each drop settle before the next one lands next to it
        harness.run_until_idle();
    }

    for _ in 0..script.frames {
        harness.step();
    }

    println!("{}", harness.snapshot().to_json());
}

fn parse_scene_arg() -> Option<PlacementScript> {
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--scene" && i + 1 < args.len() {
            let path = &args[i + 1];
            match std::fs::read_to_string(path) {
                Ok(json) => match serde_json::from_str::<PlacementScript>(&json) {
                    Ok(script) => {
                        tracing::info!(
                            "Loaded script from {path} ({} placements)",
                            script.placements.len()
                        );
                        return Some(script);
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse script JSON from {path}: {e}");
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to read script file {path}: {e}");
                }
            }
            break;
        }
        i += 1;
    }
    None
}

/// Two chairs dropped side by side so their facing points snap
fn demo_script() -> PlacementScript {
    let chair = |x: f32| ScriptedPlacement {
        url: "chair.glb".to_string(),
        options: PlacementOptions {
            position: Some([x, 0.0]),
            ..Default::default()
        },
    };
    PlacementScript {
        models: vec![ScriptedModel {
            url: "chair.glb".to_string(),
            name: "chair_01".to_string(),
            size: [1.0, 1.0, 1.0],
        }],
        placements: vec![chair(0.0), chair(1.05)],
        frames: 0,
    }
}
