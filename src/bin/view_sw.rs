//! view_sw - walk around a small built-in scene with the software renderer.
//!
//! Keys: W/S or ↑/↓ move, A/D strafe, ←/→ turn, PgUp/PgDn look up/down,
//! Space activate, Esc quit.

use clap::Parser;
use glam::{DVec2, dvec2};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use std::time::{Duration, Instant};

use portalcast::{
    RenderConfig,
    renderer::{FrameBuffer, Renderer, Software},
    sim::{Body, EventKind, GameEvent, SpatialWorld, Subscription},
    world::{Camera, RegionId, SceneBuilder, SceneGraph, Texture, TextureBank},
};

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// Window width in pixels
    #[arg(long, default_value_t = 640)]
    width: usize,

    /// Window height in pixels
    #[arg(long, default_value_t = 480)]
    height: usize,

    /// Horizontal field of view in degrees
    #[arg(long, default_value_t = 75.0)]
    fov: f64,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log: log::LevelFilter,
}

const EYE_HEIGHT: f64 = 48.0;
const MOVE_SPEED: f64 = 160.0; // world units / second
const TURN_RATE: f64 = std::f64::consts::PI; // rad / second
const TILT_RATE: f64 = 0.8; // rad / second
const TILT_LIMIT: f64 = 0.6;
const PLAYER_RADIUS: f64 = 12.0;
const USE_RANGE: f64 = 64.0;

fn init_logging(level: log::LevelFilter) -> anyhow::Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{:<5} {}] {}", record.level(), record.target(), message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

/*──────────────────────────── demo scene ────────────────────────────*/

fn demo_textures() -> anyhow::Result<TextureBank> {
    let mut bank = TextureBank::default_with_checker();
    for tex in [
        Texture::checker("BRICK", 8, 0xFF_A0_40_30, 0xFF_70_28_20),
        Texture::checker("STONE", 8, 0xFF_90_90_90, 0xFF_60_60_60),
        Texture::checker("WOOD", 8, 0xFF_A0_78_40, 0xFF_78_58_30),
        Texture::checker("GRASS", 8, 0xFF_40_A0_40, 0xFF_30_78_30),
        Texture::checker("PLASTER", 8, 0xFF_D0_D0_C0, 0xFF_B8_B8_A8),
    ] {
        let name = tex.name.clone();
        bank.insert(name, tex)?;
    }
    Ok(bank)
}

struct Demo {
    scene: SceneGraph,
    hall: RegionId,
    yard: RegionId,
}

/// A roofed hall with a pillar in it, opening through a doorway with a
/// step up onto an open-air yard.
fn demo_scene(bank: &TextureBank) -> anyhow::Result<Demo> {
    let mut b = SceneBuilder::new();
    let root = b.add_region(None, 0.0, None);

    let hall = b.add_region(Some(root), 0.0, Some(120.0));
    b.set_flats(hall, "WOOD", "PLASTER")?;
    let yard = b.add_region(Some(root), 24.0, None);
    b.set_flats(yard, "GRASS", "MISSING")?;
    let pillar = b.add_region(Some(hall), 0.0, Some(120.0));

    let wall = |b: &mut SceneBuilder, r: RegionId, pts: &[(f64, f64)], tex: &str| -> anyhow::Result<()> {
        for w in pts.windows(2) {
            b.add_wall(r, dvec2(w[0].0, w[0].1), dvec2(w[1].0, w[1].1), tex)?;
        }
        Ok(())
    };

    wall(&mut b, hall, &[(400.0, 100.0), (400.0, 0.0), (0.0, 0.0), (0.0, 300.0), (400.0, 300.0), (400.0, 200.0)], "BRICK")?;
    wall(&mut b, yard, &[(400.0, 200.0), (400.0, 300.0), (800.0, 300.0), (800.0, 0.0), (400.0, 0.0), (400.0, 100.0)], "STONE")?;
    b.add_portal(hall, yard, dvec2(400.0, 100.0), dvec2(400.0, 200.0), "STONE", "BRICK")?;
    wall(&mut b, pillar, &[(180.0, 130.0), (220.0, 130.0), (220.0, 170.0), (180.0, 170.0), (180.0, 130.0)], "STONE")?;

    Ok(Demo {
        scene: b.finish(bank)?,
        hall,
        yard,
    })
}

/*──────────────────────────────── main ──────────────────────────────*/

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    init_logging(opts.log)?;

    let bank = demo_textures()?;
    let Demo { scene, hall, yard } = demo_scene(&bank)?;

    let config = RenderConfig::for_screen(opts.width, opts.height);
    let max_depth = config.max_portal_depth;
    let mut renderer = Software::new(config);

    let mut world = SpatialWorld::new(scene, max_depth);
    let player = world.spawn_in(hall, dvec2(80.0, 150.0), Body::new(2.0 * PLAYER_RADIUS, 56.0))?;
    world.spawn(dvec2(600.0, 150.0), Body::new(32.0, 64.0));
    world.events_mut().subscribe(Subscription {
        entity: Some(player),
        kind: EventKind::ChangedZone,
        payload: yard,
    });

    let mut camera = Camera::new(renderer.config().viewport.x, opts.fov.to_radians(), hall);
    camera.pos = world.position(player)?;
    camera.height = EYE_HEIGHT;

    let mut fb = FrameBuffer::new(opts.width, opts.height);
    let mut win = Window::new(
        "portalcast - software",
        opts.width,
        opts.height,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )?;
    win.set_target_fps(60);

    let mut last = Instant::now();
    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let dt = last.elapsed().as_secs_f64();
        last = Instant::now();

        /* --------------------------- input ------------------------------ */
        let axis = |pos: &[Key], neg: &[Key]| -> f64 {
            let down = |keys: &[Key]| keys.iter().any(|&k| win.is_key_down(k));
            down(pos) as i32 as f64 - down(neg) as i32 as f64
        };
        let forward = axis(&[Key::W, Key::Up], &[Key::S, Key::Down]);
        let strafe = axis(&[Key::D], &[Key::A]);
        camera.turn(axis(&[Key::Left], &[Key::Right]) * TURN_RATE * dt);
        camera.tilt(axis(&[Key::PageUp], &[Key::PageDown]) * TILT_RATE * dt, TILT_LIMIT);

        /* ------------------------- movement ----------------------------- */
        let dv = camera.step_vector(forward, strafe) * MOVE_SPEED * dt;
        if dv != DVec2::ZERO {
            let zone = world.zone(player)?;
            let pos = world.position(player)?;
            let blocked = world
                .first_wall_along(zone, pos, dv, dv.length() + PLAYER_RADIUS)?
                .is_some();
            if !blocked {
                if let Some(change) = world.move_entity(player, dv)? {
                    log::debug!("player: zone {} → {}", change.old_zone, change.new_zone);
                }
            }
        }
        camera.pos = world.position(player)?;
        camera.region = world.zone(player)?;

        if win.is_key_pressed(Key::Space, KeyRepeat::No) {
            let act = world.activate(player, camera.forward(), USE_RANGE)?;
            log::info!(
                "use: {} in reach, {} in sight",
                act.in_radius.len(),
                act.looking_at.len()
            );
        }

        for d in world.events_mut().dispatch() {
            if let GameEvent::ChangedZone(c) = &d.event {
                if c.zones_entered.contains(&d.subscription.payload) {
                    log::info!("stepped out into the yard");
                }
            }
        }

        /* --------------------------- draw ------------------------------- */
        let (w, h) = win.get_size();
        if (w, h) != (fb.width, fb.height) && w > 0 && h > 0 {
            fb.resize(w, h);
            renderer = Software::new(RenderConfig::for_screen(w, h));
            camera.focal = Camera::focal_for(renderer.config().viewport.x, opts.fov.to_radians());
            log::debug!("resized to {w}×{h}");
        }
        let t0 = Instant::now();
        renderer.render_scene(&mut fb, world.scene(), &camera, &bank)?;
        acc_time += t0.elapsed();
        acc_frames += 1;
        win.update_with_buffer(&fb.pixels, fb.width, fb.height)?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            log::info!("avg render: {:.2} ms  ({:.1} FPS)", avg_ms, 1000.0 / avg_ms);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}
