//! Headless streaming demo: orbits a camera around a synthetic volume and
//! drives the tile cache with the blocks each frame can see.
//!
//! Per frame, the level-of-detail selector picks a pyramid level for the
//! current view, the visibility engine enumerates the blocks of that level
//! inside the frustum, and the upload pipeline streams the missing ones into
//! the in-memory tile texture. The source is throttled so blocks arrive a few
//! frames late, which exercises the incomplete-and-retry path the way a real
//! out-of-core dataset would.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p teravox-headless -- [OPTIONS]
//! ```
//!
//! ## Options
//!
//! - `--frames <N>`: frames to simulate (default: 96)
//! - `--seed <N>`: noise seed for the synthetic volume (default: 0)
//! - `--dims <N>`: full-resolution volume extent per axis (default: 256)
//! - `--block-size <N>`: block size per axis (default: 16)
//! - `--tile-grid <N>`: cache tile grid per axis (default: 10)
//! - `--delay <N>`: fills a block refuses before loading (default: 1)
//! - `--parallel`: run fills on the worker pool
//! - `-h, --help`: print help
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: set log level (e.g., info, debug, trace)

use anyhow::Context;
use glam::{DMat4, DVec3, UVec3};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use teravox_cache::{
    FillMode, FillTask, MemoryTileTexture, TileCache, UploadConfig, UploadPipeline,
};
use teravox_core::{CacheSpec, ConvexPolytope, VoxelFormat};
use teravox_source::{
    PyramidSource, SourceStack, SyntheticConfig, SyntheticPyramid, ThrottledSource,
};
use teravox_view::{required_blocks, LodSelector};

const VIEWPORT_WIDTH: u32 = 1280;
const VIEWPORT_HEIGHT: u32 = 720;

/// Vertical field of view in radians.
const FOV_Y: f64 = std::f64::consts::FRAC_PI_3;

/// Demo parameters (from CLI or defaults).
#[derive(Debug, Clone)]
struct Params {
    frames: u32,
    seed: u32,
    dims: u32,
    block_size: u32,
    tile_grid: u32,
    delay: u32,
    parallel: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            frames: 96,
            seed: 0,
            dims: 256,
            block_size: 16,
            tile_grid: 10,
            delay: 1,
            parallel: false,
        }
    }
}

impl Params {
    /// Parse parameters from command line arguments.
    fn from_args() -> Self {
        let mut params = Self::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--frames" => {
                    if let Some(v) = parse_next(&args, i) {
                        params.frames = v;
                        i += 1;
                    }
                }
                "--seed" => {
                    if let Some(v) = parse_next(&args, i) {
                        params.seed = v;
                        i += 1;
                    }
                }
                "--dims" => {
                    if let Some(v) = parse_next(&args, i) {
                        params.dims = v;
                        i += 1;
                    }
                }
                "--block-size" => {
                    if let Some(v) = parse_next(&args, i) {
                        params.block_size = v;
                        i += 1;
                    }
                }
                "--tile-grid" => {
                    if let Some(v) = parse_next(&args, i) {
                        params.tile_grid = v;
                        i += 1;
                    }
                }
                "--delay" => {
                    if let Some(v) = parse_next(&args, i) {
                        params.delay = v;
                        i += 1;
                    }
                }
                "--parallel" => params.parallel = true,
                _ => {}
            }
            i += 1;
        }

        params
    }
}

fn parse_next(args: &[String], i: usize) -> Option<u32> {
    args.get(i + 1).and_then(|v| v.parse().ok())
}

fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let params = Params::from_args();
    anyhow::ensure!(
        params.dims >= params.block_size,
        "--dims must be at least --block-size"
    );

    let spec =
        CacheSpec::with_interpolation_padding(UVec3::splat(params.block_size), VoxelFormat::U16)
            .context("cache geometry")?;

    // Levels down to one block per axis or fewer.
    let mut num_levels = 1;
    while (params.dims >> num_levels) >= params.block_size {
        num_levels += 1;
    }

    let source = ThrottledSource::new(
        SyntheticPyramid::new(SyntheticConfig {
            seed: params.seed,
            dims: UVec3::splat(params.dims),
            num_levels: num_levels as usize,
            ..SyntheticConfig::default()
        }),
        params.delay,
    );
    let mut stack = SourceStack::new(1, source);

    let tile_grid = UVec3::splat(params.tile_grid);
    let mut cache = TileCache::new(spec, tile_grid).context("tile cache")?;
    let mut texture = MemoryTileTexture::new(&spec, tile_grid);
    let upload_config = UploadConfig {
        mode: if params.parallel {
            FillMode::Parallel
        } else {
            FillMode::Sequential
        },
        ..UploadConfig::default()
    };
    let mut pipeline =
        UploadPipeline::new(upload_config, &spec, &texture).context("upload pipeline")?;

    let texture_mib = cache.texture_dims().as_u64vec3().element_product()
        * spec.format().bytes_per_voxel() as u64
        / (1024 * 1024);
    info!(
        "streaming {}^3 volume, {} levels, cache of {} tiles ({} MiB texture)",
        params.dims,
        stack.levels().len(),
        cache.capacity(),
        texture_mib
    );

    let center = DVec3::splat(f64::from(params.dims) * 0.5 - 0.5);
    let radius = f64::from(params.dims) * 1.8;
    let aspect = f64::from(VIEWPORT_WIDTH) / f64::from(VIEWPORT_HEIGHT);
    let projection =
        DMat4::perspective_rh_gl(FOV_Y, aspect, radius * 0.05, radius * 3.0);

    let mut total_transfers = 0usize;
    let mut total_completed = 0usize;
    let mut total_incomplete = 0usize;

    for frame in 0..params.frames {
        if params.frames > 1 && frame == params.frames / 2 {
            stack.invalidate();
            info!("frame {frame}: source invalidated, resident tiles will age out");
        }

        let angle = std::f64::consts::TAU * f64::from(frame) / f64::from(params.frames);
        let eye = center + DVec3::new(angle.cos(), 0.45, angle.sin()) * radius;
        let view = DMat4::look_at_rh(eye, center, DVec3::Y);
        let source_to_ndc = projection * view;

        let selector = LodSelector::init(&source_to_ndc, VIEWPORT_WIDTH, stack.levels());
        if !selector.is_visible() {
            warn!("frame {frame}: volume outside the frustum, nothing to stream");
            continue;
        }
        let level = selector.base_level();
        let level_info = stack.levels()[level];

        // Clip region in level voxel coordinates.
        let level_to_ndc = source_to_ndc * level_info.transform;
        let clip = ConvexPolytope::aabb(DVec3::splat(-1.0), DVec3::splat(1.0))
            .preimage(&level_to_ndc);
        let required =
            required_blocks(&clip, spec.block_size(), level_info.grid_dims(spec.block_size()));

        let source = stack.source();
        let tasks: Vec<FillTask<'_>> = required
            .positions()
            .iter()
            .map(|&pos| {
                let key = stack.block_key(level, pos);
                FillTask::new(key, move |dst| source.fill_block(level, pos, &spec, dst))
            })
            .collect();

        let stats = pipeline
            .process(&mut cache, &mut texture, tasks)
            .context("streaming failed; enlarge --tile-grid or shrink the view")?;
        total_transfers += stats.transfers;
        total_completed += stats.completed;
        total_incomplete += stats.incomplete;

        info!(
            "frame {frame:>3}: level {level}, {} blocks visible, {} already resident, {} filled ({} partial), {} transfers, {} tiles bound",
            required.len(),
            stats.already_complete,
            stats.updated + stats.loaded,
            stats.incomplete,
            stats.transfers,
            cache.resident_blocks()
        );
        debug!(
            "frame {frame}: closest depth {:.3}, pixel footprint {:.3}..{:.3} voxels",
            selector.closest_depth(),
            selector.near_pixel_size(),
            selector.far_pixel_size()
        );
    }

    info!(
        "done: {} frames, {} transfers, {} complete fills, {} partial fills retried",
        params.frames, total_transfers, total_completed, total_incomplete
    );
    Ok(())
}

fn print_help() {
    eprintln!(
        "Teravox Headless Streaming Demo

USAGE:
    cargo run -p teravox-headless -- [OPTIONS]

OPTIONS:
    --frames <N>        Frames to simulate (default: 96)
    --seed <N>          Noise seed for the synthetic volume (default: 0)
    --dims <N>          Full-resolution volume extent per axis (default: 256)
    --block-size <N>    Block size per axis (default: 16)
    --tile-grid <N>     Cache tile grid per axis (default: 10)
    --delay <N>         Fills a block refuses before loading (default: 1)
    --parallel          Run fills on the worker pool
    -h, --help          Print this help message

EXAMPLES:
    # Default orbit
    cargo run -p teravox-headless

    # Larger volume, parallel fills
    cargo run -p teravox-headless -- --dims 512 --parallel

    # Tiny cache to watch eviction churn
    cargo run -p teravox-headless -- --tile-grid 4 --delay 3

ENVIRONMENT VARIABLES:
    RUST_LOG            Set log level (e.g., info, debug, trace)"
    );
}
