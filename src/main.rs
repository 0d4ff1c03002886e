use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{ error, info };
use tracing_subscriber::EnvFilter;

use whitted::consts::MAX_RECURSION_DEPTH;
use whitted::scene::Scene;
use whitted::{ Result, TraceError };

/// Renders a JSON scene description to a PPM image.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Scene description (JSON).
    scene: PathBuf,

    /// Where to write the rendered image.
    #[clap(short, long, default_value = "out.ppm")]
    output: PathBuf,

    /// Reflection/refraction budget of every camera ray.
    #[clap(short, long, default_value_t = MAX_RECURSION_DEPTH)]
    depth: usize,

    /// Worker threads; defaults to one per core.
    #[clap(short = 'j', long)]
    threads: Option<usize>,
}

fn run(args: &Args) -> Result<()> {
    let scene = Scene::load(&args.scene)?;

    let canvas = match args.threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| TraceError::ThreadPool(e.to_string()))?;

            pool.install(|| scene.camera.render(&scene.world, args.depth))?
        },
        None => scene.camera.render(&scene.world, args.depth)?,
    };

    canvas.save(&args.output)?;
    info!(output = %args.output.display(), "wrote image");

    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}
