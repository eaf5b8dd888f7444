use std::{fs, path::Path, time::Instant};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::{debug, info, level_filters::LevelFilter};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

use args::Args;
use common::{
    progress::Progress,
    serde::{DynamicSerializer, SliceDeserializer},
};
use lasercut::export::export_objects;
use mesh_format::{load_objects, MeshObject};

mod args;

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = filter::Targets::new()
        .with_default(LevelFilter::WARN)
        .with_target("lasercut", level)
        .with_target("mesh_format", level)
        .with_target("common", level);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = args.export_config()?;
    if let Some(path) = &args.save_config {
        config.save(path)?;
        info!("Saved config to `{}`", path.display());
    }

    let units = config.units();
    for (unit, scale) in units.entries() {
        debug!("1{unit} = {scale}px");
    }

    let now = Instant::now();
    let mut objects = Vec::new();
    for path in args.meshes.iter() {
        objects.extend(load_file(path)?);
    }

    let exported = export_objects(&objects, &config, Progress::new());
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create `{}`", args.output_dir.display()))?;

    let mut failed = 0;
    for object in exported.iter() {
        let file = match &object.result {
            Ok(file) => file,
            Err(err) => {
                println!("Skipped `{}`: {err}", object.name);
                failed += 1;
                continue;
            }
        };

        let path = args.output_dir.join(format!("{}.svg", object.stem));
        let mut serializer = DynamicSerializer::new();
        file.serialize(&mut serializer);
        fs::write(&path, serializer.into_inner())
            .with_context(|| format!("Failed to write `{}`", path.display()))?;
        println!("Wrote `{}`", path.display());
    }

    println!(
        "\nDone. Exported {} of {} objects in {:.1}s",
        exported.len() - failed,
        exported.len(),
        now.elapsed().as_secs_f32()
    );

    ensure!(failed == 0, "{failed} objects could not be exported");
    Ok(())
}

fn load_file(path: &Path) -> Result<Vec<MeshObject>> {
    let format = path
        .extension()
        .context("Mesh file has no extension")?
        .to_string_lossy();
    let name = path
        .file_stem()
        .map(|x| x.to_string_lossy())
        .unwrap_or_default();

    let data = fs::read(path).with_context(|| format!("Failed to read `{}`", path.display()))?;
    let mut des = SliceDeserializer::new(&data);
    let objects = load_objects(&mut des, &format, &name, Progress::new())
        .with_context(|| format!("Failed to load `{}`", path.display()))?;

    info!(
        "Loaded {} objects from `{}`",
        objects.len(),
        path.display()
    );
    Ok(objects)
}
