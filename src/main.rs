use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use pagecraft::config::load_engine_config;
use pagecraft::filter::FilterKind;
use pagecraft::scene::FilterTarget;
use pagecraft::tools::{CropPreset, InsertKind, ToolMode};
use pagecraft::Editor;

const USAGE: &str = "usage: pagecraft <input> [-o <output.png>] [--filter <kind>=<value>]... \
[--crop <free|16:9|1:1|9:16|original>] [--insert <text|rect|ellipse>]... [--rotate] [--flip]";

#[derive(Debug, Default)]
struct Options {
    input: PathBuf,
    output: Option<PathBuf>,
    filters: Vec<(FilterKind, f32)>,
    crop: Option<CropPreset>,
    inserts: Vec<InsertKind>,
    rotate: bool,
    flip: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Options> {
    let mut options = Options::default();
    let mut input = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                let path = args.next().context("--output needs a path")?;
                options.output = Some(PathBuf::from(path));
            }
            "--filter" => {
                let directive = args.next().context("--filter needs <kind>=<value>")?;
                let (kind, value) = directive
                    .split_once('=')
                    .with_context(|| format!("malformed filter {directive:?}"))?;
                let kind = FilterKind::parse(kind)
                    .with_context(|| format!("unknown filter {kind:?}"))?;
                let value: f32 = value
                    .parse()
                    .with_context(|| format!("filter value {value:?} is not a number"))?;
                options.filters.push((kind, value));
            }
            "--crop" => {
                let preset = args.next().context("--crop needs a preset")?;
                options.crop = Some(
                    CropPreset::parse(&preset)
                        .with_context(|| format!("unknown crop preset {preset:?}"))?,
                );
            }
            "--insert" => {
                let kind = args.next().context("--insert needs a shape")?;
                options.inserts.push(
                    InsertKind::parse(&kind).with_context(|| format!("unknown shape {kind:?}"))?,
                );
            }
            "--rotate" => options.rotate = true,
            "--flip" => options.flip = true,
            "-h" | "--help" => bail!(USAGE),
            _ if input.is_none() => input = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument {arg:?}\n{USAGE}"),
        }
    }
    options.input = input.context(USAGE)?;
    Ok(options)
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}

fn main() -> anyhow::Result<()> {
    pagecraft::logging::init();
    let options = parse_args(std::env::args().skip(1))?;

    let mut editor = Editor::new(load_engine_config());
    let bytes = std::fs::read(&options.input)
        .with_context(|| format!("failed to read {}", options.input.display()))?;
    editor
        .load_image(&bytes, &source_name(&options.input))
        .context("failed to load image")?;

    for (kind, value) in &options.filters {
        let applied = editor.set_filter(FilterTarget::Background, *kind, *value)?;
        tracing::info!(filter = kind.label(), requested = value, applied, "filter set");
    }
    if options.rotate {
        editor.rotate_background()?;
    }
    if options.flip {
        editor.flip_background()?;
    }
    if let Some(preset) = options.crop {
        editor.set_crop_preset(preset)?;
        editor.set_mode(ToolMode::Crop)?;
        editor.confirm_crop()?;
    }
    for kind in &options.inserts {
        editor.insert(*kind)?;
    }

    let artifact = editor.export()?;
    let output = options.output.unwrap_or_else(|| {
        options
            .input
            .with_file_name(&artifact.filename)
    });
    std::fs::write(&output, &artifact.pixel_data)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(path = %output.display(), "export written");
    Ok(())
}
