use crate::config::load_config;
use crate::layout::{select_engine, EngineKind};
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_document;
use crate::render::{render_svg, write_output_png, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "adac",
    version,
    about = "Architecture-diagram-as-code renderer (YAML descriptions to SVG/PNG)"
)]
pub struct Args {
    /// Input file (.yaml) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Layout engine, overriding the document's own choice
    #[arg(short = 'e', long = "engine", value_enum)]
    pub engine: Option<EngineArg>,

    /// Config JSON file (theme, layout spacing, icon catalog overrides)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Write a JSON dump of the positioned diagram for debugging
    #[arg(long = "layoutDump")]
    pub layout_dump: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum EngineArg {
    /// Hierarchy-native, one layout pass per container
    #[value(alias = "elk")]
    Layered,
    /// Flat rank-based layout
    #[value(alias = "dagre")]
    Ranked,
}

impl From<EngineArg> for EngineKind {
    fn from(value: EngineArg) -> Self {
        match value {
            EngineArg::Layered => EngineKind::Layered,
            EngineArg::Ranked => EngineKind::Ranked,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let input = read_input(args.input.as_deref())?;
    let document = parse_document(&input)?;
    let engine = select_engine(args.engine.map(EngineKind::from), &document);
    let diagram = crate::layout_document(&document, engine, &config)?;

    if let Some(path) = &args.layout_dump {
        write_layout_dump(path, &diagram, engine.name())?;
    }

    let svg = render_svg(&diagram, &config.theme, &config.catalog);
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, &config.render)?;
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_arg_maps_to_engine_kind() {
        assert_eq!(EngineKind::from(EngineArg::Layered), EngineKind::Layered);
        assert_eq!(EngineKind::from(EngineArg::Ranked), EngineKind::Ranked);
    }

    #[test]
    fn png_without_output_path_is_an_error() {
        assert!(ensure_output(&None, "png").is_err());
        assert!(ensure_output(&Some(PathBuf::from("out.png")), "png").is_ok());
    }
}
