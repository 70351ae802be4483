#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod graph;
pub mod icons;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod normalize;
pub mod parser;
pub mod render;
pub mod resolve;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{load_config, CatalogConfig, Config, LayoutConfig};
pub use graph::Diagram;
pub use ir::Document;
pub use layout::{select_engine, EngineKind, LayoutError, LayoutOracle};
pub use parser::parse_document;
pub use render::render_svg;
pub use theme::Theme;

/// Resolve, lay out and normalize a parsed document with the given engine.
pub fn layout_document(
    document: &Document,
    engine: EngineKind,
    config: &Config,
) -> Result<Diagram, LayoutError> {
    let mut diagram = resolve::resolve(document, &config.catalog);
    layout::oracle_for(engine).layout(&mut diagram, &config.layout)?;
    normalize::normalize(&mut diagram, config.layout.crop_padding);
    Ok(diagram)
}

/// Full pipeline: YAML description in, SVG string out. Engine priority is
/// the explicit override, then the document's `layout` field, then the
/// default.
pub fn generate_diagram_svg(
    content: &str,
    engine_override: Option<EngineKind>,
    config: &Config,
) -> anyhow::Result<String> {
    let document = parser::parse_document(content)?;
    let engine = layout::select_engine(engine_override, &document);
    let diagram = layout_document(&document, engine, config)?;
    Ok(render::render_svg(&diagram, &config.theme, &config.catalog))
}
