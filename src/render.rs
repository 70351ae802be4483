use crate::config::{CatalogConfig, RenderConfig};
use crate::graph::{Diagram, Node, ROOT_ID};
use crate::icons;
use crate::text_metrics;
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

pub fn render_svg(diagram: &Diagram, theme: &Theme, catalog: &CatalogConfig) -> String {
    let root = diagram.root();
    let width = if root.width > 0.0 { root.width } else { 800.0 };
    let height = if root.height > 0.0 { root.height } else { 600.0 };

    let mut nodes_output = String::new();
    for child in &root.children {
        if let Some(node) = diagram.node(child) {
            render_node(diagram, node, theme, catalog, &mut nodes_output);
        }
    }

    let mut edges_output = String::new();
    for edge in &diagram.edges {
        for section in &edge.sections {
            let points = section.points();
            let mut d = format!("M {:.2} {:.2}", points[0].x, points[0].y);
            for point in points.iter().skip(1) {
                d.push_str(&format!(" L {:.2} {:.2}", point.x, point.y));
            }
            edges_output.push_str(&format!(
                "<path d=\"{d}\" class=\"aws-edge\" marker-end=\"url(#arrow)\" />"
            ));

            if !edge.label.is_empty() {
                let first = points[0];
                let last = points[points.len() - 1];
                let mid_x = (first.x + last.x) / 2.0;
                let mid_y = (first.y + last.y) / 2.0;
                let label_width = text_metrics::measure_text_width(
                    &edge.label,
                    theme.label_font_size,
                    &theme.font_family,
                )
                .unwrap_or(edge.label.chars().count() as f32 * 7.0);
                let rect_x = mid_x - label_width / 2.0 - 4.0;
                let rect_y = mid_y - theme.label_font_size / 2.0 - 4.0;
                edges_output.push_str(&format!(
                    "<rect x=\"{rect_x:.2}\" y=\"{rect_y:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" opacity=\"0.8\"/>",
                    label_width + 8.0,
                    theme.label_font_size + 8.0,
                    theme.background
                ));
                edges_output.push_str(&format!(
                    "<text x=\"{mid_x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" class=\"aws-label-sm\">{}</text>",
                    mid_y + theme.label_font_size / 2.0 - 1.0,
                    escape_xml(&edge.label)
                ));
            }
        }
    }

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {width} {height}\" style=\"width: 100%; height: auto; max-width: 100%; background-color: {};\">\
<defs><style>{}</style>\
<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\">\
<path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>\
</defs>{nodes_output}{edges_output}</svg>",
        theme.background,
        css_styles(theme),
        theme.edge_color
    )
}

fn css_styles(theme: &Theme) -> String {
    format!(
        "\n  .aws-container {{ fill: none; stroke-width: 2px; }}\
\n  .aws-root {{ fill: {bg}; stroke: none; }}\
\n  .aws-vpc {{ fill: {vpc_fill}; stroke: {vpc_stroke}; stroke-dasharray: 5,5; }}\
\n  .aws-az {{ fill: none; stroke: {az_stroke}; stroke-dasharray: 5,5; stroke-width: 1.5px; }}\
\n  .aws-subnet-public {{ fill: {pub_fill}; stroke: {pub_stroke}; }}\
\n  .aws-subnet-private {{ fill: {priv_fill}; stroke: {priv_stroke}; }}\
\n  .aws-compute-cluster {{ fill: {node_fill}; stroke: {cluster_stroke}; stroke-dasharray: 4,4; }}\
\n  .aws-label {{ font-family: {font}; font-size: {label_size}px; fill: {label}; font-weight: bold; }}\
\n  .aws-label-sm {{ font-family: {font}; font-size: {label_sm_size}px; fill: {label_sm}; }}\
\n  .aws-edge {{ stroke: {edge}; stroke-width: 2px; fill: none; }}\n",
        bg = theme.background,
        vpc_fill = theme.boundary_fill,
        vpc_stroke = theme.boundary_stroke,
        az_stroke = theme.zone_stroke,
        pub_fill = theme.subnet_public_fill,
        pub_stroke = theme.subnet_public_stroke,
        priv_fill = theme.subnet_private_fill,
        priv_stroke = theme.subnet_private_stroke,
        node_fill = theme.node_fill,
        cluster_stroke = theme.cluster_stroke,
        font = theme.font_family.replace('"', "'"),
        label_size = theme.font_size,
        label = theme.label_color,
        label_sm_size = theme.label_font_size,
        label_sm = theme.label_secondary_color,
        edge = theme.edge_color,
    )
}

fn render_node(
    diagram: &Diagram,
    node: &Node,
    theme: &Theme,
    catalog: &CatalogConfig,
    out: &mut String,
) {
    out.push_str(&format!(
        "<g transform=\"translate({:.2}, {:.2})\">",
        node.x, node.y
    ));

    if node.is_container() && node.id != ROOT_ID {
        let mut rect_class = "aws-container".to_string();
        if let Some(class) = &node.class {
            rect_class.push(' ');
            rect_class.push_str(class);
        }
        out.push_str(&format!(
            "<rect width=\"{:.2}\" height=\"{:.2}\" class=\"{rect_class}\" rx=\"4\" ry=\"4\" stroke-width=\"2\" />",
            node.width, node.height
        ));

        let label = truncate_label(&node.label, node.width - 40.0, theme);
        if !label.is_empty() {
            out.push_str(&format!(
                "<text x=\"10\" y=\"25\" class=\"aws-label\">{}</text>",
                escape_xml(&label)
            ));
        }

        // A container icon duplicating a child's is dropped.
        if let Some(icon) = &node.icon {
            let duplicated = node.children.iter().any(|child| {
                diagram
                    .node(child)
                    .and_then(|child| child.icon.as_ref())
                    .is_some_and(|child_icon| child_icon == icon)
            });
            if !duplicated {
                if let Some(uri) = icons::data_uri(&catalog.assets_dir, icon) {
                    out.push_str(&format!(
                        "<image href=\"{uri}\" x=\"{:.2}\" y=\"5\" width=\"24\" height=\"24\" />",
                        node.width - 28.0
                    ));
                }
            }
        }

        for child in &node.children {
            if let Some(child_node) = diagram.node(child) {
                render_node(diagram, child_node, theme, catalog, out);
            }
        }
    } else {
        // Backing rect covers edges passing behind the node.
        out.push_str(&format!(
            "<rect width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"none\" />",
            node.width, node.height, theme.node_fill
        ));

        let icon_uri = node
            .icon
            .as_deref()
            .and_then(|icon| icons::data_uri(&catalog.assets_dir, icon));
        match icon_uri {
            Some(uri) => {
                let ix = (node.width - 48.0) / 2.0;
                out.push_str(&format!(
                    "<image href=\"{uri}\" x=\"{ix:.2}\" y=\"10\" width=\"48\" height=\"48\" />"
                ));
            }
            None => {
                out.push_str(&format!(
                    "<rect width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\" />",
                    node.width, node.height, theme.node_fallback_fill, theme.node_fallback_stroke
                ));
            }
        }

        let (line1, line2) = split_label(&node.label);
        let text_y = 65.0;
        out.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{text_y}\" text-anchor=\"middle\" class=\"aws-label-sm\">{}</text>",
            node.width / 2.0,
            escape_xml(&line1)
        ));
        if let Some(line2) = line2 {
            out.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" class=\"aws-label-sm\">{}</text>",
                node.width / 2.0,
                text_y + 12.0,
                escape_xml(&line2)
            ));
        }
    }

    out.push_str("</g>");
}

/// Width-limited label: measured with real font metrics when available, an
/// average character width otherwise.
fn truncate_label(text: &str, max_width: f32, theme: &Theme) -> String {
    if text.is_empty() || max_width <= 0.0 {
        return String::new();
    }
    let char_count = text.chars().count();
    let char_width = text_metrics::measure_text_width(text, theme.font_size, &theme.font_family)
        .map(|width| width / char_count as f32)
        .unwrap_or(8.0)
        .max(1.0);
    let max_chars = (max_width / char_width) as usize;
    if char_count <= max_chars + 2 {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated.trim_end())
}

/// Split long leaf labels over two lines at the middle word.
fn split_label(label: &str) -> (String, Option<String>) {
    let words: Vec<&str> = label.split_whitespace().collect();
    if words.len() > 1 && (words.len() > 2 || label.chars().count() > 16) {
        let mid = words.len().div_ceil(2);
        return (words[..mid].join(" "), Some(words[mid..].join(" ")));
    }
    (label.to_string(), None)
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .unwrap_or(usvg::Size::from_wh(800.0, 600.0).unwrap());

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    Err(anyhow::anyhow!(
        "PNG output requires the `png` feature"
    ))
}
