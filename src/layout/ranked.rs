use super::{intersect_rect, LayoutError, LayoutOracle, Rect};
use crate::config::LayoutConfig;
use crate::graph::{Diagram, EdgeSection, Point, ROOT_ID};
use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use std::collections::{BTreeMap, HashMap};

const ANCHOR_SUFFIX: &str = "__anchor";

/// Rank-based strategy: a single flat compound invocation of the oracle.
///
/// The oracle has no notion of a container as an edge endpoint, so a
/// zero-size anchor node inside each populated container stands in whenever
/// an edge really targets the container; degenerate edges (same endpoint
/// after substitution, or one endpoint an ancestor of the other) are
/// silently dropped. The oracle's absolute center-point output is converted
/// back to parent-relative top-left, containers are resized around their
/// laid-out members, and edge path ends are clipped to the resolved node's
/// rectangle so arrowheads land on the border. Callers never see the
/// anchors.
pub struct RankedEngine;

impl LayoutOracle for RankedEngine {
    fn name(&self) -> &'static str {
        "ranked"
    }

    fn layout(&self, diagram: &mut Diagram, config: &LayoutConfig) -> Result<(), LayoutError> {
        if diagram.node_count() == 0 {
            return Ok(());
        }

        let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
            DagreGraph::new(Some(GraphOption {
                directed: Some(true),
                multigraph: Some(false),
                compound: Some(true),
            }));

        let mut graph_config = DagreConfig::default();
        graph_config.rankdir = Some("LR".to_string());
        graph_config.nodesep = Some(config.node_spacing);
        graph_config.ranksep = Some(config.rank_spacing);
        graph_config.marginx = Some(config.margin);
        graph_config.marginy = Some(config.margin);
        dagre_graph.set_graph(graph_config);

        // Every node except the synthetic root takes part in the flat run;
        // containers go in unsized, they are grouping structure only.
        let ids: Vec<String> = diagram
            .nodes
            .keys()
            .filter(|id| id.as_str() != ROOT_ID)
            .cloned()
            .collect();
        for (order, id) in ids.iter().enumerate() {
            let Some(layout) = diagram.node(id) else {
                continue;
            };
            let mut node = DagreNode::default();
            if layout.children.is_empty() {
                node.width = layout.width;
                node.height = layout.height;
            }
            node.order = Some(order);
            dagre_graph.set_node(id.clone(), Some(node));
        }
        for id in &ids {
            let parent = diagram.node(id).and_then(|node| node.parent.clone());
            if let Some(parent) = parent {
                if parent != ROOT_ID {
                    let _ = dagre_graph.set_parent(id, Some(parent));
                }
            }
        }

        let mut anchors: HashMap<String, String> = HashMap::new();
        let mut oracle_edges: Vec<usize> = Vec::new();
        let edge_endpoints: Vec<(String, String)> = diagram
            .edges
            .iter()
            .map(|edge| (edge.from.clone(), edge.to.clone()))
            .collect();
        for (idx, (from, to)) in edge_endpoints.iter().enumerate() {
            if !diagram.contains(from) || !diagram.contains(to) {
                continue;
            }
            let u = anchor_for(diagram, &mut dagre_graph, &mut anchors, from);
            let v = anchor_for(diagram, &mut dagre_graph, &mut anchors, to);
            if u == v {
                tracing::debug!(%from, %to, "dropping self-referential connection");
                continue;
            }
            if diagram.is_ancestor(from, to) || diagram.is_ancestor(to, from) {
                tracing::debug!(%from, %to, "dropping connection between nested nodes");
                continue;
            }
            let edge_label = DagreEdge::default();
            let _ = dagre_graph.set_edge(&u, &v, Some(edge_label), None);
            oracle_edges.push(idx);
        }

        dagre_layout::run_layout(&mut dagre_graph);

        // Absolute top-left corners from the oracle's center-point output,
        // leaves first.
        let mut absolute: BTreeMap<String, Point> = BTreeMap::new();
        let mut applied = false;
        for id in &ids {
            let Some(node) = diagram.node(id) else {
                continue;
            };
            if !node.children.is_empty() {
                continue;
            }
            let Some(dagre_node) = dagre_graph.node(id) else {
                continue;
            };
            absolute.insert(
                id.clone(),
                Point::new(
                    dagre_node.x - node.width / 2.0,
                    dagre_node.y - node.height / 2.0,
                ),
            );
            applied = true;
        }
        if !applied {
            return Err(LayoutError::Oracle {
                engine: "ranked",
                nodes: diagram.node_count(),
                edges: diagram.edges.len(),
                reason: "no positions returned".to_string(),
            });
        }

        // Containers wrap their members, deepest first.
        let mut containers: Vec<String> = ids
            .iter()
            .filter(|id| {
                diagram
                    .node(id)
                    .is_some_and(|node| !node.children.is_empty())
            })
            .cloned()
            .collect();
        containers.sort_by_key(|id| std::cmp::Reverse(diagram.ancestors(id).len()));
        for id in containers {
            let Some(bounds) = child_bounds(diagram, &absolute, &id) else {
                continue;
            };
            let padding = diagram.node(&id).and_then(|node| node.padding);
            let (pad_top, pad_left, pad_bottom, pad_right) = match padding {
                Some(p) => (p.top, p.left, p.bottom, p.right),
                None => (0.0, 0.0, 0.0, 0.0),
            };
            absolute.insert(
                id.clone(),
                Point::new(bounds.x - pad_left, bounds.y - pad_top),
            );
            if let Some(node) = diagram.node_mut(&id) {
                node.width = bounds.width + pad_left + pad_right;
                node.height = bounds.height + pad_top + pad_bottom;
            }
        }

        // Parent-relative top-left.
        for id in &ids {
            let Some(&my_abs) = absolute.get(id) else {
                continue;
            };
            let parent_abs = diagram
                .node(id)
                .and_then(|node| node.parent.as_deref())
                .filter(|parent| *parent != ROOT_ID)
                .and_then(|parent| absolute.get(parent).copied())
                .unwrap_or_default();
            if let Some(node) = diagram.node_mut(id) {
                node.x = my_abs.x - parent_abs.x;
                node.y = my_abs.y - parent_abs.y;
            }
        }

        // Edge paths: center to center between the resolved endpoints, in
        // the frame of the declared container, clipped to node borders.
        for idx in oracle_edges {
            let (from, to, container) = {
                let edge = &diagram.edges[idx];
                (
                    edge.from.clone(),
                    edge.to.clone(),
                    edge.container.clone().unwrap_or_else(|| ROOT_ID.to_string()),
                )
            };
            let offset = absolute.get(&container).copied().unwrap_or_default();
            let Some(from_rect) = node_rect(diagram, &absolute, &from, offset) else {
                continue;
            };
            let Some(to_rect) = node_rect(diagram, &absolute, &to, offset) else {
                continue;
            };
            let mut points = vec![from_rect.center(), to_rect.center()];
            points[0] = intersect_rect(points[1], points[0], from_rect);
            points[1] = intersect_rect(points[0], points[1], to_rect);
            diagram.edges[idx].sections = vec![EdgeSection {
                start: points[0],
                bends: Vec::new(),
                end: points[1],
            }];
        }

        Ok(())
    }
}

/// Stand-in endpoint for the oracle: the node itself for leaves, a zero-size
/// anchor nested inside the node for populated containers.
fn anchor_for(
    diagram: &Diagram,
    dagre_graph: &mut DagreGraph<DagreConfig, DagreNode, DagreEdge>,
    anchors: &mut HashMap<String, String>,
    id: &str,
) -> String {
    let is_container = diagram
        .node(id)
        .is_some_and(|node| !node.children.is_empty());
    if !is_container {
        return id.to_string();
    }
    if let Some(anchor) = anchors.get(id) {
        return anchor.clone();
    }

    let anchor = format!("{id}{ANCHOR_SUFFIX}");
    let mut node = DagreNode::default();
    node.width = 0.0;
    node.height = 0.0;
    dagre_graph.set_node(anchor.clone(), Some(node));
    let _ = dagre_graph.set_parent(&anchor, Some(id.to_string()));
    anchors.insert(id.to_string(), anchor.clone());
    anchor
}

fn node_rect(
    diagram: &Diagram,
    absolute: &BTreeMap<String, Point>,
    id: &str,
    offset: Point,
) -> Option<Rect> {
    let node = diagram.node(id)?;
    let abs = absolute.get(id)?;
    Some(Rect {
        x: abs.x - offset.x,
        y: abs.y - offset.y,
        width: node.width,
        height: node.height,
    })
}

fn child_bounds(
    diagram: &Diagram,
    absolute: &BTreeMap<String, Point>,
    id: &str,
) -> Option<Rect> {
    let node = diagram.node(id)?;
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for child in &node.children {
        let Some(child_node) = diagram.node(child) else {
            continue;
        };
        let Some(abs) = absolute.get(child) else {
            continue;
        };
        min_x = min_x.min(abs.x);
        min_y = min_y.min(abs.y);
        max_x = max_x.max(abs.x + child_node.width);
        max_y = max_y.max(abs.y + child_node.height);
    }
    if !min_x.is_finite() {
        return None;
    }
    Some(Rect {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::parser::parse_document;
    use crate::resolve::resolve;

    fn ranked(yaml: &str) -> Diagram {
        let document = parse_document(yaml).expect("parse failed");
        let mut diagram = resolve(&document, &CatalogConfig::default());
        RankedEngine
            .layout(&mut diagram, &LayoutConfig::default())
            .expect("layout failed");
        diagram
    }

    #[test]
    fn positions_are_parent_relative() {
        let diagram = ranked(
            r#"
applications:
  - { id: web, name: Web, type: frontend }
infrastructure:
  clouds:
    - provider: aws
      services:
        - { id: cluster, type: compute, subtype: eks, runs: [web] }
"#,
        );

        let cluster = diagram.node("cluster").unwrap();
        let web = diagram.node("web").unwrap();
        assert!(cluster.width >= web.width);
        assert!(cluster.height >= web.height);
        // web's stored position is its offset inside the cluster.
        assert!(web.x >= 0.0, "web.x = {}", web.x);
        assert!(web.y >= 0.0, "web.y = {}", web.y);
        assert!(web.x + web.width <= cluster.width + 0.5);
        assert!(web.y + web.height <= cluster.height + 0.5);
    }

    #[test]
    fn self_connection_is_suppressed() {
        let diagram = ranked(
            r#"
applications:
  - { id: api, name: Api, type: backend }
connections:
  - { from: api, to: api, type: loop }
"#,
        );

        assert_eq!(diagram.edges.len(), 1);
        assert!(diagram.edges[0].sections.is_empty());
    }

    #[test]
    fn nested_endpoint_connection_is_suppressed() {
        let diagram = ranked(
            r#"
applications:
  - { id: web, name: Web, type: frontend }
infrastructure:
  clouds:
    - provider: aws
      services:
        - { id: cluster, type: compute, subtype: eks, runs: [web] }
connections:
  - { from: cluster, to: web, type: owns }
"#,
        );

        let edge = &diagram.edges[0];
        assert!(edge.sections.is_empty());
    }

    #[test]
    fn edge_endpoints_land_on_node_borders() {
        let diagram = ranked(
            r#"
applications:
  - { id: web, name: Web, type: frontend }
  - { id: api, name: Api, type: backend }
connections:
  - { from: web, to: api, type: http }
"#,
        );

        let edge = &diagram.edges[0];
        assert_eq!(edge.sections.len(), 1);
        let section = &edge.sections[0];
        let positions = diagram.absolute_positions();
        let web = diagram.node("web").unwrap();
        let web_pos = positions["web"];
        let on_border = (section.start.x - web_pos.x).abs() < 0.5
            || (section.start.x - (web_pos.x + web.width)).abs() < 0.5
            || (section.start.y - web_pos.y).abs() < 0.5
            || (section.start.y - (web_pos.y + web.height)).abs() < 0.5;
        assert!(on_border, "edge start not on source border");
    }
}
