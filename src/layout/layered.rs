use super::{intersect_rect, LayoutError, LayoutOracle, Rect};
use crate::config::LayoutConfig;
use crate::graph::{Diagram, EdgeSection, ROOT_ID};
use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use std::collections::{BTreeMap, HashSet};

/// Hierarchy-native strategy: every container is laid out on its own, depth
/// first, so child positions are relative to the parent by construction and
/// containers grow to fit their content. Edges are routed at the level of
/// their declared container, between that container's direct children; an
/// endpoint that is itself a container keeps its border as the attachment
/// point.
pub struct LayeredEngine;

impl LayoutOracle for LayeredEngine {
    fn name(&self) -> &'static str {
        "layered"
    }

    fn layout(&self, diagram: &mut Diagram, config: &LayoutConfig) -> Result<(), LayoutError> {
        let order = post_order_containers(diagram);
        let edge_groups = edges_by_container(diagram);
        for container in order {
            let edge_indices = edge_groups
                .get(&container)
                .cloned()
                .unwrap_or_default();
            layout_container(diagram, &container, &edge_indices, config)?;
        }
        Ok(())
    }
}

/// Containers in child-before-parent order; the root comes last.
fn post_order_containers(diagram: &Diagram) -> Vec<String> {
    let mut order = Vec::new();
    let mut stack = vec![(ROOT_ID.to_string(), false)];
    while let Some((id, expanded)) = stack.pop() {
        let Some(node) = diagram.node(&id) else {
            continue;
        };
        if node.children.is_empty() {
            continue;
        }
        if expanded {
            order.push(id);
            continue;
        }
        stack.push((id.clone(), true));
        for child in node.children.iter().rev() {
            stack.push((child.clone(), false));
        }
    }
    order
}

fn edges_by_container(diagram: &Diagram) -> BTreeMap<String, Vec<usize>> {
    let mut map: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, edge) in diagram.edges.iter().enumerate() {
        let container = edge.container.clone().unwrap_or_else(|| ROOT_ID.to_string());
        map.entry(container).or_default().push(idx);
    }
    map
}

/// The direct child of `container` on `node`'s ancestor chain (or `node`
/// itself when it is one).
fn representative(diagram: &Diagram, node: &str, container: &str) -> Option<String> {
    let mut current = node.to_string();
    loop {
        let parent = diagram.node(&current)?.parent.clone()?;
        if parent == container {
            return Some(current);
        }
        current = parent;
    }
}

fn layout_container(
    diagram: &mut Diagram,
    container: &str,
    edge_indices: &[usize],
    config: &LayoutConfig,
) -> Result<(), LayoutError> {
    let children: Vec<String> = match diagram.node(container) {
        Some(node) => node.children.clone(),
        None => return Ok(()),
    };
    if children.is_empty() {
        return Ok(());
    }

    // Edges routed at this level, collapsed to pairs of direct children.
    let mut level_edges: Vec<(usize, String, String)> = Vec::new();
    for &idx in edge_indices {
        let (from, to) = {
            let edge = &diagram.edges[idx];
            (edge.from.clone(), edge.to.clone())
        };
        let Some(rep_from) = representative(diagram, &from, container) else {
            continue;
        };
        let Some(rep_to) = representative(diagram, &to, container) else {
            continue;
        };
        if rep_from == rep_to {
            continue;
        }
        level_edges.push((idx, rep_from, rep_to));
    }

    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some("LR".to_string());
    graph_config.nodesep = Some(spacing_for(diagram, container, config));
    graph_config.ranksep = Some(config.rank_spacing);
    graph_config.marginx = Some(8.0);
    graph_config.marginy = Some(8.0);
    dagre_graph.set_graph(graph_config);

    for (order, child) in children.iter().enumerate() {
        let Some(layout) = diagram.node(child) else {
            continue;
        };
        let mut node = DagreNode::default();
        node.width = layout.width;
        node.height = layout.height;
        node.order = Some(order);
        dagre_graph.set_node(child.clone(), Some(node));
    }

    let mut edge_set: HashSet<(String, String)> = HashSet::new();
    for (_, rep_from, rep_to) in &level_edges {
        if !edge_set.insert((rep_from.clone(), rep_to.clone())) {
            continue;
        }
        let edge_label = DagreEdge::default();
        let _ = dagre_graph.set_edge(rep_from, rep_to, Some(edge_label), None);
    }

    dagre_layout::run_layout(&mut dagre_graph);

    let mut applied = false;
    for child in &children {
        let Some(dagre_node) = dagre_graph.node(child) else {
            continue;
        };
        if let Some(node) = diagram.node_mut(child) {
            node.x = dagre_node.x - node.width / 2.0;
            node.y = dagre_node.y - node.height / 2.0;
            applied = true;
        }
    }
    if !applied {
        return Err(LayoutError::Oracle {
            engine: "layered",
            nodes: diagram.node_count(),
            edges: diagram.edges.len(),
            reason: format!("no positions returned for container {container}"),
        });
    }

    // Shift content to the container's padded origin and grow the container
    // around it.
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for child in &children {
        if let Some(node) = diagram.node(child) {
            min_x = min_x.min(node.x);
            min_y = min_y.min(node.y);
            max_x = max_x.max(node.x + node.width);
            max_y = max_y.max(node.y + node.height);
        }
    }
    if !min_x.is_finite() {
        return Ok(());
    }

    let padding = diagram
        .node(container)
        .and_then(|node| node.padding)
        .unwrap_or(crate::graph::Padding {
            top: 0.0,
            left: 0.0,
            bottom: 0.0,
            right: 0.0,
        });
    let is_root = container == ROOT_ID;
    let offset_x = if is_root { -min_x } else { -min_x + padding.left };
    let offset_y = if is_root { -min_y } else { -min_y + padding.top };
    for child in &children {
        if let Some(node) = diagram.node_mut(child) {
            node.x += offset_x;
            node.y += offset_y;
        }
    }
    if !is_root {
        if let Some(node) = diagram.node_mut(container) {
            node.width = (max_x - min_x) + padding.left + padding.right;
            node.height = (max_y - min_y) + padding.top + padding.bottom;
        }
    }

    // Straight sections between child borders, in this container's frame.
    for (idx, rep_from, rep_to) in &level_edges {
        let Some(from_rect) = child_rect(diagram, rep_from) else {
            continue;
        };
        let Some(to_rect) = child_rect(diagram, rep_to) else {
            continue;
        };
        let from_center = from_rect.center();
        let to_center = to_rect.center();
        let start = intersect_rect(to_center, from_center, from_rect);
        let end = intersect_rect(start, to_center, to_rect);
        diagram.edges[*idx].sections = vec![EdgeSection {
            start,
            bends: Vec::new(),
            end,
        }];
    }

    Ok(())
}

fn spacing_for(diagram: &Diagram, container: &str, config: &LayoutConfig) -> f32 {
    diagram
        .node(container)
        .and_then(|node| node.spacing)
        .unwrap_or(config.node_spacing)
}

fn child_rect(diagram: &Diagram, id: &str) -> Option<Rect> {
    let node = diagram.node(id)?;
    Some(Rect {
        x: node.x,
        y: node.y,
        width: node.width,
        height: node.height,
    })
}
