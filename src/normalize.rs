use crate::graph::{Diagram, Point, ROOT_ID};

/// Reconcile adapter output into one globally consistent, tightly cropped
/// frame:
///
/// 1. crop to the bounding box of the root's direct children and shift them
///    by `(-min + padding)`;
/// 2. size the root to the padded box;
/// 3. re-derive every absolute position (container origins moved);
/// 4. translate every edge path by its declared container's new absolute
///    position, falling back to the edge's own start node, then to the root
///    origin.
///
/// Afterwards edges live in the shared global frame with the root as their
/// container, so running this twice is a no-op.
pub fn normalize(diagram: &mut Diagram, padding: f32) {
    let root_children = diagram.root().children.clone();
    if root_children.is_empty() {
        return;
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for child in &root_children {
        if let Some(node) = diagram.node(child) {
            min_x = min_x.min(node.x);
            min_y = min_y.min(node.y);
            max_x = max_x.max(node.x + node.width);
            max_y = max_y.max(node.y + node.height);
        }
    }
    if !min_x.is_finite() {
        return;
    }

    let shift_x = -min_x + padding;
    let shift_y = -min_y + padding;
    for child in &root_children {
        if let Some(node) = diagram.node_mut(child) {
            node.x += shift_x;
            node.y += shift_y;
        }
    }

    {
        let root = diagram.root_mut();
        root.x = 0.0;
        root.y = 0.0;
        root.width = (max_x - min_x) + 2.0 * padding;
        root.height = (max_y - min_y) + 2.0 * padding;
    }

    // Edge sections were recorded relative to their container's absolute
    // position at layout time; that position just changed.
    let absolute = diagram.absolute_positions();
    for edge in &mut diagram.edges {
        let offset = edge
            .container
            .as_deref()
            .and_then(|container| absolute.get(container).copied())
            .or_else(|| absolute.get(&edge.from).copied())
            .unwrap_or(Point::default());
        for section in &mut edge.sections {
            section.start.x += offset.x;
            section.start.y += offset.y;
            for bend in &mut section.bends {
                bend.x += offset.x;
                bend.y += offset.y;
            }
            section.end.x += offset.x;
            section.end.y += offset.y;
        }
        edge.container = Some(ROOT_ID.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeSection, Node, NodeKind};

    fn positioned_diagram() -> Diagram {
        let mut diagram = Diagram::new();

        let mut vpc = Node::new("vpc", "VPC", NodeKind::Boundary);
        vpc.x = -30.0;
        vpc.y = 50.0;
        vpc.width = 200.0;
        vpc.height = 150.0;
        diagram.insert(vpc);
        diagram.attach("vpc", ROOT_ID);

        let mut db = Node::new("db", "DB", NodeKind::Leaf);
        db.x = 40.0;
        db.y = 60.0;
        db.width = 80.0;
        db.height = 80.0;
        diagram.insert(db);
        diagram.attach("db", "vpc");

        let mut user = Node::new("user", "User", NodeKind::External);
        user.x = -200.0;
        user.y = 80.0;
        user.width = 80.0;
        user.height = 80.0;
        diagram.insert(user);
        diagram.attach("user", ROOT_ID);

        diagram.edges.push(Edge {
            id: "user->db".to_string(),
            from: "user".to_string(),
            to: "db".to_string(),
            label: "sql".to_string(),
            container: Some(ROOT_ID.to_string()),
            sections: vec![EdgeSection {
                start: Point::new(-120.0, 120.0),
                bends: vec![Point::new(-60.0, 120.0)],
                end: Point::new(10.0, 135.0),
            }],
        });
        diagram
    }

    #[test]
    fn crops_to_content_and_pads() {
        let mut diagram = positioned_diagram();
        normalize(&mut diagram, 20.0);

        // Leftmost content (user at -200) lands at the padding offset.
        assert_eq!(diagram.node("user").unwrap().x, 20.0);
        assert_eq!(diagram.node("vpc").unwrap().x, 190.0);
        // Topmost content (vpc at 50) lands at the padding offset.
        assert_eq!(diagram.node("vpc").unwrap().y, 20.0);

        let root = diagram.root();
        // Content spans x: [-200, 170], y: [50, 200].
        assert_eq!(root.width, 370.0 + 40.0);
        assert_eq!(root.height, 150.0 + 40.0);
    }

    #[test]
    fn edges_move_into_the_global_frame() {
        let mut diagram = positioned_diagram();
        normalize(&mut diagram, 20.0);

        let edge = &diagram.edges[0];
        // Root-level edges shift by the root offset (zero) only; their
        // container is the root both before and after.
        assert_eq!(edge.container.as_deref(), Some(ROOT_ID));
        assert_eq!(edge.sections[0].start, Point::new(-120.0, 120.0));
    }

    #[test]
    fn container_level_edges_get_the_container_offset() {
        let mut diagram = positioned_diagram();
        diagram.edges[0].container = Some("vpc".to_string());
        normalize(&mut diagram, 20.0);

        let vpc = diagram.node("vpc").unwrap();
        let edge = &diagram.edges[0];
        assert_eq!(
            edge.sections[0].start,
            Point::new(-120.0 + vpc.x, 120.0 + vpc.y)
        );
        assert_eq!(edge.container.as_deref(), Some(ROOT_ID));
    }

    #[test]
    fn missing_container_falls_back_to_edge_endpoint() {
        let mut diagram = positioned_diagram();
        diagram.edges[0].container = None;
        normalize(&mut diagram, 20.0);

        let user = diagram.node("user").unwrap();
        let edge = &diagram.edges[0];
        assert_eq!(
            edge.sections[0].start,
            Point::new(-120.0 + user.x, 120.0 + user.y)
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let mut diagram = positioned_diagram();
        normalize(&mut diagram, 20.0);

        let snapshot = diagram.clone();
        normalize(&mut diagram, 20.0);

        for (id, node) in &diagram.nodes {
            let before = &snapshot.nodes[id];
            assert_eq!((node.x, node.y), (before.x, before.y), "{id} moved");
            assert_eq!(
                (node.width, node.height),
                (before.width, before.height),
                "{id} resized"
            );
        }
        for (edge, before) in diagram.edges.iter().zip(&snapshot.edges) {
            assert_eq!(edge.sections[0].start, before.sections[0].start);
            assert_eq!(edge.sections[0].end, before.sections[0].end);
        }
    }
}
