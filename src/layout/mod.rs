mod layered;
mod ranked;

pub use layered::LayeredEngine;
pub use ranked::RankedEngine;

use crate::config::LayoutConfig;
use crate::graph::{Diagram, Point};
use crate::ir::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Hierarchy-native: one oracle invocation per container, bottom-up.
    Layered,
    /// Rank-based: one flat compound invocation with an anchor/clipping shim.
    Ranked,
}

impl EngineKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "layered" | "elk" => Some(Self::Layered),
            "ranked" | "dagre" => Some(Self::Ranked),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Layered => "layered",
            Self::Ranked => "ranked",
        }
    }
}

/// Engine choice: explicit caller override, then the document's `layout`
/// field, then the default.
pub fn select_engine(requested: Option<EngineKind>, document: &Document) -> EngineKind {
    if let Some(engine) = requested {
        return engine;
    }
    if let Some(name) = document.layout.as_deref() {
        match EngineKind::from_name(name) {
            Some(engine) => return engine,
            None => {
                tracing::warn!(layout = name, "unknown layout engine in document, using default");
            }
        }
    }
    EngineKind::Layered
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error(
        "{engine} layout rejected the graph ({nodes} nodes, {edges} edges): {reason}"
    )]
    Oracle {
        engine: &'static str,
        nodes: usize,
        edges: usize,
        reason: String,
    },
}

/// A layout strategy. Consumes the finished containment tree read-only apart
/// from writing positions (relative to each node's direct parent) and
/// resizing containers, and fills in edge path sections expressed in the
/// frame of each edge's declared container.
pub trait LayoutOracle {
    fn name(&self) -> &'static str;
    fn layout(&self, diagram: &mut Diagram, config: &LayoutConfig) -> Result<(), LayoutError>;
}

pub fn oracle_for(engine: EngineKind) -> &'static dyn LayoutOracle {
    match engine {
        EngineKind::Layered => &LayeredEngine,
        EngineKind::Ranked => &RankedEngine,
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub(crate) fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub(crate) fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Clip `to` against the rectangle along the segment `from -> to`: the
/// intersection parameter is computed against each of the four half-plane
/// boundaries and the smallest in-range one wins. Without an in-range
/// crossing the endpoint stays as is.
pub(crate) fn intersect_rect(from: Point, to: Point, rect: Rect) -> Point {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0.0 && dy == 0.0 {
        return to;
    }

    let min_x = rect.x;
    let max_x = rect.x + rect.width;
    let min_y = rect.y;
    let max_y = rect.y + rect.height;
    let epsilon = 0.1;

    let mut best_t = f32::INFINITY;
    let mut check = |t: f32| {
        if (0.0..=1.0).contains(&t) {
            let ix = from.x + t * dx;
            let iy = from.y + t * dy;
            if ix >= min_x - epsilon
                && ix <= max_x + epsilon
                && iy >= min_y - epsilon
                && iy <= max_y + epsilon
                && t < best_t
            {
                best_t = t;
            }
        }
    };

    if dx != 0.0 {
        check((min_x - from.x) / dx);
        check((max_x - from.x) / dx);
    }
    if dy != 0.0 {
        check((min_y - from.y) / dy);
        check((max_y - from.y) / dy);
    }

    if best_t.is_finite() && best_t < 1.0 {
        return Point::new(from.x + best_t * dx, from.y + best_t * dy);
    }
    to
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clips_segment_endpoint_to_rect_border() {
        let rect = Rect {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        };
        // Endpoint at the rect center, approached from outside on the left.
        let clipped = intersect_rect(Point::new(-50.0, 50.0), Point::new(50.0, 50.0), rect);
        assert_eq!(clipped, Point::new(0.0, 50.0));
    }

    #[test]
    fn clipped_point_stays_on_segment() {
        let rect = Rect {
            x: 10.0,
            y: 10.0,
            width: 20.0,
            height: 20.0,
        };
        let from = Point::new(0.0, 0.0);
        let to = Point::new(20.0, 20.0);
        let clipped = intersect_rect(from, to, rect);
        assert!((clipped.y - clipped.x).abs() < 1e-4);
        assert!(clipped.x >= 0.0 && clipped.x <= 20.0);
        assert!(rect.contains(clipped));
    }

    #[test]
    fn no_crossing_returns_endpoint() {
        let rect = Rect {
            x: 100.0,
            y: 100.0,
            width: 10.0,
            height: 10.0,
        };
        let to = Point::new(50.0, 50.0);
        assert_eq!(intersect_rect(Point::new(0.0, 0.0), to, rect), to);
    }

    #[test]
    fn engine_selection_priority() {
        let mut document = Document::default();
        assert_eq!(select_engine(None, &document), EngineKind::Layered);

        document.layout = Some("ranked".to_string());
        assert_eq!(select_engine(None, &document), EngineKind::Ranked);
        assert_eq!(
            select_engine(Some(EngineKind::Layered), &document),
            EngineKind::Layered
        );

        document.layout = Some("mystery".to_string());
        assert_eq!(select_engine(None, &document), EngineKind::Layered);

        // The original engine names are accepted as aliases.
        assert_eq!(EngineKind::from_name("elk"), Some(EngineKind::Layered));
        assert_eq!(EngineKind::from_name("dagre"), Some(EngineKind::Ranked));
    }
}
