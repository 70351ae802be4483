use crate::graph::Diagram;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub engine: String,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: String,
    pub label: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub icon: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub from: String,
    pub to: String,
    pub label: String,
    pub container: Option<String>,
    pub points: Vec<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_diagram(diagram: &Diagram, engine: &str) -> Self {
        let nodes = diagram
            .nodes
            .values()
            .map(|node| NodeDump {
                id: node.id.clone(),
                kind: format!("{:?}", node.kind),
                label: node.label.clone(),
                parent: node.parent.clone(),
                children: node.children.clone(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                icon: node.icon.clone(),
                title: node.title.clone(),
            })
            .collect();

        let edges = diagram
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                from: edge.from.clone(),
                to: edge.to.clone(),
                label: edge.label.clone(),
                container: edge.container.clone(),
                points: edge
                    .sections
                    .iter()
                    .flat_map(|section| section.points())
                    .map(|point| [point.x, point.y])
                    .collect(),
            })
            .collect();

        let root = diagram.root();
        LayoutDump {
            engine: engine.to_string(),
            width: root.width,
            height: root.height,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, diagram: &Diagram, engine: &str) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_diagram(diagram, engine);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
