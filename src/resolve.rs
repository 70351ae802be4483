use crate::config::CatalogConfig;
use crate::graph::{Diagram, Edge, Node, NodeKind, ROOT_ID};
use crate::ir::{Application, Document, Service};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Shared container for components no structural rule could place.
const BUCKET_ID: &str = "group-utility-shared";
const BUCKET_LABEL: &str = "Shared Infrastructure";

pub fn group_node_id(name: &str) -> String {
    format!("group-{}", WHITESPACE_RE.replace_all(name.trim(), "-"))
}

/// Bookkeeping threaded through the resolution passes: the partially built
/// tree plus the set of ids that already found their place. Later passes
/// never move a node placed by an earlier one.
#[derive(Debug)]
pub struct PlacementState {
    pub diagram: Diagram,
    placed: HashSet<String>,
    /// Zone containers synthesized during zone inference; pruned when they
    /// end up childless.
    synthesized_zones: BTreeSet<String>,
    bucket_created: bool,
}

impl PlacementState {
    fn new() -> Self {
        Self {
            diagram: Diagram::new(),
            placed: HashSet::new(),
            synthesized_zones: BTreeSet::new(),
            bucket_created: false,
        }
    }

    fn is_placed(&self, id: &str) -> bool {
        self.placed.contains(id)
    }

    fn place(&mut self, id: &str, parent: &str) {
        self.diagram.attach(id, parent);
        self.placed.insert(id.to_string());
    }
}

/// Build the containment tree for a document.
///
/// Never fails: malformed parent references, ambiguous candidate lists and
/// self-cycles all degrade to fallback placement so that something
/// diagnosable is always rendered.
pub fn resolve(document: &Document, catalog: &CatalogConfig) -> Diagram {
    let mut state = PlacementState::new();

    create_leaves(&mut state, document, catalog);
    discover_groups(&mut state, document, catalog);
    claim_runs(&mut state, document);

    let mut hints = BTreeMap::new();
    infer_zones(&mut state, document, &mut hints, catalog);
    direct_parent_hints(document, &mut hints);
    drop_self_parents(&mut hints);
    attach_resolved(&mut state, document, &hints);

    place_group_fallback(&mut state, document);
    classify_top_level(&mut state);
    place_orphans(&mut state, catalog);
    add_connections(&mut state, document, catalog);
    prune_empty_containers(&mut state);
    assign_edge_containers(&mut state);

    state.diagram
}

fn container_defaults(node: &mut Node, catalog: &CatalogConfig) {
    node.padding = Some(catalog.container_padding());
    node.spacing = Some(catalog.child_spacing);
}

fn app_icon(app: &Application, catalog: &CatalogConfig) -> Option<String> {
    if let Some(tags) = &app.ai_tags {
        if let Some(icon) = tags.icon.as_deref().and_then(|key| catalog.icon_for(key)) {
            return Some(icon);
        }
    }
    let tech = app
        .technology
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    if catalog
        .frontend_technologies
        .iter()
        .any(|name| tech.contains(name))
    {
        return catalog.icon_for("frontend");
    }
    if catalog
        .backend_technologies
        .iter()
        .any(|name| tech.contains(name))
    {
        return catalog.icon_for("backend");
    }
    catalog
        .icon_for(&app.kind)
        .or_else(|| catalog.icon_for("microservice"))
}

fn service_icon(service: &Service, catalog: &CatalogConfig) -> Option<String> {
    let mut icon = catalog.icon_for(service.type_key());
    if let Some(tags) = &service.ai_tags {
        if let Some(tagged) = tags.icon.as_deref().and_then(|key| catalog.icon_for(key)) {
            icon = Some(tagged);
        }
    }
    icon.or_else(|| catalog.icon_for("backend"))
}

/// Pass 1: one node per application and per service, sized and typed by the
/// declared kind.
fn create_leaves(state: &mut PlacementState, document: &Document, catalog: &CatalogConfig) {
    for app in &document.applications {
        let kind = if catalog.is_external(&app.kind) {
            NodeKind::External
        } else {
            NodeKind::Leaf
        };
        let mut node = Node::new(&app.id, &app.name, kind);
        node.width = catalog.sizes.leaf;
        node.height = catalog.sizes.leaf;
        node.icon = app_icon(app, catalog);
        node.title = Some(app.kind.clone());
        state.diagram.insert(node);
    }

    for service in document.services() {
        let key = service.type_key();
        let runs_components = service.runs.as_ref().is_some_and(|runs| !runs.is_empty());
        let mut node = Node::new(service.id.clone(), service.display_name(), NodeKind::Leaf);
        node.width = catalog.sizes.leaf;
        node.height = catalog.sizes.leaf;

        if catalog.is_boundary(key) {
            node.kind = NodeKind::Boundary;
            node.width = catalog.sizes.boundary;
            node.height = catalog.sizes.boundary;
            node.class = Some("aws-vpc".to_string());
            container_defaults(&mut node, catalog);
        } else if catalog.is_isolation(key) {
            let public = service.settings().is_some_and(|cfg| cfg.is_public());
            node.kind = NodeKind::Zone;
            node.width = catalog.sizes.subnet;
            node.height = catalog.sizes.subnet;
            node.class = Some(if public {
                "aws-subnet-public".to_string()
            } else {
                "aws-subnet-private".to_string()
            });
            container_defaults(&mut node, catalog);
        } else if runs_components || catalog.is_compute(key) {
            node.kind = NodeKind::Compute;
            node.width = catalog.sizes.compute_width;
            node.height = catalog.sizes.compute_height;
            node.class = Some("aws-compute-cluster".to_string());
            container_defaults(&mut node, catalog);
        } else if catalog.is_external(key) {
            node.kind = NodeKind::External;
        }

        node.icon = service_icon(service, catalog);
        node.title = Some(
            service
                .description
                .clone()
                .unwrap_or_else(|| key.to_string()),
        );
        state.diagram.insert(node);
    }
}

/// Pass 2: one logical-group container per distinct enrichment group name.
/// Not attached yet; groups that never receive a child are pruned later.
fn discover_groups(state: &mut PlacementState, document: &Document, catalog: &CatalogConfig) {
    let mut names = BTreeSet::new();
    for app in &document.applications {
        if let Some(group) = app.ai_tags.as_ref().and_then(|tags| tags.group.as_deref()) {
            names.insert(group.to_string());
        }
    }
    for service in document.services() {
        if let Some(group) = service
            .ai_tags
            .as_ref()
            .and_then(|tags| tags.group.as_deref())
        {
            names.insert(group.to_string());
        }
    }

    for name in names {
        let id = group_node_id(&name);
        if state.diagram.contains(&id) {
            continue;
        }
        let mut node = Node::new(id, &name, NodeKind::Group);
        node.width = catalog.sizes.group_width;
        node.height = catalog.sizes.group_height;
        node.class = Some("aws-compute-cluster".to_string());
        node.title = Some("Logical Group".to_string());
        container_defaults(&mut node, catalog);
        state.diagram.insert(node);
    }
}

/// Pass 3: explicit containment. A `runs` claim is final; nothing moves a
/// node afterwards.
fn claim_runs(state: &mut PlacementState, document: &Document) {
    for service in document.services() {
        let Some(runs) = &service.runs else {
            continue;
        };
        for child in runs {
            if child == &service.id {
                continue;
            }
            if state.is_placed(child) || !state.diagram.contains(child) {
                continue;
            }
            state.place(child, &service.id);
        }
    }
}

/// Pass 4: a service whose configuration names both an availability zone and
/// a parent boundary gets an implicit zone container `<vpc>-<az>` nested
/// under that boundary, and the zone becomes its parent hint.
fn infer_zones(
    state: &mut PlacementState,
    document: &Document,
    hints: &mut BTreeMap<String, String>,
    catalog: &CatalogConfig,
) {
    for service in document.services() {
        let Some(settings) = service.settings() else {
            continue;
        };
        let (Some(zone), Some(vpc)) = (&settings.availability_zone, &settings.vpc) else {
            continue;
        };

        let zone_id = format!("{vpc}-{zone}");
        if !state.diagram.contains(&zone_id) {
            let mut node = Node::new(zone_id.clone(), format!("AZ: {zone}"), NodeKind::Zone);
            node.width = catalog.sizes.zone;
            node.height = catalog.sizes.zone;
            node.class = Some("aws-az".to_string());
            node.title = Some("Availability Zone".to_string());
            container_defaults(&mut node, catalog);
            state.diagram.insert(node);
            state.synthesized_zones.insert(zone_id.clone());
            if state.diagram.contains(vpc.as_str()) {
                state.place(&zone_id, vpc);
            }
        }
        hints.insert(service.id.clone(), zone_id);
    }
}

/// Pass 5: direct parent references. A singleton subnet list or an explicit
/// vpc resolves; more than one candidate resolves nothing and falls through.
fn direct_parent_hints(document: &Document, hints: &mut BTreeMap<String, String>) {
    for service in document.services() {
        if hints.contains_key(&service.id) {
            continue;
        }
        let settings = service.settings();
        let hint = settings
            .and_then(|cfg| cfg.subnets.as_ref())
            .filter(|subnets| subnets.len() == 1)
            .map(|subnets| subnets[0].clone())
            .or_else(|| settings.and_then(|cfg| cfg.vpc.clone()))
            .or_else(|| {
                service
                    .subnets
                    .as_ref()
                    .filter(|subnets| subnets.len() == 1)
                    .map(|subnets| subnets[0].clone())
            });
        if let Some(parent) = hint {
            hints.insert(service.id.clone(), parent);
        }
    }
}

/// Pass 6: a parent hint pointing at the node itself is discarded.
fn drop_self_parents(hints: &mut BTreeMap<String, String>) {
    hints.retain(|id, parent| id != parent);
}

/// Pass 7: attach every unplaced node whose hinted parent exists. Dangling
/// hints simply leave the node for the fallback passes.
fn attach_resolved(
    state: &mut PlacementState,
    document: &Document,
    hints: &BTreeMap<String, String>,
) {
    for service in document.services() {
        if state.is_placed(&service.id) {
            continue;
        }
        let Some(parent) = hints.get(&service.id) else {
            continue;
        };
        if state.diagram.contains(parent) {
            state.place(&service.id, parent);
        }
    }
}

/// Pass 8: still-unplaced nodes carrying a group annotation join their
/// logical group; the group itself reaches the root on first use.
fn place_group_fallback(state: &mut PlacementState, document: &Document) {
    let mut tagged: Vec<(String, String)> = Vec::new();
    for app in &document.applications {
        if let Some(group) = app.ai_tags.as_ref().and_then(|tags| tags.group.as_deref()) {
            tagged.push((app.id.clone(), group.to_string()));
        }
    }
    for service in document.services() {
        if let Some(group) = service
            .ai_tags
            .as_ref()
            .and_then(|tags| tags.group.as_deref())
        {
            tagged.push((service.id.clone(), group.to_string()));
        }
    }

    for (id, group) in tagged {
        if state.is_placed(&id) {
            continue;
        }
        let group_id = group_node_id(&group);
        if !state.diagram.contains(&group_id) || group_id == id {
            continue;
        }
        if !state.is_placed(&group_id) {
            state.place(&group_id, ROOT_ID);
        }
        state.place(&id, &group_id);
    }
}

/// Pass 9: boundaries are never buried in a bucket, and external actors stay
/// first-class top-level elements.
fn classify_top_level(state: &mut PlacementState) {
    let promote: Vec<String> = state
        .diagram
        .nodes
        .values()
        .filter(|node| node.id != ROOT_ID)
        .filter(|node| matches!(node.kind, NodeKind::Boundary | NodeKind::External))
        .filter(|node| !state.placed.contains(&node.id))
        .map(|node| node.id.clone())
        .collect();
    for id in promote {
        state.place(&id, ROOT_ID);
    }
}

fn ensure_bucket(state: &mut PlacementState, catalog: &CatalogConfig) {
    if state.bucket_created {
        return;
    }
    if !state.diagram.contains(BUCKET_ID) {
        let mut node = Node::new(BUCKET_ID, BUCKET_LABEL, NodeKind::Bucket);
        node.width = catalog.sizes.group_width;
        node.height = catalog.sizes.group_height;
        node.class = Some("aws-compute-cluster".to_string());
        node.title = Some("Shared Services".to_string());
        container_defaults(&mut node, catalog);
        state.diagram.insert(node);
        state.place(BUCKET_ID, ROOT_ID);
    }
    state.bucket_created = true;
}

/// Pass 10: everything still unplaced lands in the shared bucket, created
/// lazily so it never renders empty.
fn place_orphans(state: &mut PlacementState, catalog: &CatalogConfig) {
    let unplaced: Vec<String> = state
        .diagram
        .nodes
        .keys()
        .filter(|id| id.as_str() != ROOT_ID)
        .filter(|id| !state.is_placed(id))
        .filter(|id| {
            let kind = state.diagram.node(id).map(|node| node.kind);
            !matches!(kind, Some(NodeKind::Group) | Some(NodeKind::Bucket))
        })
        .cloned()
        .collect();

    for id in unplaced {
        ensure_bucket(state, catalog);
        state.place(&id, BUCKET_ID);
    }
}

fn external_icon(endpoint: &str, catalog: &CatalogConfig) -> Option<String> {
    let lower = endpoint.to_lowercase();
    let key = if lower.contains("user") {
        "user"
    } else if lower.contains("client") {
        "client"
    } else if lower.contains("frontend") {
        "frontend"
    } else if lower.contains("backend") {
        "backend"
    } else {
        "internet"
    };
    catalog.icon_for(key)
}

/// Pass 11: connection endpoints that reference nothing declared become
/// external-actor leaves attached directly to the root, never nested.
fn add_connections(state: &mut PlacementState, document: &Document, catalog: &CatalogConfig) {
    for connection in &document.connections {
        for endpoint in [&connection.from, &connection.to] {
            if state.diagram.contains(endpoint) {
                continue;
            }
            let mut node = Node::new(endpoint.clone(), endpoint.clone(), NodeKind::External);
            node.width = catalog.sizes.leaf;
            node.height = catalog.sizes.leaf;
            node.icon = external_icon(endpoint, catalog);
            node.title = Some("External System".to_string());
            state.diagram.insert(node);
            state.place(endpoint, ROOT_ID);
        }

        state.diagram.edges.push(Edge {
            id: connection.edge_id(),
            from: connection.from.clone(),
            to: connection.to.clone(),
            label: connection.label.clone(),
            container: None,
            sections: Vec::new(),
        });
    }
}

/// Pass 12: implicit containers that ended up childless are dropped.
fn prune_empty_containers(state: &mut PlacementState) {
    let empty_groups: Vec<String> = state
        .diagram
        .nodes
        .values()
        .filter(|node| node.kind == NodeKind::Group && node.children.is_empty())
        .map(|node| node.id.clone())
        .collect();
    for id in empty_groups {
        detach_and_remove(state, &id);
    }

    let empty_zones: Vec<String> = state
        .synthesized_zones
        .iter()
        .filter(|id| {
            state
                .diagram
                .node(id)
                .is_some_and(|node| node.children.is_empty())
        })
        .cloned()
        .collect();
    for id in empty_zones {
        detach_and_remove(state, &id);
    }
}

fn detach_and_remove(state: &mut PlacementState, id: &str) {
    let parent = state
        .diagram
        .node(id)
        .and_then(|node| node.parent.clone());
    if let Some(parent) = parent {
        if let Some(parent_node) = state.diagram.node_mut(&parent) {
            parent_node.children.retain(|child| child != id);
        }
    }
    state.diagram.nodes.remove(id);
    state.placed.remove(id);
}

/// Every edge belongs to the lowest container that is an ancestor of both
/// endpoints; the root when there is none.
fn assign_edge_containers(state: &mut PlacementState) {
    let containers: Vec<Option<String>> = state
        .diagram
        .edges
        .iter()
        .map(|edge| {
            Some(
                state
                    .diagram
                    .lowest_common_container(&edge.from, &edge.to),
            )
        })
        .collect();
    for (edge, container) in state.diagram.edges.iter_mut().zip(containers) {
        edge.container = container;
    }
}
