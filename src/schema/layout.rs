//! Entity diagram layout and Graphviz rendering

use serde::Serialize;

use super::relations::RelationshipEdge;
use super::scan::SchemaMap;

pub const BOX_WIDTH: u32 = 200;
pub const BOX_GAP: u32 = 50;
pub const ROW_LIMIT: u32 = 1000;
const HEADER_HEIGHT: u32 = 35;
const FIELD_HEIGHT: u32 = 20;

/// Position and size of one collection's box
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityBox {
    pub collection: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Boxes of every collection plus the edges between them
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagramLayout {
    pub boxes: Vec<EntityBox>,
    pub edges: Vec<RelationshipEdge>,
}

/// Lay the collections out left to right, wrapping rows past the limit
pub fn layout_schema(schema: &SchemaMap, edges: &[RelationshipEdge]) -> DiagramLayout {
    let mut boxes = Vec::with_capacity(schema.len());
    let (mut x, mut y) = (0u32, 0u32);
    let mut row_height = 0u32;

    for (collection, fields) in schema {
        let height = HEADER_HEIGHT + FIELD_HEIGHT * fields.len() as u32;
        boxes.push(EntityBox {
            collection: collection.clone(),
            x,
            y,
            width: BOX_WIDTH,
            height,
        });

        row_height = row_height.max(height);
        x += BOX_WIDTH + BOX_GAP;
        if x > ROW_LIMIT {
            x = 0;
            y += row_height + BOX_GAP;
            row_height = 0;
        }
    }

    DiagramLayout {
        boxes,
        edges: edges.to_vec(),
    }
}

fn escape_record(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '{' | '}' | '|' | '<' | '>' | '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Render the diagram as a Graphviz DOT digraph
///
/// Nodes are records listing `field : type` with pinned positions (points,
/// y flipped so the first row is at the top); use `neato -n` to keep them.
pub fn to_dot(schema: &SchemaMap, layout: &DiagramLayout) -> String {
    let bottom = layout
        .boxes
        .iter()
        .map(|b| b.y + b.height)
        .max()
        .unwrap_or(0);

    let mut dot = String::from("digraph schema {\n");
    dot.push_str("  node [shape=record, fontname=\"Helvetica\"];\n");

    for entity in &layout.boxes {
        let mut label = escape_record(&entity.collection);
        if let Some(fields) = schema.get(&entity.collection) {
            label.push('|');
            let rows: Vec<String> = fields
                .iter()
                .map(|(field, ty)| format!("{} : {}", escape_record(field), escape_record(ty)))
                .collect();
            label.push_str(&rows.join("\\l"));
            label.push_str("\\l");
        }
        dot.push_str(&format!(
            "  \"{}\" [label=\"{{{}}}\", pos=\"{},{}!\"];\n",
            entity.collection.replace('"', "\\\""),
            label,
            entity.x + entity.width / 2,
            bottom - entity.y - entity.height / 2,
        ));
    }

    for edge in &layout.edges {
        dot.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
            edge.source.replace('"', "\\\""),
            edge.target.replace('"', "\\\""),
            edge.field.replace('"', "\\\""),
        ));
    }

    dot.push_str("}\n");
    dot
}
