//! Connection-aware grid layout for services outside the VPC.
//!
//! Rather than a full graph layout, services are placed on a grid in
//! descending connection-degree order, and each service type tries to sit
//! adjacent to an already-placed type it connects to. This keeps related
//! services visually close at a fraction of the cost of force-directed or
//! layered algorithms.

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};
use petgraph::graphmap::UnGraphMap;
use topograph_core::Position;

use crate::aggregate::{LogicalConnection, LogicalService};
use crate::layout::sizing::Sizing;

/// Place `services` on the grid starting at `(start_x, start_y)`.
///
/// Returns the Y coordinate just below the occupied rows.
pub(crate) fn layout_by_connections(
    services: &[&LogicalService<'_>],
    connections: &[LogicalConnection],
    start_x: f32,
    start_y: f32,
    available_width: f32,
    sizing: &Sizing,
    positions: &mut IndexMap<String, Position>,
) -> f32 {
    if services.is_empty() {
        return start_y;
    }

    let graph = connection_graph(services, connections);

    let mut by_type: IndexMap<&str, Vec<&LogicalService<'_>>> = IndexMap::new();
    for &service in services {
        by_type
            .entry(service.service_type.as_str())
            .or_default()
            .push(service);
    }

    // Most-connected types first; ties keep insertion order (stable sort).
    let mut sorted_types: Vec<&str> = by_type.keys().copied().collect();
    sorted_types.sort_by_key(|&t| std::cmp::Reverse(graph.neighbors(t).count()));

    let cols = ((available_width / sizing.cell_width) as i32).max(1);

    let mut placed: HashMap<&str, (i32, i32)> = HashMap::new();
    let mut occupied: HashSet<(i32, i32)> = HashSet::new();
    let mut current_row = 0i32;
    let mut current_col = 0i32;

    for service_type in sorted_types {
        let type_services = &by_type[service_type];

        let mut best_row = current_row;
        let mut best_col = current_col;

        // Seek a free cell adjacent to the first already-placed neighbor.
        for neighbor in graph.neighbors(service_type) {
            let Some(&(n_row, n_col)) = placed.get(neighbor) else {
                continue;
            };
            let candidates = [
                (n_row, n_col + 1),
                (n_row + 1, n_col),
                (n_row, n_col - 1),
                (n_row + 1, n_col + 1),
            ];
            for (row, col) in candidates {
                if col >= 0 && col < cols && !occupied.contains(&(row, col)) {
                    best_row = row;
                    best_col = col;
                    break;
                }
            }
            break;
        }

        if best_col >= cols {
            best_col = 0;
            best_row = current_row + 1;
        }

        for (i, service) in type_services.iter().enumerate() {
            let mut col = best_col + i as i32;
            let mut row = best_row;
            if col >= cols {
                row += (best_col + i as i32) / cols;
                col %= cols;
            }

            positions.insert(
                service.id(),
                Position::new(
                    start_x + col as f32 * sizing.cell_width,
                    start_y + row as f32 * sizing.cell_height,
                    sizing.config.icon_size,
                    sizing.config.icon_size,
                ),
            );
            occupied.insert((row, col));
            current_row = current_row.max(row);
        }

        placed.insert(service_type, (best_row, best_col));

        if best_col + type_services.len() as i32 >= cols {
            current_row = best_row + 1;
            current_col = 0;
        } else {
            current_col = best_col + type_services.len() as i32;
        }
    }

    start_y + (current_row + 1) as f32 * sizing.cell_height + sizing.row_gap
}

/// Estimated height of the organic grid, mirroring the row-wrap rule.
pub(crate) fn estimated_height(
    service_count: usize,
    available_width: f32,
    sizing: &Sizing,
) -> f32 {
    if service_count == 0 {
        return 0.0;
    }
    let cols = ((available_width / sizing.cell_width) as usize).max(1);
    let rows = service_count.div_ceil(cols);
    rows as f32 * sizing.cell_height + sizing.section_gap
}

/// Bidirectional service-type adjacency from the derived connections.
///
/// Service ids encode the type as their first dot segment for grouped
/// services; de-grouped (VPC) services never reach this layout.
fn connection_graph<'g>(
    services: &'g [&LogicalService<'_>],
    connections: &'g [LogicalConnection],
) -> UnGraphMap<&'g str, ()> {
    let present: IndexSet<&'g str> = services
        .iter()
        .map(|s| s.service_type.as_str())
        .collect();

    let mut graph: UnGraphMap<&'g str, ()> = UnGraphMap::new();
    for &service_type in &present {
        graph.add_node(service_type);
    }
    for connection in connections {
        let source = leading_segment(&connection.source_id);
        let target = leading_segment(&connection.target_id);
        if source != target && present.contains(source) && present.contains(target) {
            graph.add_edge(source, target, ());
        }
    }
    graph
}

fn leading_segment(id: &str) -> &str {
    id.split('.').next().unwrap_or(id)
}
