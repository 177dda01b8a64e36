use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::geometry::{Point, Route, Size};
use crate::incremental::IncrementalLayoutCalculator;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub nodes: Vec<NodeDump>,
    pub connectors: Vec<ConnectorDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: u64,
    pub name: String,
    pub layer: usize,
    pub index: usize,
    pub center: Option<Point>,
    pub size: Size,
}

#[derive(Debug, Serialize)]
pub struct ConnectorDump {
    pub id: u64,
    pub path_length: usize,
    pub route: Option<Route>,
}

impl LayoutDump {
    pub fn from_calculator(calculator: &IncrementalLayoutCalculator) -> Self {
        let nodes = calculator
            .node_ids()
            .map(|node| {
                let (layer, index) = calculator.node_location(node).unwrap_or((0, 0));
                NodeDump {
                    id: node.0,
                    name: calculator.node_name(node).unwrap_or_default().to_string(),
                    layer,
                    index,
                    center: calculator.node_center(node).filter(Point::is_defined),
                    size: calculator.node_size(node).unwrap_or(Size::ZERO),
                }
            })
            .collect();

        let connectors = calculator
            .connector_ids()
            .map(|connector| ConnectorDump {
                id: connector.0,
                path_length: calculator.connector_path_length(connector).unwrap_or(0),
                route: calculator
                    .connector_route(connector)
                    .filter(|r| r.is_defined())
                    .cloned(),
            })
            .collect();

        LayoutDump { nodes, connectors }
    }
}

/// Writes the current layout state as pretty JSON, for debugging and for
/// golden-file comparisons in host test suites.
pub fn write_layout_dump(
    path: &Path,
    calculator: &IncrementalLayoutCalculator,
) -> std::io::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_calculator(calculator);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
