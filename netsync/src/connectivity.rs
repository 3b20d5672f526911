//! Connectivity Index
//!
//! Graph of the copper items that matter for netlist updates: pads, copper
//! zones and vias. A zone is linked to every pad and via of its own net that
//! it covers on a shared layer, which is enough to answer "which pads does
//! this zone reach" without the full track-level connectivity engine.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::board::{Board, Footprint, Via, Zone, UNCONNECTED};

/// Where a footprint lives during a pass
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FootprintHandle {
    /// Index into `Board::footprints`
    Board(usize),
    /// Index into the footprints staged by the current pass
    Staged(usize),
}

/// Stable identity of one pad for the duration of a pass
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PadRef {
    pub footprint: FootprintHandle,
    pub pad: usize,
}

impl PadRef {
    pub fn new(footprint: FootprintHandle, pad: usize) -> Self {
        Self { footprint, pad }
    }
}

/// Node type in the connectivity graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnNode {
    Pad(PadRef),
    /// Index into `Board::zones`
    Zone(usize),
    /// Index into `Board::vias`
    Via(usize),
}

impl ConnNode {
    pub fn as_pad(&self) -> Option<PadRef> {
        match self {
            ConnNode::Pad(p) => Some(*p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectivityStats {
    pub pad_count: usize,
    pub zone_count: usize,
    pub via_count: usize,
    pub connection_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectivityIndex {
    graph: UnGraph<ConnNode, ()>,
    pads: Vec<PadRef>,
    zone_nodes: HashMap<usize, NodeIndex>,
}

impl ConnectivityIndex {
    /// Index of the board as it is
    pub fn from_board(board: &Board) -> Self {
        Self::build(
            board
                .footprints
                .iter()
                .enumerate()
                .map(|(i, fp)| (FootprintHandle::Board(i), fp)),
            &board.zones,
            &board.vias,
        )
    }

    /// Index over an explicit footprint view, e.g. the board with staged
    /// replacements substituted.
    pub fn build<'a>(
        footprints: impl IntoIterator<Item = (FootprintHandle, &'a Footprint)>,
        zones: &[Zone],
        vias: &[Via],
    ) -> Self {
        let mut index = Self::default();

        let zone_nodes: Vec<(usize, NodeIndex)> = zones
            .iter()
            .enumerate()
            .map(|(i, _)| (i, index.graph.add_node(ConnNode::Zone(i))))
            .collect();
        index.zone_nodes = zone_nodes.iter().copied().collect();

        for (handle, fp) in footprints {
            for (pad_index, pad) in fp.pads.iter().enumerate() {
                let pad_ref = PadRef::new(handle, pad_index);
                let node = index.graph.add_node(ConnNode::Pad(pad_ref));
                index.pads.push(pad_ref);

                if pad.net == UNCONNECTED || !pad.is_on_copper_layer() {
                    continue;
                }
                let at = fp.pad_position(pad);
                for &(zi, zone_node) in &zone_nodes {
                    let zone = &zones[zi];
                    if zone.net == pad.net
                        && zone.is_copper_fill()
                        && zone.shares_layer(&pad.layers)
                        && zone.contains(&at)
                    {
                        index.graph.add_edge(zone_node, node, ());
                    }
                }
            }
        }

        for (vi, via) in vias.iter().enumerate() {
            let node = index.graph.add_node(ConnNode::Via(vi));
            if via.net == UNCONNECTED {
                continue;
            }
            for &(zi, zone_node) in &zone_nodes {
                let zone = &zones[zi];
                if zone.net == via.net && zone.is_copper_fill() && zone.contains(&via.position) {
                    index.graph.add_edge(zone_node, node, ());
                }
            }
        }

        index
    }

    /// Every pad in the index, in view order
    pub fn pads(&self) -> &[PadRef] {
        &self.pads
    }

    /// Pads reachable from a zone
    pub fn connected_pads(&self, zone: usize) -> Vec<PadRef> {
        let Some(&start) = self.zone_nodes.get(&zone) else {
            return Vec::new();
        };
        let mut pads = Vec::new();
        let mut bfs = Bfs::new(&self.graph, start);
        while let Some(node) = bfs.next(&self.graph) {
            if let Some(pad) = self.graph[node].as_pad() {
                pads.push(pad);
            }
        }
        pads.sort();
        pads
    }

    pub fn stats(&self) -> ConnectivityStats {
        let zone_count = self.zone_nodes.len();
        let pad_count = self.pads.len();
        ConnectivityStats {
            pad_count,
            zone_count,
            via_count: self.graph.node_count() - pad_count - zone_count,
            connection_count: self.graph.edge_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{FootprintId, NetInfo, Pad, Position};

    fn board() -> Board {
        let mut board = Board::new();
        board.nets.add(NetInfo::new(1, "GND"));
        board.nets.add(NetInfo::new(2, "VCC"));

        let mut fp = Footprint::new("R1", FootprintId::parse("R:R"));
        fp.position = Position::new(5.0, 5.0);
        let mut p1 = Pad::new("1", &["F.Cu"]);
        p1.net = 1;
        let mut p2 = Pad::new("2", &["F.Cu"]);
        p2.net = 2;
        board.footprints.push(fp.with_pad(p1).with_pad(p2));

        let mut outside = Footprint::new("R2", FootprintId::parse("R:R"));
        outside.position = Position::new(50.0, 50.0);
        let mut p = Pad::new("1", &["F.Cu"]);
        p.net = 1;
        board.footprints.push(outside.with_pad(p));

        let mut zone = Zone::new(1, &["F.Cu"]);
        zone.outline = vec![
            Position::new(0.0, 0.0),
            Position::new(10.0, 0.0),
            Position::new(10.0, 10.0),
            Position::new(0.0, 10.0),
        ];
        board.zones.push(zone);
        board
    }

    #[test]
    fn test_zone_reaches_same_net_pads_inside() {
        let index = ConnectivityIndex::from_board(&board());
        let pads = index.connected_pads(0);
        assert_eq!(pads, vec![PadRef::new(FootprintHandle::Board(0), 0)]);
        assert_eq!(index.pads().len(), 3);
    }

    #[test]
    fn test_rule_area_connects_nothing() {
        let mut board = board();
        board.zones[0].is_rule_area = true;
        let index = ConnectivityIndex::from_board(&board);
        assert!(index.connected_pads(0).is_empty());
        assert!(index.connected_pads(7).is_empty());
    }

    #[test]
    fn test_stats() {
        let mut board = board();
        board.vias.push(Via::new(1, Position::new(2.0, 2.0)));
        let stats = ConnectivityIndex::from_board(&board).stats();
        assert_eq!(stats.pad_count, 3);
        assert_eq!(stats.zone_count, 1);
        assert_eq!(stats.via_count, 1);
        assert_eq!(stats.connection_count, 2);
    }
}
