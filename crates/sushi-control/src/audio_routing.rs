//! Audio channel routing table: engine channel <-> track channel
//! connections (spec.md §4.G AudioRouting).
//!
//! Mirrors `sushi-midi::routing::RoutingTables`'s connect/disconnect
//! contract, scaled down to the single input/output connection list the
//! engine state needs (spec.md §4.J: "all audio connections").

use parking_lot::RwLock;

use crate::status::ControlStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConnection {
    pub engine_channel: usize,
    pub track: u32,
    pub track_channel: usize,
}

#[derive(Default)]
pub struct AudioRoutingTable {
    inputs: RwLock<Vec<AudioConnection>>,
    outputs: RwLock<Vec<AudioConnection>>,
}

impl AudioRoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_connections(&self) -> Vec<AudioConnection> {
        self.inputs.read().clone()
    }

    pub fn output_connections(&self) -> Vec<AudioConnection> {
        self.outputs.read().clone()
    }

    pub fn connect_input_channel_to_track(&self, engine_channel: usize, track: u32, track_channel: usize) -> ControlStatus {
        Self::connect(&self.inputs, engine_channel, track, track_channel)
    }

    pub fn connect_output_channel_to_track(&self, engine_channel: usize, track: u32, track_channel: usize) -> ControlStatus {
        Self::connect(&self.outputs, engine_channel, track, track_channel)
    }

    pub fn disconnect_input(&self, engine_channel: usize, track: u32, track_channel: usize) -> ControlStatus {
        Self::disconnect(&self.inputs, engine_channel, track, track_channel)
    }

    pub fn disconnect_output(&self, engine_channel: usize, track: u32, track_channel: usize) -> ControlStatus {
        Self::disconnect(&self.outputs, engine_channel, track, track_channel)
    }

    /// Disconnect every input row for `track`, issuing one call per row and
    /// accumulating the worst status (spec.md §4.G: "Batched per-track
    /// disconnects iterate the current connection list... accumulating the
    /// worst status").
    pub fn disconnect_all_inputs_from_track(&self, track: u32) -> ControlStatus {
        Self::disconnect_all(&self.inputs, track)
    }

    pub fn disconnect_all_outputs_from_track(&self, track: u32) -> ControlStatus {
        Self::disconnect_all(&self.outputs, track)
    }

    /// Remove every row referencing `track`, with no status accumulation
    /// (used by track deletion's graph cascade).
    pub fn remove_all_routes_for_track(&self, track: u32) {
        self.inputs.write().retain(|c| c.track != track);
        self.outputs.write().retain(|c| c.track != track);
    }

    fn connect(table: &RwLock<Vec<AudioConnection>>, engine_channel: usize, track: u32, track_channel: usize) -> ControlStatus {
        let mut rows = table.write();
        let conn = AudioConnection { engine_channel, track, track_channel };
        if rows.contains(&conn) {
            return ControlStatus::Ok;
        }
        rows.push(conn);
        ControlStatus::Ok
    }

    fn disconnect(table: &RwLock<Vec<AudioConnection>>, engine_channel: usize, track: u32, track_channel: usize) -> ControlStatus {
        let mut rows = table.write();
        let before = rows.len();
        rows.retain(|c| !(c.engine_channel == engine_channel && c.track == track && c.track_channel == track_channel));
        if rows.len() == before {
            ControlStatus::NotFound
        } else {
            ControlStatus::Ok
        }
    }

    fn disconnect_all(table: &RwLock<Vec<AudioConnection>>, track: u32) -> ControlStatus {
        let rows: Vec<AudioConnection> = table.read().iter().filter(|c| c.track == track).copied().collect();
        let mut worst = ControlStatus::Ok;
        for row in rows {
            let status = Self::disconnect(table, row.engine_channel, row.track, row.track_channel);
            worst = worst.worse_of(status);
        }
        worst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_is_idempotent() {
        let t = AudioRoutingTable::new();
        assert_eq!(t.connect_input_channel_to_track(0, 1, 0), ControlStatus::Ok);
        assert_eq!(t.connect_input_channel_to_track(0, 1, 0), ControlStatus::Ok);
        assert_eq!(t.input_connections().len(), 1);
    }

    #[test]
    fn disconnect_missing_reports_not_found() {
        let t = AudioRoutingTable::new();
        assert_eq!(t.disconnect_input(0, 1, 0), ControlStatus::NotFound);
    }

    #[test]
    fn disconnect_all_from_track_clears_every_row() {
        let t = AudioRoutingTable::new();
        t.connect_input_channel_to_track(0, 1, 0);
        t.connect_input_channel_to_track(1, 1, 1);
        t.connect_input_channel_to_track(2, 2, 0);
        assert_eq!(t.disconnect_all_inputs_from_track(1), ControlStatus::Ok);
        let remaining = t.input_connections();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].track, 2);
    }
}
