//! JSON persistence of a built network.
//!
//! The network is written once after a build and loaded read-only on later
//! start-ups. The spatial index and station lookup are not stored; they are
//! rebuilt on load.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{InconsistentNetwork, Network};

/// Error while persisting or loading a network.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("network file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("network file is not valid: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Inconsistent(#[from] InconsistentNetwork),
}

/// A network file on disk.
#[derive(Debug, Clone)]
pub struct NetworkStore {
    path: PathBuf,
}

impl NetworkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write the network, replacing any earlier file.
    ///
    /// The file is written next to its final location and renamed into
    /// place, so readers never see a partial network.
    pub fn save(&self, network: &Network) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, network)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp, &self.path)?;

        info!(path = %self.path.display(), nodes = network.graph.node_count(), "Saved network");
        Ok(())
    }

    /// Load and validate a stored network.
    pub fn load(&self) -> Result<Network, StoreError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let network: Network = serde_json::from_reader(reader)?;
        let network = network.restore();
        network.validate()?;

        debug!(path = %self.path.display(), built_at = %network.built_at, "Loaded network");
        Ok(network)
    }

    /// Load the stored network if there is one.
    pub fn load_existing(&self) -> Result<Option<Network>, StoreError> {
        if !self.exists() {
            return Ok(None);
        }
        self.load().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coord, FeedId, StopKey};
    use crate::feed::TransferKind;
    use crate::graph::{EdgeKind, Graph, NodeKind, Timetable};
    use crate::index;
    use crate::network::ResolvedTransfer;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn sample() -> Network {
        let mut graph = Graph::new();
        let street = graph.add_node(Coord::new(52.0, 0.0), NodeKind::Street);
        let other = graph.add_node(Coord::new(52.0, 0.001), NodeKind::Street);
        graph.add_street(street, other, 68.5);
        let stop = StopKey::new(FeedId::numbered(0), "S1");
        let station = graph.add_node(Coord::new(52.0, 0.0), NodeKind::Station { stop: stop.clone() });
        graph.add_edge(street, station, EdgeKind::Access { secs: 0 });
        graph.add_edge(station, street, EdgeKind::Egress { secs: 0 });

        let transfers = vec![ResolvedTransfer {
            from: stop.clone(),
            to: stop,
            kind: TransferKind::MinimumTime,
            secs: Some(0),
        }];
        let index = index::complete(&graph);
        let built_at = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        Network::new(graph, Timetable::new(), transfers, index, built_at)
    }

    #[test]
    fn save_then_load_restores_lookups() {
        let dir = tempdir().unwrap();
        let store = NetworkStore::new(dir.path().join("network.json"));
        assert!(!store.exists());

        let network = sample();
        store.save(&network).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.summary(), network.summary());
        assert_eq!(loaded.transfers, network.transfers);
        let key = StopKey::new(FeedId::numbered(0), "S1");
        assert_eq!(loaded.station(&key), network.station(&key));
        assert!(loaded.snap(Coord::new(52.0, 0.0)).is_some());
    }

    #[test]
    fn missing_file_is_not_an_error_for_load_existing() {
        let dir = tempdir().unwrap();
        let store = NetworkStore::new(dir.path().join("absent.json"));
        assert!(store.load_existing().unwrap().is_none());
        assert!(matches!(store.load(), Err(StoreError::Io(_))));
    }

    #[test]
    fn corrupt_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("network.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = NetworkStore::new(path);
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let store = NetworkStore::new(dir.path().join("nested/deeper/network.json"));
        store.save(&sample()).unwrap();
        assert!(store.exists());
    }
}
