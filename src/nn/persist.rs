//! Text persistence of network weights.
//!
//! ## Format
//!
//! ```text
//! #<generation>
//! w00,w01,…      one line per output unit of layer 0
//! /              layer separator
//! …              layer 1, …
//! /
//! ```
//!
//! Layer shapes are not stored. Each layer's input width is the width of
//! its first row and its output width is its row count, so a file fully
//! determines its own topology.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::SimRng;
use crate::error::{NetworkResult, PersistError};
use crate::training::CheckpointStore;

use super::layer::Layer;
use super::network::Network;

const LAYER_SEPARATOR: &str = "/";
const COUNTER_PREFIX: char = '#';

/// How to treat a persisted network whose topology differs from the one
/// the caller asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopologyPolicy {
    /// Keep the persisted network and its shape, with a warning.
    #[default]
    Adopt,
    /// Discard the persisted network and start fresh, with a warning.
    Reject,
}

/// Where a loaded network came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkOrigin {
    /// Parsed from the store with the requested topology.
    Restored,
    /// Parsed from the store with a different topology (policy `Adopt`).
    RestoredWithForeignTopology,
    /// Freshly initialised.
    Fresh,
}

/// Result of [`load_or_init`].
#[derive(Clone, Debug)]
pub struct LoadedNetwork {
    pub network: Network,
    pub generation: u64,
    pub origin: NetworkOrigin,
}

impl Network {
    /// Serialise all weights together with the generation counter.
    ///
    /// Weights use the shortest representation that parses back to the same
    /// `f32`, so the round trip is exact.
    #[must_use]
    pub fn to_text(&self, generation: u64) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{COUNTER_PREFIX}{generation}");
        for layer in self.layers() {
            for i in 0..layer.num_outputs() {
                let row = layer.row(i);
                for (j, w) in row.iter().enumerate() {
                    if j > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{w}");
                }
                out.push('\n');
            }
            out.push_str(LAYER_SEPARATOR);
            out.push('\n');
        }
        out
    }

    /// Rebuild a network and its generation counter from [`Network::to_text`] output.
    ///
    /// Tolerates a missing `#`, trailing commas and blank lines.
    pub fn from_text(text: &str, learning_rate: f32) -> Result<(Network, u64), PersistError> {
        let mut lines = text.lines().enumerate();

        let (_, header) = lines
            .by_ref()
            .find(|(_, l)| !l.trim().is_empty())
            .ok_or(PersistError::Empty)?;
        let counter = header.trim().trim_start_matches(COUNTER_PREFIX);
        let generation = counter
            .parse::<u64>()
            .map_err(|_| PersistError::BadCounter(header.to_string()))?;

        let mut layers: Vec<Layer> = Vec::new();
        let mut rows: Vec<f32> = Vec::new();
        let mut width = 0usize;
        let mut row_count = 0usize;

        for (index, raw) in lines {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if line == LAYER_SEPARATOR {
                if row_count > 0 {
                    if let Some(prev) = layers.last() {
                        if prev.num_outputs() != width {
                            return Err(PersistError::BrokenChain {
                                layer: layers.len(),
                                expected: width,
                                actual: prev.num_outputs(),
                            });
                        }
                    }
                    layers.push(Layer::from_weights(
                        width,
                        row_count,
                        std::mem::take(&mut rows),
                    )?);
                    row_count = 0;
                }
                continue;
            }

            let start = rows.len();
            for value in line.split(',').map(str::trim).filter(|v| !v.is_empty()) {
                let w = value.parse::<f32>().map_err(|_| PersistError::BadWeight {
                    line: line_no,
                    value: value.to_string(),
                })?;
                rows.push(w);
            }
            let found = rows.len() - start;
            if row_count == 0 {
                width = found;
            } else if found != width {
                return Err(PersistError::RaggedLayer {
                    line: line_no,
                    expected: width,
                    actual: found,
                });
            }
            if found == 0 {
                return Err(PersistError::RaggedLayer {
                    line: line_no,
                    expected: width.max(1),
                    actual: 0,
                });
            }
            row_count += 1;
        }

        // Rows after the last separator form an unterminated layer; ignore them.
        if layers.is_empty() {
            return Err(PersistError::NoLayers);
        }
        Ok((Network::from_layers(layers, learning_rate)?, generation))
    }
}

/// Load the network from `store`, falling back to a fresh random network.
///
/// Missing or malformed data is recoverable: it is logged and a new network
/// with generation 0 is returned. A persisted network with a different
/// topology is handled according to `policy`.
pub fn load_or_init<S: CheckpointStore + ?Sized>(
    store: &S,
    topology: &[usize],
    learning_rate: f32,
    policy: TopologyPolicy,
    rng: &mut SimRng,
) -> NetworkResult<LoadedNetwork> {
    let parsed = match store.load() {
        Ok(Some(text)) => match Network::from_text(&text, learning_rate) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!(store = %store.describe(), error = %err, "malformed network, starting with random weights");
                None
            }
        },
        Ok(None) => {
            warn!(store = %store.describe(), "no persisted network, starting with random weights");
            None
        }
        Err(err) => {
            warn!(store = %store.describe(), error = %err, "could not read network, starting with random weights");
            None
        }
    };

    if let Some((network, generation)) = parsed {
        let found = network.topology();
        if found == topology {
            return Ok(LoadedNetwork {
                network,
                generation,
                origin: NetworkOrigin::Restored,
            });
        }
        match policy {
            TopologyPolicy::Adopt => {
                warn!(requested = ?topology, persisted = ?found, "persisted topology differs from configuration, adopting persisted network");
                return Ok(LoadedNetwork {
                    network,
                    generation,
                    origin: NetworkOrigin::RestoredWithForeignTopology,
                });
            }
            TopologyPolicy::Reject => {
                warn!(requested = ?topology, persisted = ?found, "persisted topology differs from configuration, discarding it");
            }
        }
    }

    Ok(LoadedNetwork {
        network: Network::new(topology, learning_rate, rng)?,
        generation: 0,
        origin: NetworkOrigin::Fresh,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::MemoryStore;

    fn sample() -> Network {
        Network::new(&[3, 4, 2], 0.02, &mut SimRng::new(5)).unwrap()
    }

    #[test]
    fn test_text_layout() {
        let layers = vec![
            Layer::from_weights(2, 1, vec![0.5, -1.25]).unwrap(),
            Layer::from_weights(1, 2, vec![3.0, 0.1]).unwrap(),
        ];
        let net = Network::from_layers(layers, 0.1).unwrap();
        assert_eq!(net.to_text(7), "#7\n0.5,-1.25\n/\n3\n0.1\n/\n");
    }

    #[test]
    fn test_round_trip_is_exact() {
        let net = sample();
        let (parsed, generation) = Network::from_text(&net.to_text(12), 0.02).unwrap();
        assert_eq!(generation, 12);
        assert!(parsed.same_weights(&net));
        assert_eq!(parsed.topology(), vec![3, 4, 2]);
    }

    #[test]
    fn test_accepts_legacy_trailing_commas() {
        let text = "#3\n0.5,0.25,\n-0.5,1,\n/\n2,-2,\n/\n";
        let (net, generation) = Network::from_text(text, 0.1).unwrap();
        assert_eq!(generation, 3);
        assert_eq!(net.topology(), vec![2, 2, 1]);
        assert_eq!(net.layers()[0].row(1), &[-0.5, 1.0]);
    }

    #[test]
    fn test_counter_without_prefix() {
        let (_, generation) = Network::from_text("9\n1,2\n/\n", 0.1).unwrap();
        assert_eq!(generation, 9);
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(matches!(Network::from_text("", 0.1), Err(PersistError::Empty)));
        assert!(matches!(
            Network::from_text("#x\n1\n/\n", 0.1),
            Err(PersistError::BadCounter(_))
        ));
        assert!(matches!(
            Network::from_text("#1\n1,abc\n/\n", 0.1),
            Err(PersistError::BadWeight { line: 2, .. })
        ));
        assert!(matches!(
            Network::from_text("#1\n1,2\n3\n/\n", 0.1),
            Err(PersistError::RaggedLayer { line: 3, expected: 2, actual: 1 })
        ));
        assert!(matches!(
            Network::from_text("#1\n", 0.1),
            Err(PersistError::NoLayers)
        ));
        // Layer 0 has 1 output but layer 1 rows are 2 wide.
        assert!(matches!(
            Network::from_text("#1\n1,2\n/\n1,2\n/\n", 0.1),
            Err(PersistError::BrokenChain { layer: 1, .. })
        ));
    }

    #[test]
    fn test_load_or_init_restores() {
        let net = sample();
        let store = MemoryStore::with_contents(net.to_text(4));
        let loaded = load_or_init(&store, &[3, 4, 2], 0.02, TopologyPolicy::Adopt, &mut SimRng::new(1)).unwrap();
        assert_eq!(loaded.origin, NetworkOrigin::Restored);
        assert_eq!(loaded.generation, 4);
        assert!(loaded.network.same_weights(&net));
    }

    #[test]
    fn test_load_or_init_falls_back_on_garbage() {
        let store = MemoryStore::with_contents("definitely not weights");
        let loaded = load_or_init(&store, &[3, 2], 0.02, TopologyPolicy::Adopt, &mut SimRng::new(1)).unwrap();
        assert_eq!(loaded.origin, NetworkOrigin::Fresh);
        assert_eq!(loaded.generation, 0);
        assert_eq!(loaded.network.topology(), vec![3, 2]);
    }

    #[test]
    fn test_load_or_init_falls_back_when_absent() {
        let store = MemoryStore::new();
        let loaded = load_or_init(&store, &[3, 2], 0.02, TopologyPolicy::Adopt, &mut SimRng::new(1)).unwrap();
        assert_eq!(loaded.origin, NetworkOrigin::Fresh);
    }

    #[test]
    fn test_topology_policy() {
        let store = MemoryStore::with_contents(sample().to_text(2));

        let adopted = load_or_init(&store, &[3, 8, 2], 0.02, TopologyPolicy::Adopt, &mut SimRng::new(1)).unwrap();
        assert_eq!(adopted.origin, NetworkOrigin::RestoredWithForeignTopology);
        assert_eq!(adopted.network.topology(), vec![3, 4, 2]);
        assert_eq!(adopted.generation, 2);

        let rejected = load_or_init(&store, &[3, 8, 2], 0.02, TopologyPolicy::Reject, &mut SimRng::new(1)).unwrap();
        assert_eq!(rejected.origin, NetworkOrigin::Fresh);
        assert_eq!(rejected.network.topology(), vec![3, 8, 2]);
        assert_eq!(rejected.generation, 0);
    }
}
