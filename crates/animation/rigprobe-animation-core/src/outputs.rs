//! Output contracts from a graph evaluation.
//!
//! Each `evaluate` call produces the list of semantic events raised during that
//! tick. The evaluated pose itself stays owned by the graph (`PlayableGraph::pose`).

use serde::{Deserialize, Serialize};

use crate::ids::{BoneId, GraphId};
use rigprobe_api_core::TransformChannel;

/// Discrete signals raised while driving a graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum GraphEvent {
    Played {
        graph: GraphId,
    },
    Stopped {
        graph: GraphId,
    },
    /// Clip time wrapped (Loop) or reversed (PingPong).
    Looped {
        graph: GraphId,
        tick: u64,
    },
    /// The host discarded a stream write because the skeleton does not carry
    /// that channel for the bone.
    WriteDropped {
        bone: BoneId,
        channel: TransformChannel,
        tick: u64,
    },
    Destroyed {
        graph: GraphId,
    },
}

/// Events for one tick.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    pub events: Vec<GraphEvent>,
}

impl Outputs {
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn dropped_writes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, GraphEvent::WriteDropped { .. }))
            .count()
    }
}
