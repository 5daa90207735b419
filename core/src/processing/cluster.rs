//! Greedy angular grouping so indicators that would overlap are stacked.

use serde::Serialize;

/// Threshold for the linear heading scale.
pub const HEADING_BAR_THRESHOLD_DEG: f64 = 5.0;
/// Threshold for the radial compass ring.
pub const COMPASS_RING_THRESHOLD_DEG: f64 = 15.0;

/// Something placed at an angle, stacked by priority when crowded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutEntity<T> {
    pub angle_deg: f64,
    pub priority: f64,
    pub item: T,
}

impl<T> LayoutEntity<T> {
    pub fn new(angle_deg: f64, priority: f64, item: T) -> Self {
        Self {
            angle_deg,
            priority,
            item,
        }
    }
}

/// A maximal run of entities whose consecutive gaps stay within threshold,
/// ordered highest priority first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster<T> {
    pub entities: Vec<LayoutEntity<T>>,
}

impl<T> Cluster<T> {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Mean member angle, where the stack is drawn.
    pub fn anchor_deg(&self) -> f64 {
        if self.entities.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.entities.iter().map(|e| e.angle_deg).sum();
        sum / self.entities.len() as f64
    }

    pub fn angles(&self) -> Vec<f64> {
        self.entities.iter().map(|e| e.angle_deg).collect()
    }
}

/// Groups entities by chained angular proximity.
///
/// Entities are sorted by angle; a new cluster starts whenever the gap to
/// the previous entity exceeds `threshold_deg`. A gap equal to the threshold
/// still chains. Each cluster is then reordered by descending priority, ties
/// keeping angle order. Angles are taken as given; 359 and 1 do not chain.
pub fn cluster_layout<T>(mut entities: Vec<LayoutEntity<T>>, threshold_deg: f64) -> Vec<Cluster<T>> {
    entities.sort_by(|a, b| a.angle_deg.total_cmp(&b.angle_deg));

    let mut clusters: Vec<Vec<LayoutEntity<T>>> = Vec::new();
    let mut previous_angle: Option<f64> = None;
    for entity in entities {
        let chains = previous_angle.is_some_and(|angle| entity.angle_deg - angle <= threshold_deg);
        previous_angle = Some(entity.angle_deg);
        if chains {
            if let Some(current) = clusters.last_mut() {
                current.push(entity);
                continue;
            }
        }
        clusters.push(vec![entity]);
    }

    clusters
        .into_iter()
        .map(|mut members| {
            members.sort_by(|a, b| b.priority.total_cmp(&a.priority));
            Cluster { entities: members }
        })
        .collect()
}
