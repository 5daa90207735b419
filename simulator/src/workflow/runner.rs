use crate::gui_bridge::model::{distance_label, DeviceMarker, HudScene, MarkerStack};
use hudcore::lifecycle::ServiceStatus;
use hudcore::math::relative_deg;
use hudcore::processing::classify::palette_color;
use hudcore::processing::cluster::{
    cluster_layout, Cluster, LayoutEntity, COMPASS_RING_THRESHOLD_DEG, HEADING_BAR_THRESHOLD_DEG,
};
use hudcore::store::{AggregationStore, Snapshot};
use std::sync::Arc;

/// Estimates at or below this confidence are not drawn.
pub const MIN_DISPLAY_CONFIDENCE: f64 = 0.3;
/// Half-width of the heading bar.
pub const HEADING_BAR_HALF_SPAN_DEG: f64 = 60.0;

/// Devices that have a drawable direction estimate, merged list order.
fn directional_markers(snapshot: &Snapshot, heading: Option<f64>) -> Vec<DeviceMarker> {
    snapshot
        .rf_devices
        .iter()
        .filter_map(|device| {
            let estimate = snapshot.estimate_for(&device.id)?;
            if estimate.confidence <= MIN_DISPLAY_CONFIDENCE {
                return None;
            }
            Some(DeviceMarker {
                id: device.id.clone(),
                device_type: device.device_type,
                color: palette_color(device.color_id),
                signal_dbm: device.signal_dbm,
                bearing_deg: estimate.bearing_deg,
                relative_deg: heading.map(|h| relative_deg(estimate.bearing_deg, h)),
                confidence: estimate.confidence,
                distance_label: distance_label(device.distance_m),
            })
        })
        .collect()
}

fn into_stacks(clusters: Vec<Cluster<DeviceMarker>>) -> Vec<MarkerStack> {
    clusters
        .into_iter()
        .map(|cluster| MarkerStack {
            anchor_deg: cluster.anchor_deg(),
            markers: cluster.entities.into_iter().map(|e| e.item).collect(),
        })
        .collect()
}

/// Resolves one snapshot into drawable stacks.
///
/// The heading bar clusters relative angles within its visible span and is
/// empty without a heading. The compass ring clusters absolute bearings.
pub fn resolve_scene(snapshot: &Snapshot, frame: u64) -> HudScene {
    let heading = snapshot.heading();
    let markers = directional_markers(snapshot, heading);

    let bar_entities: Vec<LayoutEntity<DeviceMarker>> = markers
        .iter()
        .filter_map(|marker| {
            let relative = marker.relative_deg?;
            (relative.abs() <= HEADING_BAR_HALF_SPAN_DEG)
                .then(|| LayoutEntity::new(relative, marker.signal_dbm, marker.clone()))
        })
        .collect();

    let ring_entities: Vec<LayoutEntity<DeviceMarker>> = markers
        .into_iter()
        .map(|marker| LayoutEntity::new(marker.bearing_deg, marker.signal_dbm, marker))
        .collect();

    HudScene {
        frame,
        revision: snapshot.revision,
        heading_deg: heading,
        position: snapshot.position,
        telemetry: snapshot.telemetry,
        device_count: snapshot.rf_devices.len(),
        heading_bar: into_stacks(cluster_layout(bar_entities, HEADING_BAR_THRESHOLD_DEG)),
        compass: into_stacks(cluster_layout(ring_entities, COMPASS_RING_THRESHOLD_DEG)),
        services: Vec::new(),
    }
}

/// Render-side consumer: one snapshot per frame, never waiting on producers.
pub struct FrameRunner {
    store: Arc<AggregationStore>,
    frame: u64,
}

impl FrameRunner {
    pub fn new(store: Arc<AggregationStore>) -> Self {
        Self { store, frame: 0 }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Takes the next snapshot and resolves it. The snapshot is returned too
    /// so the bridge can serve both views of the same frame.
    pub fn next_frame(&mut self, services: Vec<ServiceStatus>) -> (Snapshot, HudScene) {
        self.frame += 1;
        let snapshot = self.store.snapshot();
        let mut scene = resolve_scene(&snapshot, self.frame);
        scene.services = services;
        (snapshot, scene)
    }
}
