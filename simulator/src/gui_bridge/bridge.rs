use crate::gui_bridge::model::HudScene;
use hudcore::store::Snapshot;
use log::{error, info};
use std::{
    future::Future,
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::Filter;

fn gui_bind_address(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Latest frame as served to external renderers.
#[derive(Debug, Default)]
pub struct BridgeState {
    pub snapshot: Snapshot,
    pub scene: HudScene,
}

type SharedState = Arc<RwLock<BridgeState>>;

/// `GET /snapshot` and `GET /scene`, both JSON.
pub fn routes(
    state: SharedState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    let snapshot_route = warp::path("snapshot")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: SharedState| {
            let guard = state.read().unwrap_or_else(PoisonError::into_inner);
            warp::reply::json(&guard.snapshot)
        });

    let scene_route = warp::path("scene")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter)
        .map(|state: SharedState| {
            let guard = state.read().unwrap_or_else(PoisonError::into_inner);
            warp::reply::json(&guard.scene)
        });

    snapshot_route.or(scene_route)
}

/// Binds the routes without serving yet. Must run inside a tokio runtime.
fn bind(
    state: SharedState,
    address: SocketAddr,
) -> Result<(SocketAddr, impl Future<Output = ()> + 'static), warp::Error> {
    warp::serve(routes(state)).try_bind_ephemeral(address)
}

/// Bridge that hosts the local HTTP endpoint renderers poll for frames.
pub struct GuiBridge {
    state: SharedState,
}

impl GuiBridge {
    /// State holder without a listener, for offline runs.
    pub fn detached() -> Self {
        Self {
            state: Arc::new(RwLock::new(BridgeState::default())),
        }
    }

    /// Starts serving on 127.0.0.1:`port` from a background thread. A port
    /// that cannot be bound is logged and the bridge stays detached.
    pub fn serve(port: u16) -> Self {
        let bridge = Self::detached();
        let state = bridge.state.clone();
        let address = gui_bind_address(port);

        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("[GUI] failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                match bind(state, address) {
                    Ok((bound, server)) => {
                        info!("[GUI] serving on http://{}", bound);
                        server.await;
                    }
                    Err(err) => error!("[GUI] failed to bind {}: {}", address, err),
                }
            });
        });

        bridge
    }

    pub fn publish(&self, snapshot: Snapshot, scene: HudScene) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.snapshot = snapshot;
        guard.scene = scene;
    }

    pub fn publish_status(&self, message: &str) {
        info!("[GUI] {}", message);
    }

    pub fn latest_scene(&self) -> HudScene {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .scene
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hudcore::channels::{Band, DeviceType, RfDevice};

    fn frame() -> (Snapshot, HudScene) {
        let mut snapshot = Snapshot {
            revision: 7,
            ..Default::default()
        };
        snapshot.rf_devices.push(RfDevice::new(
            "HomeNet",
            -48.0,
            Some(6),
            Band::Ghz2_4,
            "Secured",
            DeviceType::Router,
            9.0,
            2,
        ));
        let scene = HudScene {
            frame: 3,
            revision: 7,
            device_count: 1,
            ..Default::default()
        };
        (snapshot, scene)
    }

    #[test]
    fn gui_bridge_updates_state() {
        let gui = GuiBridge::detached();
        let (snapshot, scene) = frame();
        gui.publish(snapshot, scene);
        let latest = gui.latest_scene();
        assert_eq!(latest.frame, 3);
        assert_eq!(latest.device_count, 1);
    }

    #[tokio::test]
    async fn routes_serve_latest_frame_as_json() {
        let gui = GuiBridge::detached();
        let (snapshot, scene) = frame();
        gui.publish(snapshot, scene);
        let filter = routes(gui.state.clone());

        let response = warp::test::request()
            .method("GET")
            .path("/snapshot")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["revision"], 7);
        assert_eq!(body["rf_devices"][0]["id"], "HomeNet");
        assert_eq!(body["rf_devices"][0]["band"], "2.4GHz");

        let response = warp::test::request()
            .method("GET")
            .path("/scene")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["frame"], 3);

        let response = warp::test::request()
            .method("GET")
            .path("/other")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn occupied_port_fails_to_bind_without_panicking() {
        let taken = std::net::TcpListener::bind(gui_bind_address(0)).unwrap();
        let gui = GuiBridge::detached();
        assert!(bind(gui.state.clone(), taken.local_addr().unwrap()).is_err());

        let (bound, _server) = bind(gui.state.clone(), gui_bind_address(0)).unwrap();
        assert_ne!(bound.port(), 0);
    }
}
