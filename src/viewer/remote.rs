//! Bridge between the control server and the viewer
//!
//! The control server runs on its own runtime thread. Queries are answered
//! from a snapshot the render thread publishes every frame; mutations are
//! queued here and drained on the render thread.

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use voxview_control::{BoundsInfo, ControlCommand, ControlHandler, ControlResponse, ControlServer, ResponseData};

use crate::convert::OctomapConverter;
use crate::core::camera_rig::Projection;
use crate::core::error::Error;
use crate::core::types::Result;
use crate::voxel::RegionBounds;

use super::controller::{ViewerStatus, ViewportController};

/// A mutation requested remotely, applied on the render thread
#[derive(Clone, Debug, PartialEq)]
pub enum PendingAction {
    LoadMap(PathBuf),
    SetShading(bool),
    SetProjection(Projection),
    SetRegion(RegionBounds),
    ClearRegion,
    FocusAt(f32, f32),
    Export(Option<PathBuf>),
}

/// Camera state published each frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSnapshot {
    pub projection: Projection,
    pub position: [f32; 3],
    pub forward: [f32; 3],
    pub target: [f32; 3],
    pub zoom: f32,
}

#[derive(Debug, Default)]
struct SharedState {
    status: Option<ViewerStatus>,
    camera: Option<CameraSnapshot>,
    pending: Vec<PendingAction>,
}

/// State shared between the render thread and the control handler
#[derive(Clone, Debug, Default)]
pub struct ControlBridge {
    state: Arc<Mutex<SharedState>>,
}

impl ControlBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handler to hand to the control server
    pub fn handler(&self) -> ViewerControlHandler {
        ViewerControlHandler { bridge: self.clone() }
    }

    /// Refresh the query snapshot from the controller
    pub fn publish(&self, controller: &ViewportController) {
        let camera = controller.rig().active();
        let snapshot = CameraSnapshot {
            projection: controller.projection(),
            position: camera.position.to_array(),
            forward: camera.forward().to_array(),
            target: controller.orbit().target.to_array(),
            zoom: camera.zoom(),
        };

        let mut state = self.lock();
        state.status = Some(controller.status());
        state.camera = Some(snapshot);
    }

    fn queue(&self, action: PendingAction) {
        self.lock().pending.push(action);
    }

    /// Take every queued action in arrival order
    pub fn drain(&self) -> Vec<PendingAction> {
        std::mem::take(&mut self.lock().pending)
    }
}

/// Answers control commands against a [`ControlBridge`]
pub struct ViewerControlHandler {
    bridge: ControlBridge,
}

impl ControlHandler for ViewerControlHandler {
    fn handle_command(&mut self, cmd: ControlCommand) -> ControlResponse {
        match cmd {
            ControlCommand::Ping => ControlResponse::pong(),
            ControlCommand::GetViewerState => match self.bridge.lock().status.clone() {
                Some(status) => ControlResponse::ok(viewer_state(&status)),
                None => ControlResponse::error("Viewer not ready"),
            },
            ControlCommand::CameraGetState => match self.bridge.lock().camera {
                Some(camera) => ControlResponse::ok(ResponseData::CameraState {
                    projection: camera.projection.to_string(),
                    position: camera.position,
                    forward: camera.forward,
                    target: camera.target,
                    zoom: camera.zoom,
                }),
                None => ControlResponse::error("Viewer not ready"),
            },
            ControlCommand::LoadMap { path } => {
                self.bridge.queue(PendingAction::LoadMap(PathBuf::from(&path)));
                ControlResponse::queued(format!("load {}", path))
            }
            ControlCommand::SetShading { enabled } => {
                self.bridge.queue(PendingAction::SetShading(enabled));
                ControlResponse::queued(format!("shading {}", enabled))
            }
            ControlCommand::SetProjection { mode } => match mode.parse::<Projection>() {
                Ok(projection) => {
                    self.bridge.queue(PendingAction::SetProjection(projection));
                    ControlResponse::queued(format!("projection {}", projection))
                }
                Err(e) => ControlResponse::error(e.to_string()),
            },
            ControlCommand::SetRegion { min_x, max_x, min_y, max_y, min_z, max_z } => {
                let region = RegionBounds::new(min_x, max_x, min_y, max_y, min_z, max_z);
                self.bridge.queue(PendingAction::SetRegion(region));
                ControlResponse::queued("region")
            }
            ControlCommand::ClearRegion => {
                self.bridge.queue(PendingAction::ClearRegion);
                ControlResponse::queued("clear region")
            }
            ControlCommand::FocusAt { x, y } => {
                self.bridge.queue(PendingAction::FocusAt(x, y));
                ControlResponse::queued(format!("focus at ({}, {})", x, y))
            }
            ControlCommand::Export { directory } => {
                self.bridge.queue(PendingAction::Export(directory.map(PathBuf::from)));
                ControlResponse::queued("export")
            }
        }
    }
}

fn bounds_info(r: &RegionBounds) -> BoundsInfo {
    BoundsInfo {
        min_x: r.min_x,
        max_x: r.max_x,
        min_y: r.min_y,
        max_y: r.max_y,
        min_z: r.min_z,
        max_z: r.max_z,
    }
}

fn viewer_state(status: &ViewerStatus) -> ResponseData {
    ResponseData::ViewerState {
        has_map: status.has_map,
        total_voxels: status.total_voxels,
        visible_voxels: status.visible_voxels,
        resolution: status.resolution,
        shading: status.shading,
        projection: status.projection.to_string(),
        region: status.region.as_ref().map(bounds_info),
        bounds: status.bounds.as_ref().map(bounds_info),
    }
}

/// Control server running on its own runtime thread
///
/// Stopping (or dropping) the handle shuts the runtime down and joins the
/// thread, which also closes the listening socket.
pub struct ControlThread {
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl ControlThread {
    /// Start the server on 127.0.0.1:`port`
    ///
    /// Returns once the socket is bound; bind failures (such as the port being
    /// taken) are returned as errors.
    pub fn spawn(bridge: &ControlBridge, port: u16) -> Result<Self> {
        let (shutdown, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<io::Result<SocketAddr>>();
        let handler = Arc::new(tokio::sync::Mutex::new(bridge.handler()));

        let thread = std::thread::Builder::new()
            .name("voxview-control".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(1)
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                runtime.block_on(async move {
                    let addr = format!("127.0.0.1:{}", port);
                    let server = match ControlServer::bind(handler, &addr).await {
                        Ok(server) => server,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                    let _ = ready_tx.send(Ok(server.local_addr()));
                    // Either a stop request or the handle being dropped ends the wait
                    let _ = shutdown_rx.await;
                    server.stop();
                });
            })
            .map_err(Error::Io)?;

        let ready = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(io::Error::other("control thread exited before binding")));
        match ready {
            Ok(local_addr) => Ok(Self {
                shutdown: Some(shutdown),
                thread: Some(thread),
                local_addr,
            }),
            Err(e) => {
                if thread.join().is_err() {
                    log::error!("Control thread panicked");
                }
                log::error!("Failed to start control server on port {}: {}", port, e);
                Err(Error::Io(e))
            }
        }
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the server and join its thread; later calls are no-ops
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Control thread panicked");
            }
        }
    }
}

impl Drop for ControlThread {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Apply one queued action to the controller
pub fn apply_action(
    controller: &mut ViewportController,
    action: PendingAction,
    converter: &OctomapConverter,
    export_dir: &Path,
) -> Result<()> {
    log::debug!("Applying remote action: {:?}", action);
    match action {
        PendingAction::LoadMap(path) => controller.load_file(&path, converter),
        PendingAction::SetShading(enabled) => controller.set_shading(enabled),
        PendingAction::SetProjection(mode) => {
            controller.set_projection(mode);
            Ok(())
        }
        PendingAction::SetRegion(region) => {
            controller.set_region(region);
            Ok(())
        }
        PendingAction::ClearRegion => {
            controller.clear_region();
            Ok(())
        }
        PendingAction::FocusAt(x, y) => {
            controller.focus_at(x, y);
            Ok(())
        }
        PendingAction::Export(directory) => {
            let directory = directory.as_deref().unwrap_or(export_dir);
            controller.export(directory).map(|_| ())
        }
    }
}
