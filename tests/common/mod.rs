//! Common test utilities for grbl_stage integration tests
//!
//! Helpers for building a controller on a scripted transport. Use them from
//! `#[tokio::test(start_paused = true)]` tests so the settle and pre-move delays
//! are skipped instead of slept.

#![allow(dead_code)] // Utilities may not all be used by every test binary

use grbl_stage::adapters::{MockHandle, MockTransport};
use grbl_stage::{ControllerSettings, GrblController, SafetyEnvelope};

pub const IDLE_AT_ORIGIN: &str = "<Idle|MPos:0.000,0.000,0.000|FS:0,0>";

/// Status frame for a running machine at `(x, y)`.
pub fn run_frame(x: f64, y: f64) -> String {
    format!("<Run|MPos:{:.3},{:.3},0.000|FS:400,0>", x, y)
}

/// Connected controller with the origin not yet set.
pub async fn connected(envelope: SafetyEnvelope) -> (GrblController, MockHandle) {
    let (transport, handle) = MockTransport::with_handle();
    let controller =
        GrblController::with_transport(Box::new(transport), envelope, ControllerSettings::default())
            .await
            .expect("mock transport never fails to connect");
    (controller, handle)
}

/// Controller with the origin set. The mock starts with an empty reply queue and
/// silence as its default reply.
pub async fn ready(envelope: SafetyEnvelope) -> (GrblController, MockHandle) {
    let (mut controller, handle) = connected(envelope).await;
    for _ in 0..3 {
        handle.queue_reply(&["ok"]).await;
    }
    controller
        .set_origin()
        .await
        .expect("scripted origin sequence is accepted");
    (controller, handle)
}

/// Commands written after the origin sequence.
pub async fn commands_after_origin(handle: &MockHandle) -> Vec<String> {
    handle.commands().await.into_iter().skip(3).collect()
}
