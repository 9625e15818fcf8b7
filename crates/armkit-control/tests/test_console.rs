//! Robot selection, reset, program upload and session handling

use armkit_communication::{endpoints, RecordingTransport, SessionState};
use armkit_control::OperatorConsole;
use armkit_core::{
    AppEvent, DispatchError, Error, GatingError, JogDirection, JogIntent, RobotClass, RobotEvent,
    RobotId, StoreUpdate,
};
use armkit_settings::Config;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn connected_console() -> (OperatorConsole, Arc<RecordingTransport>) {
    let mut config = Config::default();
    config.polling.enabled = false;
    let transport = Arc::new(RecordingTransport::new());
    let console = OperatorConsole::with_transport(&config, transport.clone());
    console.connect("10.0.0.5").await.unwrap();
    transport.respond(endpoints::GET_MOTOR_STATUS, json!({"motors": {"motor1": true}}));
    transport.clear();
    (console, transport)
}

#[tokio::test]
async fn test_class_selection_activates_first_robot_of_class() {
    let (console, transport) = connected_console().await;

    let robot_id = console
        .select_robot_class(RobotClass::Industrial)
        .await
        .unwrap();
    assert_eq!(robot_id, RobotId::new("robot3"));

    let sent: Vec<_> = transport
        .requests()
        .into_iter()
        .map(|r| (r.path, r.body))
        .collect();
    assert_eq!(
        sent,
        vec![
            (
                "/api/robot/choose_robot_axis".to_string(),
                Some(json!({"type": "industrial"}))
            ),
            (
                "/api/robot/choose-active-robot".to_string(),
                Some(json!({"type": "robot3"}))
            ),
            ("/api/robot/get_motor_status".to_string(), None),
        ]
    );

    let store = console.store();
    assert_eq!(store.robot_class(), Some(RobotClass::Industrial));
    let robot = store.selected_robot().unwrap();
    assert_eq!(robot.id, robot_id);
    assert!(robot.connected);
    assert!(robot.is_motor_energized(0));
}

#[tokio::test]
async fn test_selection_waits_for_controller() {
    let (console, transport) = connected_console().await;
    console.select_robot(&RobotId::new("robot1")).await.unwrap();
    transport.fail(
        endpoints::CHOOSE_ACTIVE_ROBOT,
        DispatchError::Status { status: 409 },
    );

    let err = console
        .select_robot(&RobotId::new("robot2"))
        .await
        .unwrap_err();
    assert!(err.is_dispatch_error());
    assert_eq!(
        console.store().selected_robot_id(),
        Some(RobotId::new("robot1"))
    );
}

#[tokio::test]
async fn test_unknown_robot_is_rejected_locally() {
    let (console, transport) = connected_console().await;

    let err = console
        .select_robot(&RobotId::new("robot9"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Gating(GatingError::UnknownRobot { .. })
    ));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_reset_axes_zeroes_values_and_keeps_motors() {
    let (console, _transport) = connected_console().await;
    let robot = RobotId::new("robot3");
    console.select_robot(&robot).await.unwrap();
    console
        .store()
        .apply_confirmed(StoreUpdate::AxisValues {
            robot_id: robot.clone(),
            values: vec![(0, 10.0), (1, -5.0), (2, 0.0), (3, 90.0), (4, 45.0), (5, -30.0)],
        })
        .unwrap();
    let motors_before = console.store().robot(&robot).unwrap().motors().to_vec();

    console.reset_axes().unwrap();

    let after = console.store().robot(&robot).unwrap();
    assert_eq!(after.axis_values(), &[0.0; 6]);
    assert_eq!(after.motors(), motors_before.as_slice());
    assert!(console
        .bus()
        .recent()
        .contains(&AppEvent::Robot(RobotEvent::AxesReset { robot_id: robot })));
}

#[tokio::test]
async fn test_reset_requires_selection() {
    let (console, _transport) = connected_console().await;
    let err = console.reset_axes().unwrap_err();
    assert!(matches!(err, Error::Gating(GatingError::NoRobotSelected)));
}

#[tokio::test]
async fn test_program_upload_reports_lines() {
    let (console, transport) = connected_console().await;
    transport.respond(endpoints::SEND_PROGRAM_CODE, json!({"success": true}));

    console
        .send_program("MOVJ P1\n\nMOVL P2\n")
        .await
        .unwrap();
    assert!(console
        .bus()
        .recent()
        .contains(&AppEvent::Robot(RobotEvent::ProgramSent { lines: 2 })));
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_closes_gate_and_cancels_jogs() {
    let (console, transport) = connected_console().await;
    console.select_robot(&RobotId::new("robot1")).await.unwrap();
    console
        .panel()
        .press(JogIntent::new(0, JogDirection::Decrease));

    assert_eq!(console.disconnect(), Some("10.0.0.5".to_string()));
    assert_eq!(console.session().state(), SessionState::Absent);
    assert!(console.panel().registry().is_empty());
    tokio::time::sleep(Duration::from_millis(10)).await;

    transport.clear();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(transport.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_connected_console_polls_joint_values() {
    let transport = Arc::new(RecordingTransport::new());
    let console = OperatorConsole::with_transport(&Config::default(), transport.clone());
    console.connect("10.0.0.5").await.unwrap();
    transport.respond(endpoints::GET_MOTOR_STATUS, json!({"motors": {}}));
    transport.respond(
        endpoints::GET_JOINT_VALUE,
        json!({"joints": {"joint1": 12.0, "joint2": -3.5}}),
    );
    console.select_robot(&RobotId::new("robot2")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(
        console
            .store()
            .robot(&RobotId::new("robot2"))
            .unwrap()
            .axis_values(),
        &[12.0, -3.5]
    );

    console.shutdown();
}

#[test]
fn test_invalid_config_is_refused() {
    let mut config = Config::default();
    config.jog.period_ms = 0;
    let err = OperatorConsole::new(&config).unwrap_err();
    assert!(err.to_string().contains("jog.period_ms"));
}
