//! Held-button jogging through the console against a recording controller

use armkit_communication::{endpoints, RecordedRequest, RecordingTransport};
use armkit_control::{OperatorConsole, RawInput};
use armkit_core::{
    AppEvent, JogDirection, JogEvent, JogIntent, JogMode, RobotId, StoreUpdate,
};
use armkit_settings::Config;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn up(axis: usize) -> JogIntent {
    JogIntent::new(axis, JogDirection::Increase)
}

fn down(axis: usize) -> JogIntent {
    JogIntent::new(axis, JogDirection::Decrease)
}

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.polling.enabled = false;
    config
}

/// Connected console with robot1 (2 axes) active, motor1 on and motor2 off
async fn scara_console() -> (OperatorConsole, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::new());
    let console = OperatorConsole::with_transport(&quiet_config(), transport.clone());
    console.connect("10.0.0.5").await.unwrap();

    transport.respond(
        endpoints::GET_MOTOR_STATUS,
        json!({"motors": {"motor1": true, "motor2": false}}),
    );
    console.select_robot(&RobotId::new("robot1")).await.unwrap();
    transport.clear();
    (console, transport)
}

fn joint_values(transport: &RecordingTransport, axis: usize) -> Vec<f64> {
    transport
        .requests_to(endpoints::UPDATE_JOINT_VALUE)
        .iter()
        .filter(|r| joint_index(r) == Some(axis))
        .filter_map(RecordedRequest::value)
        .collect()
}

fn joint_index(request: &RecordedRequest) -> Option<usize> {
    request
        .body
        .as_ref()?
        .get("jointIndex")?
        .as_u64()
        .map(|i| i as usize)
}

fn jog_events(console: &OperatorConsole) -> Vec<JogEvent> {
    console
        .bus()
        .recent()
        .into_iter()
        .filter_map(|event| match event {
            AppEvent::Jog(e) => Some(e),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_held_jog_steps_every_period_then_stops() {
    let (console, transport) = scara_console().await;
    let panel = console.panel();

    panel.press(up(0));
    panel.press(up(1));
    sleep(Duration::from_millis(350)).await;
    panel.release(up(0));
    panel.release(up(1));
    sleep(Duration::from_millis(10)).await;

    assert_eq!(joint_values(&transport, 0), vec![1.0, 1.0, 1.0, 1.0, 0.0]);
    assert!(joint_values(&transport, 1).is_empty());

    let sent = transport.requests_to(endpoints::UPDATE_JOINT_VALUE);
    let gaps: Vec<Duration> = sent.windows(2).map(|w| w[1].at - w[0].at).collect();
    assert_eq!(&gaps[..3], &[Duration::from_millis(100); 3]);
    assert!(panel.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_opposite_direction_displaces_live_timer() {
    let (console, transport) = scara_console().await;
    let panel = console.panel();

    panel.press(up(0));
    sleep(Duration::from_millis(150)).await;
    panel.press(down(0));

    assert_eq!(panel.registry().active(), vec![down(0)]);
    assert!(!panel.registry().is_active(up(0)));

    sleep(Duration::from_millis(250)).await;
    panel.release(down(0));
    panel.release(up(0));
    sleep(Duration::from_millis(10)).await;

    // Two steps up, the reversal step and two ticks down, one terminal zero.
    assert_eq!(
        joint_values(&transport, 0),
        vec![1.0, 1.0, -1.0, -1.0, -1.0, 0.0]
    );
}

#[tokio::test(start_paused = true)]
async fn test_teardown_leaves_no_live_timer() {
    let (console, transport) = scara_console().await;
    console
        .store()
        .apply_confirmed(StoreUpdate::AllMotors {
            robot_id: RobotId::new("robot1"),
            energized: true,
        })
        .unwrap();

    console.panel().press(up(0));
    console.panel().press(down(1));
    sleep(Duration::from_millis(120)).await;
    assert_eq!(console.panel().registry().len(), 2);

    console.disconnect();
    assert!(console.panel().registry().is_empty());
    sleep(Duration::from_millis(10)).await;
    assert_eq!(joint_values(&transport, 0).last(), Some(&0.0));
    assert_eq!(joint_values(&transport, 1).last(), Some(&0.0));

    let before = transport.requests_to(endpoints::UPDATE_JOINT_VALUE).len();
    sleep(Duration::from_secs(2)).await;
    assert_eq!(
        transport.requests_to(endpoints::UPDATE_JOINT_VALUE).len(),
        before
    );
}

#[tokio::test(start_paused = true)]
async fn test_dropping_console_stops_timers() {
    let (console, transport) = scara_console().await;
    console.panel().press(up(0));
    sleep(Duration::from_millis(50)).await;
    drop(console);

    let before = transport.requests().len();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.requests().len(), before);
}

#[tokio::test(start_paused = true)]
async fn test_held_jog_pauses_while_motor_is_off_and_resumes() {
    let (console, transport) = scara_console().await;
    let robot = RobotId::new("robot1");
    let set_motor = |energized| {
        console
            .store()
            .apply_confirmed(StoreUpdate::Motor {
                robot_id: robot.clone(),
                axis: 0,
                energized,
            })
            .unwrap()
    };

    console.panel().press(up(0));
    sleep(Duration::from_millis(150)).await;
    assert_eq!(joint_values(&transport, 0).len(), 2);

    set_motor(false);
    sleep(Duration::from_millis(300)).await;
    assert_eq!(joint_values(&transport, 0).len(), 2);
    assert!(console.panel().registry().is_active(up(0)));

    set_motor(true);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(joint_values(&transport, 0).len(), 3);

    let events = jog_events(&console);
    let blocked = events
        .iter()
        .filter(|e| matches!(e, JogEvent::Blocked { .. }))
        .count();
    let resumed = events
        .iter()
        .filter(|e| matches!(e, JogEvent::Resumed { .. }))
        .count();
    assert_eq!((blocked, resumed), (1, 1));
}

#[tokio::test(start_paused = true)]
async fn test_second_release_sends_nothing() {
    let (console, transport) = scara_console().await;
    let panel = console.panel();

    panel.press(up(0));
    sleep(Duration::from_millis(50)).await;
    assert!(panel.release(up(0)).is_some());
    assert!(panel.release(up(0)).is_none());
    assert!(!panel.registry().stop(up(0)));
    sleep(Duration::from_millis(10)).await;

    let zeros = joint_values(&transport, 0)
        .into_iter()
        .filter(|v| *v == 0.0)
        .count();
    assert_eq!(zeros, 1);
}

#[tokio::test(start_paused = true)]
async fn test_jog_without_session_is_held_but_silent() {
    let transport = Arc::new(RecordingTransport::new());
    let console = OperatorConsole::with_transport(&quiet_config(), transport.clone());

    console.panel().press(up(0));
    sleep(Duration::from_millis(300)).await;
    assert!(console.panel().registry().is_active(up(0)));
    console.panel().release(up(0));
    sleep(Duration::from_millis(10)).await;

    assert!(transport.requests().is_empty());
    assert!(jog_events(&console).contains(&JogEvent::Blocked {
        intent: up(0),
        reason: "Not connected to a controller".to_string(),
    }));
}

#[tokio::test(start_paused = true)]
async fn test_touch_and_synthetic_mouse_make_one_gesture() {
    let (console, transport) = scara_console().await;
    let panel = console.panel();

    panel.input(up(0), RawInput::TouchStart);
    panel.input(up(0), RawInput::MouseDown);
    sleep(Duration::from_millis(50)).await;
    panel.input(up(0), RawInput::TouchEnd);
    panel.input(up(0), RawInput::MouseUp);
    sleep(Duration::from_millis(10)).await;

    assert_eq!(joint_values(&transport, 0), vec![1.0, 0.0]);
}

#[tokio::test(start_paused = true)]
async fn test_mouse_leave_ends_the_gesture() {
    let (console, transport) = scara_console().await;

    console.panel().press(up(0));
    sleep(Duration::from_millis(150)).await;
    console.panel().input(up(0), RawInput::MouseLeave);
    sleep(Duration::from_millis(300)).await;

    assert_eq!(joint_values(&transport, 0), vec![1.0, 1.0, 0.0]);
}

#[tokio::test(start_paused = true)]
async fn test_cartesian_mode_uses_tool_axes() {
    let (console, transport) = scara_console().await;
    console
        .store()
        .apply_confirmed(StoreUpdate::AllMotors {
            robot_id: RobotId::new("robot1"),
            energized: true,
        })
        .unwrap();
    console.set_jog_mode(JogMode::Cartesian);

    console.panel().press(down(1));
    console.panel().press(up(2));
    sleep(Duration::from_millis(10)).await;
    console.panel().release(down(1));
    console.panel().release(up(2));
    sleep(Duration::from_millis(10)).await;

    let bodies: Vec<_> = transport
        .requests_to(endpoints::UPDATE_CARTESIAN_VALUE)
        .into_iter()
        .filter_map(|r| r.body)
        .collect();
    assert_eq!(
        bodies,
        vec![
            json!({"robotId": "robot1", "axis": "y", "value": -1.0}),
            json!({"robotId": "robot1", "axis": "y", "value": 0.0}),
        ]
    );
    assert!(transport
        .requests_to(endpoints::UPDATE_JOINT_VALUE)
        .is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_increment_does_not_end_the_gesture() {
    let (console, transport) = scara_console().await;
    transport.fail(
        endpoints::UPDATE_JOINT_VALUE,
        armkit_core::DispatchError::Status { status: 500 },
    );

    console.panel().press(up(0));
    sleep(Duration::from_millis(250)).await;

    assert!(console.panel().registry().is_active(up(0)));
    assert_eq!(joint_values(&transport, 0).len(), 3);
    assert!(console.bus().recent().iter().any(|e| matches!(
        e,
        AppEvent::Command(c) if !c.result.succeeded
    )));
}
