//! Line-oriented operator shell
//!
//! Reads one command per line from stdin and drives an [`OperatorConsole`].
//! Jog controls are addressed as `<axis> <+|->` with one-based axes, and
//! raw mouse/touch input can be fed directly to exercise the gesture
//! handling a pointer front end would produce.

use armkit_control::{OperatorConsole, RawInput};
use armkit_core::{
    AppEvent, EventFilter, JogDirection, JogIntent, JogMode, RobotClass, RobotId, SubscriptionId,
};
use armkit_settings::{Config, SettingsManager};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
commands:
  connect <host>                 open a session
  disconnect                     close the session
  class <scara|industrial>       choose robot class
  select <robot-id>              choose active robot
  motor <n>                      toggle motor n
  motors <on|off>                all motors of the active robot
  press|release|leave <n> <+|->  mouse input on a jog control
  touch <n> <+|-> <start|end|cancel>
  hold <n> <+|-> <ms>            press, wait, release
  mode <joint|cartesian>         jog frame
  estop                          emergency stop
  reset                          zero the active robot's axes
  program <line; line; ...>      send program text
  status                         session and robot state
  log [count]                    recent events
  quit";

/// Whether the shell keeps reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line
    Continue,
    /// Leave the shell
    Quit,
}

/// Operator shell over one console
pub struct Shell {
    console: OperatorConsole,
    config: Config,
    config_path: Option<PathBuf>,
    subscription: SubscriptionId,
}

impl Shell {
    /// Create a shell; events are echoed as status lines
    pub fn new(console: OperatorConsole, config: Config, config_path: Option<PathBuf>) -> Self {
        let subscription = console.bus().subscribe(EventFilter::All, |event| {
            if matches!(event, AppEvent::Command(c) if c.result.succeeded) {
                return;
            }
            let marker = if event.is_failure() { '!' } else { '-' };
            println!("{} [{}] {}", marker, event.category(), event.description());
        });

        Self {
            console,
            config,
            config_path,
            subscription,
        }
    }

    /// The console this shell drives
    pub fn console(&self) -> &OperatorConsole {
        &self.console
    }

    /// Read and execute lines until `quit` or end of input
    pub async fn run(&mut self) -> anyhow::Result<()> {
        println!("armkit shell, type 'help' for commands");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if self.execute(&line).await == Flow::Quit {
                break;
            }
        }

        self.console.disconnect();
        self.console.shutdown();
        Ok(())
    }

    /// Execute one line; errors are printed, never returned
    pub async fn execute(&mut self, line: &str) -> Flow {
        match self.dispatch(line).await {
            Ok(flow) => flow,
            Err(e) => {
                println!("error: {}", e);
                Flow::Continue
            }
        }
    }

    async fn dispatch(&mut self, line: &str) -> anyhow::Result<Flow> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = words.collect();
        let console = &self.console;

        match command {
            "connect" => {
                let host = args.first().ok_or_else(|| usage("connect <host>"))?;
                console.connect(host).await?;
                self.remember_host(host);
            }
            "disconnect" => match console.disconnect() {
                Some(host) => println!("disconnected from {}", host),
                None => println!("not connected"),
            },
            "class" => {
                let class = args
                    .first()
                    .and_then(|name| RobotClass::parse(name))
                    .ok_or_else(|| usage("class <scara|industrial>"))?;
                let robot_id = console.select_robot_class(class).await?;
                println!("active robot: {}", robot_id);
            }
            "select" => {
                let robot_id = args.first().ok_or_else(|| usage("select <robot-id>"))?;
                console.select_robot(&RobotId::new(*robot_id)).await?;
            }
            "motor" => {
                let axis = args
                    .first()
                    .and_then(|n| parse_axis(n))
                    .ok_or_else(|| usage("motor <n>"))?;
                let energized = console.motors().toggle(axis).await?;
                println!("motor {} {}", axis + 1, on_off(energized));
            }
            "motors" => {
                let energized = match args.first() {
                    Some(&"on") => true,
                    Some(&"off") => false,
                    _ => return Err(usage("motors <on|off>")),
                };
                console.motors().set_all(energized).await?;
            }
            "press" | "release" | "leave" => {
                let intent = parse_intent(&args)?;
                let raw = match command {
                    "press" => RawInput::MouseDown,
                    "release" => RawInput::MouseUp,
                    _ => RawInput::MouseLeave,
                };
                console.panel().input(intent, raw);
            }
            "touch" => {
                let intent = parse_intent(&args)?;
                let raw = match args.get(2) {
                    Some(&"start") => RawInput::TouchStart,
                    Some(&"end") => RawInput::TouchEnd,
                    Some(&"cancel") => RawInput::TouchCancel,
                    _ => return Err(usage("touch <n> <+|-> <start|end|cancel>")),
                };
                console.panel().input(intent, raw);
            }
            "hold" => {
                let intent = parse_intent(&args)?;
                let ms: u64 = args
                    .get(2)
                    .and_then(|ms| ms.parse().ok())
                    .ok_or_else(|| usage("hold <n> <+|-> <ms>"))?;
                console.panel().press(intent);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                console.panel().release(intent);
            }
            "mode" => {
                let mode = match args.first() {
                    Some(&"joint") => JogMode::Joint,
                    Some(&"cartesian") => JogMode::Cartesian,
                    _ => return Err(usage("mode <joint|cartesian>")),
                };
                console.set_jog_mode(mode);
            }
            "estop" => console.emergency_stop().await?,
            "reset" => console.reset_axes()?,
            "program" => {
                let program = args.join(" ");
                let program: Vec<&str> = program.split(';').map(str::trim).collect();
                console.send_program(&program.join("\n")).await?;
            }
            "status" => self.print_status(),
            "log" => {
                let count = args.first().and_then(|n| n.parse().ok()).unwrap_or(10);
                let recent = console.bus().recent();
                for event in recent.iter().skip(recent.len().saturating_sub(count)) {
                    println!("  [{}] {}", event.category(), event.description());
                }
            }
            "help" | "?" => println!("{}", HELP),
            "quit" | "exit" => return Ok(Flow::Quit),
            other => return Err(anyhow::anyhow!("unknown command '{}', try 'help'", other)),
        }
        Ok(Flow::Continue)
    }

    fn remember_host(&mut self, host: &str) {
        self.config.remember_host(host);
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = SettingsManager::save(&self.config, path) {
            tracing::warn!("Could not save config to {}: {}", path.display(), e);
        }
    }

    fn print_status(&self) {
        let console = &self.console;
        let session = console.session();
        println!(
            "session: {:?} {}",
            session.state(),
            session.host.as_deref().unwrap_or("-")
        );
        if let Some(error) = &session.last_error {
            println!("last error: {}", error);
        }

        let store = console.store();
        let class = store
            .robot_class()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("class: {}  mode: {:?}", class, console.jog_mode());

        match store.selected_robot() {
            Some(robot) => {
                println!("robot: {} ({}) {}", robot.id, robot.name, robot.status);
                for (axis, value) in robot.axis_values().iter().enumerate() {
                    println!(
                        "  J{}  {:>9.3}  motor {}",
                        axis + 1,
                        value,
                        on_off(robot.is_motor_energized(axis))
                    );
                }
            }
            None => println!("robot: -"),
        }

        let active = console.panel().registry().active();
        if !active.is_empty() {
            let names: Vec<String> = active.iter().map(|i| i.to_string()).collect();
            println!("jogging: {}", names.join(" "));
        }
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        self.console.bus().unsubscribe(self.subscription);
    }
}

fn usage(text: &str) -> anyhow::Error {
    anyhow::anyhow!("usage: {}", text)
}

fn on_off(energized: bool) -> &'static str {
    if energized {
        "on"
    } else {
        "off"
    }
}

/// One-based axis number to a zero-based index
fn parse_axis(text: &str) -> Option<usize> {
    text.parse::<usize>().ok()?.checked_sub(1)
}

fn parse_intent(args: &[&str]) -> anyhow::Result<JogIntent> {
    let axis = args.first().and_then(|n| parse_axis(n));
    let direction = args.get(1).and_then(|d| JogDirection::parse(d));
    match (axis, direction) {
        (Some(axis), Some(direction)) => Ok(JogIntent::new(axis, direction)),
        _ => Err(usage("<n> <+|->, axes count from 1")),
    }
}
