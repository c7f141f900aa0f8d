use std::io::{self, BufRead};

use anyhow::Result;
use crossbeam_channel::Sender;

use crate::joystick::JoystickEvent;
use crate::panel::PanelCommand;

const HELP: &[&str] = &[
    "Available commands:",
    "  help                      - Show this help message",
    "  add <t> <v>               - Add a control point at time t, value v (0 to 100)",
    "  grab <id>                 - Start dragging point <id>",
    "  drag <t> <v>              - Move the grabbed point",
    "  move <id> <t> <v>         - Grab point <id> and move it",
    "  release                   - Let go of the grabbed point",
    "  clear                     - Remove all control points",
    "  points                    - Show the waveform and its points",
    "  value <t>                 - Show the interpolated value at time t",
    "  limit                     - Show the time axis range",
    "  extend                    - Grow the time axis by one increment",
    "  play                      - Preview the waveform locally",
    "  halt                      - Stop the local preview",
    "  send                      - Send the waveform to the controller and preview it",
    "  stop                      - Tell the controller to stop",
    "  joy <x> <y> [angle]       - Joystick moved to (x, y), each in -1.0 to 1.0",
    "  joy_end                   - Joystick released",
    "  quit                      - Exit",
];

fn parse_f64(arg: Option<&str>, name: &str) -> Result<f64> {
    let arg = arg.ok_or_else(|| anyhow::anyhow!("Missing {}", name))?;
    let value = arg
        .parse::<f64>()
        .map_err(|_| anyhow::anyhow!("Invalid {} value: {}", name, arg))?;
    if !value.is_finite() {
        anyhow::bail!("Invalid {} value: {}", name, arg);
    }
    Ok(value)
}

fn parse_id(arg: Option<&str>) -> Result<u64> {
    let arg = arg.ok_or_else(|| anyhow::anyhow!("Missing point id"))?;
    arg.trim_start_matches('#')
        .parse::<u64>()
        .map_err(|_| anyhow::anyhow!("Invalid point id: {}", arg))
}

/// Parses one command line. `Ok(None)` means a blank line or `help`.
pub fn parse_command(cmdline: &str) -> Result<Option<PanelCommand>> {
    let mut parts = cmdline.split_whitespace();
    let command = match parts.next() {
        Some(command) => command,
        None => return Ok(None),
    };

    let parsed = match command {
        "help" => {
            for line in HELP {
                log::info!("{}", line);
            }
            return Ok(None);
        }
        "add" => PanelCommand::AddPoint {
            time: parse_f64(parts.next(), "time")?,
            value: parse_f64(parts.next(), "value")?,
        },
        "grab" => PanelCommand::Grab(parse_id(parts.next())?),
        "drag" => PanelCommand::DragTo {
            time: parse_f64(parts.next(), "time")?,
            value: parse_f64(parts.next(), "value")?,
        },
        "move" => PanelCommand::MovePoint {
            id: parse_id(parts.next())?,
            time: parse_f64(parts.next(), "time")?,
            value: parse_f64(parts.next(), "value")?,
        },
        "release" => PanelCommand::Release,
        "clear" => PanelCommand::Clear,
        "points" => PanelCommand::ShowPoints,
        "value" => PanelCommand::Value(parse_f64(parts.next(), "time")?),
        "limit" => PanelCommand::ShowLimit,
        "extend" => PanelCommand::Extend,
        "play" => PanelCommand::Play,
        "halt" => PanelCommand::Halt,
        "send" => PanelCommand::SendSchedule,
        "stop" => PanelCommand::SendStop,
        "joy" => {
            let x = parse_f64(parts.next(), "x")?;
            let y = parse_f64(parts.next(), "y")?;
            let angle_degree = match parts.next() {
                Some(angle) => Some(parse_f64(Some(angle), "angle")?),
                None => None,
            };
            PanelCommand::Joystick(JoystickEvent::Move { x, y, angle_degree })
        }
        "joy_end" => PanelCommand::Joystick(JoystickEvent::End),
        "quit" | "exit" => PanelCommand::Quit,
        _ => anyhow::bail!("Unknown command: {}", command),
    };
    Ok(Some(parsed))
}

/// Reads commands from stdin until EOF or `quit`, forwarding them to the panel.
pub fn handle_stdin_command(tx: Sender<PanelCommand>) {
    let stdin = io::stdin();
    let mut handle = stdin.lock();
    loop {
        let mut cmdline = String::new();
        match handle.read_line(&mut cmdline) {
            Ok(0) => {
                log::debug!("stdin closed");
                let _ = tx.send(PanelCommand::Quit);
                return;
            }
            Ok(_) => {}
            Err(e) => match e.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted => continue,
                _ => {
                    log::info!("handle_stdin_command: read from stdin failed: {e}");
                    continue;
                }
            },
        }

        match parse_command(cmdline.trim()) {
            Ok(Some(command)) => {
                let quit = command == PanelCommand::Quit;
                if tx.send(command).is_err() || quit {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => log::error!("{}", e),
        }
    }
}
