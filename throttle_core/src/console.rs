//! Line-oriented debug console.
//!
//! Commands act on the same `ActuatorHandle` the control loop writes through.
//! A `stop` zeroes the duty immediately; the next tick overwrites it as usual.
use throttle_traits::Actuator;

use crate::actuator::ActuatorHandle;

const HELP: &str = "\
Valid commands are:
help
  Show this help
ping
  Print pong here to see if the reply works
stop
  Stop the motor
fault
  Prints the current fault code
rpm
  Prints the current electrical RPM
tacho
  Prints tachometer value";

pub struct Console<A> {
    actuator: ActuatorHandle<A>,
}

impl<A: Actuator> Console<A> {
    pub fn new(actuator: ActuatorHandle<A>) -> Self {
        Self { actuator }
    }

    /// Run one command line and return the reply text.
    pub fn execute(&self, line: &str) -> String {
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            return "No command received".to_string();
        };

        match cmd {
            "ping" => "pong".to_string(),
            "stop" => match self.actuator.duty(0.0) {
                Ok(()) => {
                    tracing::info!("console stop");
                    "Motor stopped".to_string()
                }
                Err(e) => format!("Stop failed: {e}"),
            },
            "fault" => match self.actuator.fault() {
                Ok(code) => code.to_string(),
                Err(e) => format!("Fault code unavailable: {e}"),
            },
            "rpm" => match self.actuator.rpm() {
                Ok(rpm) => format!("Electrical RPM: {rpm:.2} rpm"),
                Err(e) => format!("RPM unavailable: {e}"),
            },
            "tacho" => match self.actuator.tacho() {
                Ok(counts) => format!("Tachometer counts: {counts}"),
                Err(e) => format!("Tachometer unavailable: {e}"),
            },
            "help" => HELP.to_string(),
            other => format!("Invalid command: {other}\ntype help to list all available commands"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use throttle_hardware::{SimCommand, SimulatedActuator};

    type Sim = SimulatedActuator;

    fn console(act: Sim) -> (Console<Sim>, ActuatorHandle<Sim>) {
        let h = ActuatorHandle::new(act);
        (Console::new(h.clone()), h)
    }

    #[test]
    fn stop_zeroes_duty() {
        let (c, h) = console(SimulatedActuator::fixed_rpm(30_000.0));
        h.drive(20.0).unwrap();
        assert_eq!(c.execute("stop"), "Motor stopped");
        assert_eq!(h.with(|a| a.last_command()), Some(SimCommand::Duty(0.0)));
    }

    #[test]
    fn stop_reports_actuator_fault() {
        let (c, _h) = console(SimulatedActuator::failing());
        assert!(c.execute("stop").starts_with("Stop failed"));
    }

    #[rstest]
    #[case("ping", "pong")]
    #[case("  ping  ", "pong")]
    #[case("", "No command received")]
    #[case("   ", "No command received")]
    #[case("rpm", "Electrical RPM: 1234.00 rpm")]
    #[case("fault", "FAULT_CODE_NONE")]
    #[case("tacho", "Tachometer counts: 0")]
    fn replies(#[case] line: &str, #[case] expected: &str) {
        let (c, _h) = console(SimulatedActuator::fixed_rpm(1234.0));
        assert_eq!(c.execute(line), expected);
    }

    #[test]
    fn fault_reports_latched_code() {
        let (c, _h) = console(SimulatedActuator::failing());
        assert_eq!(c.execute("fault"), "FAULT_CODE_GATE_DRIVER");
    }

    #[test]
    fn tacho_tracks_rotation() {
        let (c, h) = console(SimulatedActuator::fixed_rpm(60_000.0));
        for _ in 0..500 {
            h.brake(0.0).unwrap();
        }
        assert_eq!(c.execute("tacho"), "Tachometer counts: 3000");
        assert_eq!(c.execute("rpm"), "Electrical RPM: 60000.00 rpm");
    }

    #[test]
    fn help_lists_each_command_with_indented_description() {
        let (c, _h) = console(SimulatedActuator::new());
        let help = c.execute("help");
        let lines: Vec<&str> = help.lines().collect();
        assert_eq!(lines[0], "Valid commands are:");
        for cmd in ["help", "ping", "stop", "fault", "rpm", "tacho"] {
            let at = lines.iter().position(|l| *l == cmd).unwrap();
            assert!(lines[at + 1].starts_with("  "), "{cmd}");
        }
    }

    #[test]
    fn unknown_command_is_named() {
        let (c, h) = console(SimulatedActuator::new());
        assert!(c.execute("kv").starts_with("Invalid command: kv"));
        assert!(c.execute("help").contains("stop"));
        assert_eq!(h.with(|a| a.writes()), 0);
    }
}
