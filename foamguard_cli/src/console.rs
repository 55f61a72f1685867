//! Operator console on stdin.
//!
//! Each line becomes an inbound message for the run loop. `shutdown` and
//! `resume` drive the shutdown latch directly; anything else is a console
//! command whose reply is printed to stderr.

use std::io::BufRead;
use std::thread;
use std::time::Duration;

use crossbeam_channel as xch;
use foamguard_core::{CommandChannel, Inbound};

/// How long the reader waits for the loop to answer one command.
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Classify one console line.
pub fn parse_line(line: &str) -> Option<ConsoleLine> {
    match line.trim() {
        "" => None,
        "shutdown" => Some(ConsoleLine::Shutdown(true)),
        "resume" => Some(ConsoleLine::Shutdown(false)),
        other => Some(ConsoleLine::Command(other.to_string())),
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleLine {
    Shutdown(bool),
    Command(String),
}

/// Spawn the stdin reader. It exits at EOF or once the loop drops its receiver.
pub fn spawn_stdin_reader(tx: xch::Sender<Inbound>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let msg = match parse_line(&line) {
                None => continue,
                Some(ConsoleLine::Shutdown(on)) => {
                    if tx.send(Inbound::Shutdown(on)).is_err() {
                        break;
                    }
                    eprintln!("ok: {}", if on { "shutdown" } else { "resume" });
                    continue;
                }
                Some(ConsoleLine::Command(payload)) => payload,
            };
            let (reply_tx, reply_rx) = xch::bounded(1);
            let sent = tx.send(Inbound::Command {
                channel: CommandChannel::Console,
                payload: msg,
                reply_to: Some(reply_tx),
            });
            if sent.is_err() {
                break;
            }
            match reply_rx.recv_timeout(REPLY_TIMEOUT) {
                Ok(reply) => eprintln!("{reply}"),
                Err(_) => tracing::warn!("no reply from control loop"),
            }
        }
        tracing::debug!("console reader finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_lines_bypass_the_normalizer() {
        assert_eq!(parse_line(" shutdown "), Some(ConsoleLine::Shutdown(true)));
        assert_eq!(parse_line("resume"), Some(ConsoleLine::Shutdown(false)));
        assert_eq!(
            parse_line("threshold.set 70"),
            Some(ConsoleLine::Command("threshold.set 70".into()))
        );
        assert_eq!(parse_line("   "), None);
    }
}
