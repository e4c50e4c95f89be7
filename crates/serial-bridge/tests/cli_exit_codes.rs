//! Process-level tests for the `serial-bridge` binary.
//!
//! Each test starts the real executable on free loopback ports, drives it
//! from outside (signals, an occupied port, a bad config file) and checks the
//! exit status the process reports.
//!
//! | Situation                      | Expected exit code |
//! |--------------------------------|--------------------|
//! | SIGTERM or SIGINT while idle   | 0                  |
//! | Listen port already in use     | 2                  |
//! | Config file missing            | 1                  |

#![cfg(unix)]

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const EXIT_TIMEOUT: Duration = Duration::from_secs(5);

// ── Harness ───────────────────────────────────────────────────────────────────

/// Kills the child if a test panics before it exits.
struct BridgeProcess {
    child: Child,
}

impl BridgeProcess {
    fn spawn(args: &[&str]) -> Self {
        let child = Command::new(env!("CARGO_BIN_EXE_serial-bridge"))
            .args(args)
            .env_remove("SERIAL_BRIDGE_CONFIG")
            .env_remove("SERIAL_BRIDGE_LISTEN_HOST")
            .env_remove("SERIAL_BRIDGE_LISTEN_PORT")
            .env_remove("SERIAL_BRIDGE_CONTROLLER_HOST")
            .env_remove("SERIAL_BRIDGE_CONTROLLER_PORT")
            .env_remove("SERIAL_BRIDGE_RECONNECT_INTERVAL_MS")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn serial-bridge");
        Self { child }
    }

    /// Starts a bridge listening on `listen` with an unreachable controller.
    fn spawn_idle(listen: SocketAddr) -> Self {
        let listen_port = listen.port().to_string();
        let controller_port = free_port().to_string();
        Self::spawn(&[
            "--listen-host",
            "127.0.0.1",
            "--listen-port",
            &listen_port,
            "--controller-host",
            "127.0.0.1",
            "--controller-port",
            &controller_port,
            "--reconnect-interval-ms",
            "50",
        ])
    }

    /// Waits until the bridge accepts connections on `addr`.
    ///
    /// The listener only exists after the signal handlers are installed, so
    /// a successful connect also means signals are safe to send.
    fn wait_until_listening(&mut self, addr: SocketAddr) {
        let start = Instant::now();
        loop {
            if TcpStream::connect_timeout(&addr, Duration::from_millis(200)).is_ok() {
                return;
            }
            if let Some(status) = self.child.try_wait().expect("poll child") {
                panic!("serial-bridge exited during startup: {status}");
            }
            assert!(
                start.elapsed() < STARTUP_TIMEOUT,
                "serial-bridge did not listen on {addr} within {STARTUP_TIMEOUT:?}"
            );
            thread::sleep(Duration::from_millis(20));
        }
    }

    fn signal(&self, name: &str) {
        let status = Command::new("kill")
            .args([format!("-{name}"), self.child.id().to_string()])
            .status()
            .expect("run kill");
        assert!(status.success(), "kill -{name} failed");
    }

    fn wait_for_exit(&mut self) -> ExitStatus {
        let start = Instant::now();
        loop {
            if let Some(status) = self.child.try_wait().expect("poll child") {
                return status;
            }
            assert!(
                start.elapsed() < EXIT_TIMEOUT,
                "serial-bridge did not exit within {EXIT_TIMEOUT:?}"
            );
            thread::sleep(Duration::from_millis(20));
        }
    }
}

impl Drop for BridgeProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Reserves a loopback port and frees it again.
fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn free_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], free_port()))
}

// ── Signals ───────────────────────────────────────────────────────────────────

#[test]
fn test_sigterm_stops_bridge_with_exit_code_0() {
    // Arrange
    let addr = free_addr();
    let mut bridge = BridgeProcess::spawn_idle(addr);
    bridge.wait_until_listening(addr);

    // Act
    bridge.signal("TERM");

    // Assert
    assert_eq!(bridge.wait_for_exit().code(), Some(0));
}

#[test]
fn test_sigint_stops_bridge_with_exit_code_0() {
    // Arrange
    let addr = free_addr();
    let mut bridge = BridgeProcess::spawn_idle(addr);
    bridge.wait_until_listening(addr);

    // Act
    bridge.signal("INT");

    // Assert
    assert_eq!(bridge.wait_for_exit().code(), Some(0));
}

#[test]
fn test_sigterm_stops_bridge_with_connected_field_client() {
    // Arrange: a field client holds the passive connection open
    let addr = free_addr();
    let mut bridge = BridgeProcess::spawn_idle(addr);
    bridge.wait_until_listening(addr);
    let _field = TcpStream::connect(addr).unwrap();
    thread::sleep(Duration::from_millis(100));

    // Act
    bridge.signal("TERM");

    // Assert
    assert_eq!(bridge.wait_for_exit().code(), Some(0));
}

// ── Startup failures ──────────────────────────────────────────────────────────

#[test]
fn test_listen_port_in_use_exits_with_code_2() {
    // Arrange: occupy the port the bridge is told to listen on
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap();

    // Act
    let mut bridge = BridgeProcess::spawn_idle(addr);
    let status = bridge.wait_for_exit();

    // Assert
    assert_eq!(status.code(), Some(2));
    drop(taken);
}

#[test]
fn test_missing_config_file_exits_with_code_1() {
    // Act
    let mut bridge = BridgeProcess::spawn(&["--config", "/nonexistent/path/serial-bridge.toml"]);
    let status = bridge.wait_for_exit();

    // Assert
    assert_eq!(status.code(), Some(1));
}
