use crossbeam_channel as cbc;
use log::{debug, info, warn};
use std::io::{BufRead, BufReader, Write};
use std::net;
use std::thread;

use crate::dispatch::elevator::Elevator;
use crate::service::error::ServiceError;
use crate::service::protocol::{self, Request, Response};
use crate::service::sock;
use crate::util::config::Config;

/// A request on its way to the dispatcher, with the channel the answer goes
/// back on.
#[derive(Debug)]
pub struct Command {
    pub request: Request,
    pub reply_tx: cbc::Sender<Response>,
}

/// Cloneable access to the dispatcher thread. The dispatcher stops once
/// every handle is dropped.
#[derive(Clone, Debug)]
pub struct DispatchHandle {
    command_tx: cbc::Sender<Command>,
}

impl DispatchHandle {
    pub fn call(&self, request: Request) -> Result<Response, ServiceError> {
        let (reply_tx, reply_rx) = cbc::bounded::<Response>(1);
        self.command_tx
            .send(Command { request, reply_tx })
            .map_err(|_| ServiceError::Disconnected)?;
        reply_rx.recv().map_err(|_| ServiceError::Disconnected)
    }
}

/// Applies the range policy, then the request itself.
pub fn handle_request(elevator: &mut Elevator, config: &Config, request: Request) -> Response {
    match request {
        Request::Status => Response::Status(elevator.status()),
        Request::RequestFloor { floor, direction } => config
            .check_floor(floor)
            .and_then(|_| elevator.request(floor, direction))
            .into(),
        Request::Step { steps } => config
            .check_steps(steps)
            .and_then(|_| elevator.step(steps))
            .into(),
        Request::Reset => Response::Status(elevator.reset()),
    }
}

enum Wake {
    Command(Command),
    Tick,
    TickerGone,
    Stop,
}

/// Owns the elevator for its whole life and resolves commands one at a time.
/// Each message on `tick_rx` counts as one step.
pub fn run_dispatcher(
    mut elevator: Elevator,
    config: Config,
    command_rx: cbc::Receiver<Command>,
    mut tick_rx: cbc::Receiver<()>,
) {
    loop {
        let wake = cbc::select! {
            recv(command_rx) -> a => match a {
                Ok(command) => Wake::Command(command),
                Err(_) => Wake::Stop,
            },
            recv(tick_rx) -> a => match a {
                Ok(()) => Wake::Tick,
                Err(_) => Wake::TickerGone,
            },
        };
        match wake {
            Wake::Command(command) => {
                let response = handle_request(&mut elevator, &config, command.request);
                if let Response::Error(body) = &response {
                    warn!("Rejected request: {}", body.detail);
                }
                // The client may have gone away while we were working
                let _ = command.reply_tx.send(response);
            }
            Wake::Tick => match elevator.step(1) {
                Ok(status) => debug!("Tick: floor {}, {:?}", status.current_floor, status.direction),
                Err(e) => warn!("Tick failed: {}", e),
            },
            Wake::TickerGone => tick_rx = cbc::never(),
            Wake::Stop => break,
        }
    }
    info!("Dispatcher for {} stopped", elevator.get_id());
}

/// Starts the dispatcher thread, plus its step ticker when `autoStepMs` is
/// set. The ticker lives on the dispatcher thread and stops with it.
pub fn spawn_dispatcher(
    elevator: Elevator,
    config: Config,
) -> Result<(DispatchHandle, thread::JoinHandle<()>), ServiceError> {
    config.validate()?;
    let (command_tx, command_rx) = cbc::unbounded::<Command>();
    let auto_step = config.auto_step_ms;
    let join = thread::spawn(move || match auto_step {
        Some(period_ms) => {
            let (tick_tx, tick_rx) = cbc::unbounded::<()>();
            let ticker = timer::Timer::new();
            let _guard = ticker.schedule_repeating(chrono::Duration::milliseconds(period_ms as i64), move || {
                let _ = tick_tx.send(());
            });
            info!("Auto-stepping every {} ms", period_ms);
            run_dispatcher(elevator, config, command_rx, tick_rx);
        }
        None => run_dispatcher(elevator, config, command_rx, cbc::never()),
    });
    Ok((DispatchHandle { command_tx }, join))
}

pub struct Server {
    listener: net::TcpListener,
    handle: DispatchHandle,
}

impl Server {
    pub fn bind(config: Config) -> Result<Server, ServiceError> {
        let addr: net::SocketAddr = config
            .listen_addr
            .parse()
            .map_err(|e| ServiceError::Config(format!("bad listen address {}: {}", config.listen_addr, e)))?;
        let (handle, _dispatcher) = spawn_dispatcher(Elevator::new(config.id.clone()), config)?;
        let listener = sock::new_listener(addr)?;
        Ok(Server { listener, handle })
    }

    pub fn local_addr(&self) -> Result<net::SocketAddr, ServiceError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn handle(&self) -> DispatchHandle {
        self.handle.clone()
    }

    /// Accepts clients forever, one thread per connection.
    pub fn run(self) -> Result<(), ServiceError> {
        info!("Listening on {}", self.local_addr()?);
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let handle = self.handle.clone();
                    thread::spawn(move || {
                        if let Err(e) = serve_connection(stream, handle) {
                            warn!("Connection closed with error: {}", e);
                        }
                    });
                }
                Err(e) => warn!("Failed to accept connection: {}", e),
            }
        }
        Ok(())
    }
}

fn serve_connection(stream: net::TcpStream, handle: DispatchHandle) -> Result<(), ServiceError> {
    let peer = stream.peer_addr()?;
    info!("Client {} connected", peer);
    let reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match protocol::parse_request(&line) {
            Ok(request) => handle.call(request)?,
            Err(err) => {
                warn!("Malformed request from {}: {}", peer, err);
                err.into()
            }
        };
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes())?;
    }
    info!("Client {} disconnected", peer);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dispatch::elevator::{Direction, Status};
    use crate::service::client::Client;
    use crate::service::protocol::ErrorKind;
    use crate::util::constants as setting;
    use std::time;

    fn expect_status(response: Response) -> Status {
        match response {
            Response::Status(status) => status,
            Response::Error(body) => panic!("unexpected error: {}", body.detail),
        }
    }

    #[test]
    fn it_applies_the_floor_range_before_the_engine() {
        let mut elevator = Elevator::default();
        let config = Config::default();
        let response = handle_request(&mut elevator, &config, Request::RequestFloor { floor: 11, direction: 1 });
        match response {
            Response::Error(body) => {
                assert_eq!(body.kind, ErrorKind::InvalidArgument);
                assert!(body.detail.contains("cannot exceed max floor"));
            }
            other => panic!("expected an error, got {:?}", other),
        }
        assert!(!elevator.get_orders().has_any());
    }

    #[test]
    fn it_reports_engine_errors() {
        let mut elevator = Elevator::default();
        let config = Config::default();
        let bad_direction = handle_request(&mut elevator, &config, Request::RequestFloor { floor: 3, direction: 2 });
        assert!(matches!(bad_direction, Response::Error(_)));
        let bad_steps = handle_request(&mut elevator, &config, Request::Step { steps: 0 });
        assert!(matches!(bad_steps, Response::Error(_)));
        let too_many = handle_request(&mut elevator, &config, Request::Step { steps: config.max_steps_per_call + 1 });
        assert!(matches!(too_many, Response::Error(_)));
    }

    #[test]
    fn it_serializes_callers_through_the_dispatcher() {
        let (handle, join) = spawn_dispatcher(Elevator::default(), Config::default()).unwrap();
        let workers: Vec<_> = (1..=4)
            .map(|floor| {
                let handle = handle.clone();
                thread::spawn(move || handle.call(Request::RequestFloor { floor, direction: 0 }).unwrap())
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        let status = expect_status(handle.call(Request::Step { steps: 4 }).unwrap());
        assert_eq!(status.current_floor, 4);
        assert!(status.pending.is_empty());
        assert_eq!(status.direction, Direction::Idle);

        let status = expect_status(handle.call(Request::Reset).unwrap());
        assert_eq!(status.current_floor, 0);

        drop(handle);
        join.join().unwrap();
    }

    #[test]
    fn it_steps_on_its_own_when_auto_step_is_set() {
        let config = Config {
            auto_step_ms: Some(5),
            ..Config::default()
        };
        let (handle, _join) = spawn_dispatcher(Elevator::default(), config).unwrap();
        handle.call(Request::RequestFloor { floor: 3, direction: 0 }).unwrap();
        let deadline = time::Instant::now() + time::Duration::from_secs(5);
        loop {
            let status = expect_status(handle.call(Request::Status).unwrap());
            if status.current_floor == 3 && status.pending.is_empty() {
                break;
            }
            assert!(time::Instant::now() < deadline, "auto-step never reached floor 3");
            thread::sleep(time::Duration::from_millis(5));
        }
    }

    #[test]
    fn it_refuses_to_start_with_a_bad_tick_period() {
        for period in &[0, setting::MAX_AUTO_STEP_MS + 1, u64::MAX] {
            let config = Config {
                auto_step_ms: Some(*period),
                ..Config::default()
            };
            let result = spawn_dispatcher(Elevator::default(), config);
            assert!(matches!(result, Err(ServiceError::Config(_))));
        }
    }

    #[test]
    fn it_refuses_to_bind_with_an_inverted_floor_range() {
        let config = Config {
            listen_addr: "127.0.0.1:0".to_string(),
            min_floor: 4,
            max_floor: 1,
            ..Config::default()
        };
        assert!(matches!(Server::bind(config), Err(ServiceError::Config(_))));
    }

    #[test]
    fn it_answers_over_tcp() {
        let config = Config {
            listen_addr: "127.0.0.1:0".to_string(),
            ..Config::default()
        };
        let server = Server::bind(config).unwrap();
        let addr = server.local_addr().unwrap();
        let local = server.handle();
        thread::spawn(move || server.run());

        let mut client = Client::connect(addr).unwrap();
        let status = expect_status(client.send(&Request::RequestFloor { floor: 5, direction: 1 }).unwrap());
        assert_eq!(status.direction, Direction::Up);
        let status = expect_status(client.send(&Request::Step { steps: 5 }).unwrap());
        assert_eq!(status.current_floor, 5);
        assert_eq!(status.direction, Direction::Idle);

        let response = client.send_raw("{\"op\":\"request_floor\",\"floor\":1.5,\"direction\":1}").unwrap();
        assert!(matches!(response, Response::Error(_)));
        // Still usable after bad input
        let status = expect_status(client.send(&Request::Status).unwrap());
        assert_eq!(status.current_floor, 5);

        // Remote and in-process callers share one engine
        let status = expect_status(local.call(Request::Reset).unwrap());
        assert_eq!(status.current_floor, 0);
        let status = expect_status(client.send(&Request::Status).unwrap());
        assert_eq!(status.current_floor, 0);
    }
}
