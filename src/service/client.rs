use chrono::Local;
use std::io::{self, BufRead, BufReader, Write};
use std::net;

use crate::dispatch::elevator::{Direction, Status};
use crate::service::error::ServiceError;
use crate::service::protocol::{Request, Response};
use crate::service::server::DispatchHandle;

/// Anything that can answer a request: a remote server or an in-process
/// dispatcher.
pub trait Transport {
    fn send(&mut self, request: &Request) -> Result<Response, ServiceError>;
}

/// Blocking line-based client, one request in flight at a time.
pub struct Client {
    reader: BufReader<net::TcpStream>,
    writer: net::TcpStream,
}

impl Client {
    pub fn connect<A: net::ToSocketAddrs>(addr: A) -> Result<Client, ServiceError> {
        let stream = net::TcpStream::connect(addr)?;
        Ok(Client {
            reader: BufReader::new(stream.try_clone()?),
            writer: stream,
        })
    }

    pub fn send(&mut self, request: &Request) -> Result<Response, ServiceError> {
        let line = serde_json::to_string(request)?;
        self.send_raw(&line)
    }

    /// Sends `line` as is. Useful for talking to the server by hand.
    pub fn send_raw(&mut self, line: &str) -> Result<Response, ServiceError> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(ServiceError::Disconnected);
        }
        Ok(serde_json::from_str(&reply)?)
    }
}

impl Transport for Client {
    fn send(&mut self, request: &Request) -> Result<Response, ServiceError> {
        Client::send(self, request)
    }
}

impl Transport for DispatchHandle {
    fn send(&mut self, request: &Request) -> Result<Response, ServiceError> {
        self.call(request.clone())
    }
}

const MENU: &str = "
Available commands:
  1. View elevator status
  2. Request floor (with direction)
  3. Step elevator
  4. Reset elevator
  5. Help
  q. Quit";

const HELP: &str = "
Directions: 1 = hall call going up, -1 = hall call going down,
0 = destination pressed inside the car.
Each step moves the car at most one floor. The car finishes its
current sweep before turning around.";

fn direction_name(dirn: Direction) -> &'static str {
    match dirn {
        Direction::Up => "UP",
        Direction::Down => "DOWN",
        Direction::Idle => "IDLE",
    }
}

pub fn write_status<W: Write>(out: &mut W, status: &Status) -> io::Result<()> {
    writeln!(out, "Elevator {} at {}", status.id, Local::now().format("%H:%M:%S"))?;
    writeln!(out, "  Current floor: {}", status.current_floor)?;
    writeln!(out, "  Direction:     {}", direction_name(status.direction))?;
    match status.next_stop {
        Some(floor) => writeln!(out, "  Next stop:     {}", floor)?,
        None => writeln!(out, "  Next stop:     -")?,
    }
    if status.pending.is_empty() {
        writeln!(out, "  Pending:       []")?;
    } else {
        writeln!(out, "  Pending:")?;
        for pending in &status.pending {
            let calls: Vec<String> = pending.directions.iter().map(|&c| i64::from(c).to_string()).collect();
            writeln!(out, "    floor {:>3}  [{}]", pending.floor, calls.join(", "))?;
        }
    }
    Ok(())
}

fn write_response<W: Write>(out: &mut W, response: &Response) -> io::Result<()> {
    match response {
        Response::Status(status) => write_status(out, status),
        Response::Error(body) => writeln!(out, "Error: {}", body.detail),
    }
}

/// Prints `question` and reads one trimmed line. `None` on end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> io::Result<Option<String>> {
    write!(out, "{}", question)?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt_number<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    question: &str,
    default: Option<i64>,
) -> io::Result<Option<Option<i64>>> {
    let answer = match prompt(input, out, question)? {
        Some(answer) => answer,
        None => return Ok(None),
    };
    if answer.is_empty() {
        if let Some(value) = default {
            return Ok(Some(Some(value)));
        }
    }
    match answer.parse::<i64>() {
        Ok(value) => Ok(Some(Some(value))),
        Err(_) => {
            writeln!(out, "Error: '{}' is not a whole number", answer)?;
            Ok(Some(None))
        }
    }
}

/// Interactive numbered menu. Returns when the user quits or input ends.
pub fn run_menu<T: Transport, R: BufRead, W: Write>(
    transport: &mut T,
    mut input: R,
    mut out: W,
) -> Result<(), ServiceError> {
    loop {
        writeln!(out, "{}", MENU)?;
        let choice = match prompt(&mut input, &mut out, "> ")? {
            Some(choice) => choice,
            None => return Ok(()),
        };
        let request = match choice.as_str() {
            "1" => Request::Status,
            "2" => {
                let floor = match prompt_number(&mut input, &mut out, "Floor: ", None)? {
                    Some(Some(floor)) => floor,
                    Some(None) => continue,
                    None => return Ok(()),
                };
                let direction = match prompt_number(&mut input, &mut out, "Direction (-1, 0 or 1): ", None)? {
                    Some(Some(direction)) => direction,
                    Some(None) => continue,
                    None => return Ok(()),
                };
                Request::RequestFloor { floor, direction }
            }
            "3" => match prompt_number(&mut input, &mut out, "Steps (default 1): ", Some(1))? {
                Some(Some(steps)) => Request::Step { steps },
                Some(None) => continue,
                None => return Ok(()),
            },
            "4" => match prompt(&mut input, &mut out, "Reset the elevator? (y/n): ")? {
                Some(answer) if answer.eq_ignore_ascii_case("y") => Request::Reset,
                Some(_) => {
                    writeln!(out, "Reset cancelled.")?;
                    continue;
                }
                None => return Ok(()),
            },
            "5" => {
                writeln!(out, "{}", HELP)?;
                continue;
            }
            "q" | "Q" => return Ok(()),
            other => {
                writeln!(out, "Unknown command '{}'", other)?;
                continue;
            }
        };
        let response = transport.send(&request)?;
        write_response(&mut out, &response)?;
    }
}
