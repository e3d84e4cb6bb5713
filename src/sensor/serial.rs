// Serial adapter for the pH probe
//
// Speaks the probe's request/response protocol: send "R\r", wait for the
// device to take its measurement, then read one CR-terminated response
// line. The first comma-separated token of the response is the raw pH
// figure; anything else is malformed.

use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use log::debug;

use crate::config::SensorConfig;
use crate::error::SensorError;
use crate::sensor::RawPhSource;

/// Read command understood by the probe
const READ_COMMAND: &[u8] = b"R\r";

/// Upper bound on one response line, well beyond any real reply
const MAX_RESPONSE_BYTES: usize = 64;

/// Serial probe producing raw pH readings
pub struct SerialPhSensor {
    port: Box<dyn serialport::SerialPort>,
    port_name: String,
    response_delay: Duration,
}

impl SerialPhSensor {
    /// Open the configured serial port
    ///
    /// # Arguments
    /// * `config` - Port path, baud rate, timeout and response delay
    ///
    /// # Errors
    /// `SensorError::PortUnavailable` when the port cannot be opened
    pub fn open(config: &SensorConfig) -> Result<Self, SensorError> {
        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .timeout(Duration::from_millis(config.timeout_ms))
            .open()
            .map_err(|err| SensorError::PortUnavailable {
                port: config.port.clone(),
                reason: err.to_string(),
            })?;
        log::info!(
            "[Sensor] Opened {} at {} baud",
            config.port,
            config.baud_rate
        );
        Ok(Self {
            port,
            port_name: config.port.clone(),
            response_delay: Duration::from_millis(config.response_delay_ms),
        })
    }

    /// Read one CR/LF-terminated response line from the port
    fn read_response_line(&mut self) -> Result<String, SensorError> {
        read_line_bounded(&mut self.port, &self.port_name)
    }
}

/// Read one CR/LF-terminated line, consuming at most `MAX_RESPONSE_BYTES`
/// bytes in total
///
/// Leftover terminators from a previous reply are skipped but still count
/// against the budget, so a device streaming bare terminators fails with
/// `ReadTimeout` instead of spinning.
fn read_line_bounded<R: Read>(reader: &mut R, port_name: &str) -> Result<String, SensorError> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    for _ in 0..MAX_RESPONSE_BYTES {
        match reader.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                if byte[0] == b'\r' || byte[0] == b'\n' {
                    if line.is_empty() {
                        continue;
                    }
                    break;
                }
                line.push(byte[0]);
            }
            Err(err) if err.kind() == ErrorKind::TimedOut => {
                if line.is_empty() {
                    return Err(SensorError::ReadTimeout {
                        port: port_name.to_string(),
                    });
                }
                break;
            }
            Err(err) => {
                return Err(SensorError::PortUnavailable {
                    port: port_name.to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }
    if line.is_empty() {
        return Err(SensorError::ReadTimeout {
            port: port_name.to_string(),
        });
    }
    String::from_utf8(line).map_err(|err| SensorError::MalformedResponse {
        response: format!("{:?}", err.as_bytes()),
    })
}

impl RawPhSource for SerialPhSensor {
    fn next_raw_reading(&mut self) -> Result<f64, SensorError> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(|err| SensorError::PortUnavailable {
                port: self.port_name.clone(),
                reason: err.to_string(),
            })?;
        self.port
            .write_all(READ_COMMAND)
            .map_err(|err| SensorError::PortUnavailable {
                port: self.port_name.clone(),
                reason: err.to_string(),
            })?;

        // The probe needs time to take its measurement before it replies
        thread::sleep(self.response_delay);

        let response = self.read_response_line()?;
        debug!("[Sensor] Response: {:?}", response);
        parse_response(&response)
    }
}

/// Parse the probe response into a raw reading
///
/// The probe terminates replies with CR and may append status tokens
/// after a comma (e.g. "7.04,OK"); only the first token carries the
/// reading.
pub(crate) fn parse_response(response: &str) -> Result<f64, SensorError> {
    let token = response.trim().split(',').next().unwrap_or("").trim();
    token
        .parse::<f64>()
        .map_err(|_| SensorError::MalformedResponse {
            response: response.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_plain_reading() {
        assert_eq!(parse_response("7.04"), Ok(7.04));
    }

    #[test]
    fn test_parse_trims_line_noise() {
        assert_eq!(parse_response(" 7.04\r\n"), Ok(7.04));
    }

    #[test]
    fn test_parse_takes_first_comma_token() {
        assert_eq!(parse_response("7.04,OK"), Ok(7.04));
        assert_eq!(parse_response("6.86, 25.0"), Ok(6.86));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        match parse_response("ERR") {
            Err(SensorError::MalformedResponse { response }) => {
                assert_eq!(response, "ERR");
            }
            other => panic!("Expected MalformedResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(parse_response("").is_err());
        assert!(parse_response("\r\n").is_err());
    }

    #[test]
    fn test_parse_full_reading_range() {
        assert_eq!(parse_response("-0.12"), Ok(-0.12));
        assert_eq!(parse_response("10.25"), Ok(10.25));
        assert_eq!(parse_response("14.00"), Ok(14.0));
    }

    #[test]
    fn test_read_line_skips_stale_terminators() {
        let mut wire = Cursor::new(b"\r\n7.04\r".to_vec());
        assert_eq!(read_line_bounded(&mut wire, "bench"), Ok("7.04".to_string()));
    }

    #[test]
    fn test_terminator_flood_fails_instead_of_spinning() {
        let mut wire = Cursor::new(vec![b'\r'; MAX_RESPONSE_BYTES * 4]);
        match read_line_bounded(&mut wire, "bench") {
            Err(SensorError::ReadTimeout { port }) => assert_eq!(port, "bench"),
            other => panic!("Expected ReadTimeout, got {:?}", other),
        }
    }

    #[test]
    fn test_silent_port_reports_timeout() {
        let mut wire = Cursor::new(Vec::new());
        match read_line_bounded(&mut wire, "bench") {
            Err(SensorError::ReadTimeout { port }) => assert_eq!(port, "bench"),
            other => panic!("Expected ReadTimeout, got {:?}", other),
        }
    }

    #[test]
    fn test_overlong_reply_is_cut_at_the_budget() {
        let mut wire = Cursor::new(vec![b'9'; MAX_RESPONSE_BYTES * 2]);
        let line = read_line_bounded(&mut wire, "bench").unwrap();
        assert_eq!(line.len(), MAX_RESPONSE_BYTES);
    }
}
