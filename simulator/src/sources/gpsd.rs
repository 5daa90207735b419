use hudcore::channels::PositionReading;
use hudcore::prelude::{ServiceError, ServiceResult};
use hudcore::services::PositionSource;
use serde::Deserialize;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true}\n";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const READ_TIMEOUT: Duration = Duration::from_secs(1);
/// Non-TPV reports skipped per poll before giving up until the next one.
const MAX_REPORTS_PER_POLL: usize = 16;

#[derive(Debug, Deserialize)]
struct Report {
    class: String,
    lat: Option<f64>,
    lon: Option<f64>,
    speed: Option<f64>,
    track: Option<f64>,
}

/// Position reading from one gpsd JSON line, if it is a TPV report.
pub fn parse_report(line: &str) -> Option<PositionReading> {
    let report: Report = serde_json::from_str(line).ok()?;
    if report.class != "TPV" {
        return None;
    }
    Some(PositionReading::new(
        report.lat,
        report.lon,
        report.speed,
        report.track,
    ))
}

/// Client for a gpsd daemon speaking its JSON watch protocol over TCP.
pub struct GpsdClient {
    address: String,
    read_timeout: Duration,
    reader: Option<BufReader<TcpStream>>,
    // Bytes of a report cut off by a read timeout, completed next poll.
    pending: String,
}

impl GpsdClient {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            read_timeout: READ_TIMEOUT,
            reader: None,
            pending: String::new(),
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// An address that does not resolve is treated like a refused
    /// connection: the daemon's host may simply not be up yet.
    fn resolve(&self) -> ServiceResult<SocketAddr> {
        self.address
            .to_socket_addrs()
            .map_err(|err| ServiceError::Disconnected(format!("{}: {}", self.address, err)))?
            .next()
            .ok_or_else(|| ServiceError::Disconnected(format!("{} resolves to nothing", self.address)))
    }
}

fn disconnected(err: std::io::Error) -> ServiceError {
    ServiceError::Disconnected(err.to_string())
}

impl PositionSource for GpsdClient {
    fn connect(&mut self) -> ServiceResult<()> {
        let address = self.resolve()?;
        let mut stream = TcpStream::connect_timeout(&address, CONNECT_TIMEOUT).map_err(disconnected)?;
        stream
            .set_read_timeout(Some(self.read_timeout))
            .map_err(disconnected)?;
        stream.write_all(WATCH_COMMAND).map_err(disconnected)?;
        self.reader = Some(BufReader::new(stream));
        self.pending.clear();
        Ok(())
    }

    fn next_fix(&mut self) -> ServiceResult<Option<PositionReading>> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| ServiceError::Disconnected("not connected".into()))?;

        for _ in 0..MAX_REPORTS_PER_POLL {
            match reader.read_line(&mut self.pending) {
                Ok(0) => return Err(ServiceError::Disconnected("gpsd closed the stream".into())),
                // Stream ended mid-report; the next read reports the close.
                Ok(_) if !self.pending.ends_with('\n') => return Ok(None),
                Ok(_) => {
                    let parsed = parse_report(self.pending.trim());
                    self.pending.clear();
                    if parsed.is_some() {
                        return Ok(parsed);
                    }
                }
                // read_line keeps the partial line in `pending`.
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(None)
                }
                Err(err) => return Err(disconnected(err)),
            }
        }
        Ok(None)
    }

    fn disconnect(&mut self) {
        self.reader = None;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn tpv_reports_become_readings() {
        let reading = parse_report(
            r#"{"class":"TPV","mode":3,"lat":51.5,"lon":-0.12,"speed":1.5,"track":270.0}"#,
        )
        .unwrap();
        assert_eq!(reading.latitude, Some(51.5));
        assert_eq!(reading.heading_deg, Some(270.0));

        let no_track = parse_report(r#"{"class":"TPV","mode":1}"#).unwrap();
        assert!(!no_track.has_fix());
        assert_eq!(no_track.heading_deg, None);

        assert!(parse_report(r#"{"class":"SKY","satellites":[]}"#).is_none());
        assert!(parse_report("garbage").is_none());
    }

    #[test]
    fn client_watches_and_reads_until_stream_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut command = String::new();
            reader.read_line(&mut command).unwrap();
            let mut stream = stream;
            stream
                .write_all(b"{\"class\":\"VERSION\",\"release\":\"3.22\"}\n")
                .unwrap();
            stream
                .write_all(b"{\"class\":\"TPV\",\"lat\":10.0,\"lon\":20.0,\"track\":45.0}\n")
                .unwrap();
            command
        });

        let mut client = GpsdClient::new(address.to_string());
        client.connect().unwrap();
        let reading = client.next_fix().unwrap().unwrap();
        assert_eq!(reading.latitude, Some(10.0));
        assert_eq!(reading.heading_deg, Some(45.0));

        let command = server.join().unwrap();
        assert!(command.starts_with("?WATCH="));

        let err = client.next_fix().unwrap_err();
        assert!(matches!(err, ServiceError::Disconnected(_)));
    }

    #[test]
    fn refused_connection_is_a_disconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let mut client = GpsdClient::new(address.to_string());
        assert!(matches!(client.connect(), Err(ServiceError::Disconnected(_))));
        assert!(matches!(client.next_fix(), Err(ServiceError::Disconnected(_))));
    }

    #[test]
    fn unresolvable_host_is_a_disconnect() {
        let mut client = GpsdClient::new("gpsd.invalid:2947");
        assert!(matches!(client.connect(), Err(ServiceError::Disconnected(_))));

        let mut client = GpsdClient::new("no port here");
        assert!(matches!(client.connect(), Err(ServiceError::Disconnected(_))));
    }

    #[test]
    fn report_split_by_read_timeout_is_completed_next_poll() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let (resume_tx, resume_rx) = mpsc::channel::<()>();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"{\"class\":\"TPV\",\"lat\":1").unwrap();
            resume_rx.recv().unwrap();
            stream.write_all(b".5,\"lon\":2.0,\"track\":90.0}\n").unwrap();
            // Hold the connection until the client has read the report.
            resume_rx.recv().ok();
        });

        let mut client =
            GpsdClient::new(address.to_string()).with_read_timeout(Duration::from_millis(50));
        client.connect().unwrap();
        assert_eq!(client.next_fix().unwrap(), None);

        resume_tx.send(()).unwrap();
        let reading = (0..100)
            .find_map(|_| client.next_fix().unwrap())
            .unwrap();
        assert_eq!(reading.latitude, Some(1.5));
        assert_eq!(reading.longitude, Some(2.0));
        assert_eq!(reading.heading_deg, Some(90.0));

        drop(resume_tx);
        server.join().unwrap();
    }
}
