use hudcore::prelude::{ServiceError, ServiceResult};
use hudcore::processing::scan::{parse_iwlist, ScanEntry};
use hudcore::services::ScanSource;
use std::io::ErrorKind;
use std::process::Command;

/// Runs `iwlist <interface> scan` and parses its output.
pub struct IwlistScanner {
    program: String,
}

impl IwlistScanner {
    pub fn new() -> Self {
        Self::with_program("iwlist")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for IwlistScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanSource for IwlistScanner {
    fn scan(&mut self, interface: &str) -> ServiceResult<Vec<ScanEntry>> {
        let output = Command::new(&self.program)
            .arg(interface)
            .arg("scan")
            .output()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => {
                    ServiceError::Unavailable(format!("{} not installed", self.program))
                }
                _ => ServiceError::Transient(format!("{} failed to start: {}", self.program, err)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ServiceError::Transient(format!(
                "{} {} scan exited with {}: {}",
                self.program,
                interface,
                output.status,
                stderr.trim()
            )));
        }

        Ok(parse_iwlist(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_is_unavailable() {
        let mut scanner = IwlistScanner::with_program("iwlist-not-installed-here");
        assert!(matches!(
            scanner.scan("wlan1"),
            Err(ServiceError::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn failing_tool_is_transient() {
        let mut scanner = IwlistScanner::with_program("false");
        assert!(matches!(
            scanner.scan("wlan1"),
            Err(ServiceError::Transient(_))
        ));
    }
}
