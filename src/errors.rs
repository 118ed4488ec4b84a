// Error types for raceline

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum RacelineError {
    // Errors resolving sessions from the telemetry source
    #[snafu(display("Session not found: {year} {event} {session}"))]
    SessionNotFound {
        year: u16,
        event: String,
        session: String,
    },
    #[snafu(display("No telemetry data available for any driver"))]
    NoTelemetryAvailable,
    #[snafu(display("No valid time data found in driver series"))]
    NoTimeData,
    #[snafu(display("Telemetry source error: {description}"))]
    TelemetrySourceError { description: String },

    // Errors for recorded session files
    #[snafu(display("Invalid session recording: {path}"))]
    InvalidSessionRecording { path: String },
    #[snafu(display("Error reading session recording"))]
    SessionRecordingIOError { source: io::Error },

    // Result cache errors
    #[snafu(display("Cache store error: {reason}"))]
    StoreError { reason: String },
    #[snafu(display("Error reading cached document"))]
    StoreIOError { source: io::Error },
    #[snafu(display("Error serializing cached document"))]
    StoreSerializeError { source: serde_json::Error },
    #[snafu(display(
        "Legacy cached document format detected. This entry was written by an older version of raceline and will be rebuilt from source data."
    ))]
    LegacyCacheFormat,

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Output errors for the CLI
    #[snafu(display("Error writing output file"))]
    OutputIOError { source: io::Error },
}
