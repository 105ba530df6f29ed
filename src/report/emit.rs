//! Report emission to stdout and `output.json`

use crate::error::{AudiometaError, Result};
use crate::report::schema::MetadataReport;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Default report file name, relative to the working directory
pub const DEFAULT_OUTPUT: &str = "output.json";

/// Render the report as JSON indented with four spaces
pub fn to_pretty_json(report: &MetadataReport) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    report.serialize(&mut serializer)?;
    // serde_json only ever writes valid UTF-8
    String::from_utf8(buf).map_err(|e| {
        AudiometaError::Serialization(serde::ser::Error::custom(e.to_string()))
    })
}

/// Write the report to `output_path`
///
/// Uses atomic write pattern: writes to a temp file first, then renames.
pub fn write_report(report: &MetadataReport, output_path: &Path) -> Result<()> {
    let rendered = to_pretty_json(report)?;
    write_atomic(rendered.as_bytes(), output_path)?;
    info!("Wrote report to {}", output_path.display());
    Ok(())
}

/// Print the report to `out` and persist it to `output_path`
///
/// The report is rendered once; a serialization failure writes nothing.
pub fn emit(report: &MetadataReport, out: &mut dyn Write, output_path: &Path) -> Result<()> {
    let rendered = to_pretty_json(report)?;

    writeln!(out, "{}", rendered)?;
    out.flush()?;

    write_atomic(rendered.as_bytes(), output_path)?;
    info!("Wrote report to {}", output_path.display());
    Ok(())
}

fn write_atomic(contents: &[u8], output_path: &Path) -> Result<()> {
    // Same directory as the target so the rename stays on one filesystem
    let temp_path = output_path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| AudiometaError::OutputError {
        path: output_path.to_path_buf(),
        reason: format!("Failed to create temp file: {}", e),
    })?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents)
        .and_then(|_| writer.write_all(b"\n"))
        .and_then(|_| writer.flush())
        .map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            AudiometaError::output_error(output_path, e)
        })?;
    drop(writer);

    std::fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        AudiometaError::OutputError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })?;

    Ok(())
}
