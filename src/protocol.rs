// Line-oriented protocol between the engine and its parent process.
//
// The engine announces its encoding on the first line, then writes one
// encoded value per processed build file, flushing after each so the
// consumer reads a stream of back-to-back values rather than a delimited
// list.

use std::io::{BufRead, Write};

use serde_json::Value as JsonValue;

use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::processor::BuildFileProcessor;
use crate::runtime::values::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    /// Compact binary encoding of the same JSON value tree.
    Bincode,
}

impl OutputFormat {
    pub fn header(&self) -> &'static str {
        match self {
            OutputFormat::Json => "JSON",
            OutputFormat::Bincode => "BINCODE",
        }
    }

    pub fn encode(&self, values: &[Value]) -> RuntimeResult<Vec<u8>> {
        let converted: RuntimeResult<Vec<JsonValue>> = values.iter().map(Value::to_json).collect();
        let converted = converted?;
        match self {
            OutputFormat::Json => {
                serde_json::to_vec(&converted).map_err(|e| RuntimeError::Encode(e.to_string()))
            }
            OutputFormat::Bincode => {
                bincode::serialize(&converted).map_err(|e| RuntimeError::Encode(e.to_string()))
            }
        }
    }
}

/// Drive the protocol: header line first, then one response per build-file
/// path - the startup arguments in order, then one path per input line
/// until the stream closes. A failed path aborts the run.
pub fn run<R: BufRead, W: Write>(
    processor: &mut BuildFileProcessor,
    format: OutputFormat,
    initial_paths: &[String],
    input: R,
    mut output: W,
) -> RuntimeResult<()> {
    writeln!(output, "{}", format.header()).map_err(RuntimeError::ProtocolIo)?;
    output.flush().map_err(RuntimeError::ProtocolIo)?;

    for path in initial_paths {
        respond(processor, format, path, &mut output)?;
    }
    for line in input.lines() {
        let line = line.map_err(RuntimeError::ProtocolIo)?;
        let path = line.trim();
        if path.is_empty() {
            continue;
        }
        respond(processor, format, path, &mut output)?;
    }
    Ok(())
}

fn respond<W: Write>(
    processor: &mut BuildFileProcessor,
    format: OutputFormat,
    path: &str,
    output: &mut W,
) -> RuntimeResult<()> {
    let rules = processor.process_build_file(path)?;
    let encoded = format.encode(&rules)?;
    output.write_all(&encoded).map_err(RuntimeError::ProtocolIo)?;
    output.flush().map_err(RuntimeError::ProtocolIo)?;
    Ok(())
}
