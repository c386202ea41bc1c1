// Line-delimited JSON client for the remote file-index service

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use super::query::{QueryParams, QueryResponse};
use super::{FileIndex, IndexError};

/// Client speaking the service's newline-delimited JSON protocol over a
/// unix domain socket.
pub struct SocketIndexClient {
    stream: UnixStream,
    reader: BufReader<UnixStream>,
}

impl SocketIndexClient {
    pub fn connect(socket_path: &Path, timeout_ms: Option<u64>) -> Result<Self, IndexError> {
        let stream = UnixStream::connect(socket_path).map_err(IndexError::Connect)?;
        if let Some(ms) = timeout_ms {
            let timeout = Some(Duration::from_millis(ms));
            stream.set_read_timeout(timeout)?;
            stream.set_write_timeout(timeout)?;
        }
        let reader = BufReader::new(stream.try_clone()?);
        Ok(SocketIndexClient { stream, reader })
    }
}

impl FileIndex for SocketIndexClient {
    fn query(&mut self, watch_root: &str, params: &QueryParams) -> Result<QueryResponse, IndexError> {
        let request = serde_json::to_string(&("query", watch_root, params))
            .map_err(|e| IndexError::Protocol(e.to_string()))?;
        self.stream.write_all(request.as_bytes())?;
        self.stream.write_all(b"\n")?;
        self.stream.flush()?;

        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Err(IndexError::Protocol(
                "connection closed before a response arrived".to_string(),
            ));
        }
        let mut response: QueryResponse =
            serde_json::from_str(&line).map_err(|e| IndexError::Protocol(e.to_string()))?;
        if let Some(error) = response.error.take() {
            return Err(IndexError::Service(error));
        }
        Ok(response)
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }
}
