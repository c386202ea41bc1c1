// Build-file processor: evaluates build files and streams their rule
// records to the parent process over stdout.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use rulescript::index::{FileIndex, IndexState};
use rulescript::protocol::{self, OutputFormat};
use rulescript::runtime::processor::BuildFileProcessor;

#[derive(Parser, Debug)]
#[command(
    name = "buildfile_processor",
    about = "Evaluate build files and stream their rules to the parent process"
)]
struct Args {
    /// Absolute path to the project root.
    #[arg(long)]
    project_root: PathBuf,

    /// File name treated as a build file.
    #[arg(long, default_value = "BUILD")]
    build_file_name: String,

    /// Do not raise an error when a glob returns no results.
    #[arg(long)]
    allow_empty_globs: bool,

    /// Query the remote file index instead of globbing in-process.
    #[arg(long)]
    use_file_index: bool,

    /// Unix socket of the remote file-index service.
    #[arg(long)]
    index_socket: Option<PathBuf>,

    /// Watch root to query, as registered with the file-index service.
    #[arg(long)]
    index_watch_root: Option<String>,

    /// Project prefix below the watch root.
    #[arg(long)]
    index_project_prefix: Option<String>,

    /// Maximum time in milliseconds to wait for an index query.
    #[arg(long)]
    index_query_timeout_ms: Option<u64>,

    /// Include applied implicitly to every processed build file
    /// (repeatable).
    #[arg(long = "include")]
    includes: Vec<String>,

    /// Initial build files to process before reading paths from stdin.
    files: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    // Anything build-file code manages to print must not corrupt the
    // protocol: keep a private handle to the real stdout and point fd 1 at
    // stderr for the rest of the process.
    let protocol_stream = redirect_stdout();

    let client = if args.use_file_index {
        connect_index_client(&args)
    } else {
        None
    };
    let format = if client.is_some() {
        OutputFormat::Bincode
    } else {
        OutputFormat::Json
    };
    let index = IndexState::new(
        client,
        args.index_watch_root.clone(),
        args.index_project_prefix.clone(),
    );

    let project_root =
        std::path::absolute(&args.project_root).unwrap_or_else(|_| args.project_root.clone());
    let mut processor = BuildFileProcessor::new(
        project_root,
        args.build_file_name.clone(),
        args.allow_empty_globs,
        args.includes.clone(),
        index,
    );

    let stdin = io::stdin();
    match protocol::run(
        &mut processor,
        format,
        &args.files,
        stdin.lock(),
        protocol_stream,
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("buildfile_processor: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(unix)]
fn connect_index_client(args: &Args) -> Option<Box<dyn FileIndex>> {
    use rulescript::index::SocketIndexClient;

    let Some(socket) = &args.index_socket else {
        warn!("--use-file-index requires --index-socket; globbing locally");
        return None;
    };
    match SocketIndexClient::connect(socket, args.index_query_timeout_ms) {
        Ok(client) => Some(Box::new(client)),
        Err(e) => {
            warn!("could not connect to the file index, globbing locally: {e}");
            None
        }
    }
}

#[cfg(not(unix))]
fn connect_index_client(_args: &Args) -> Option<Box<dyn FileIndex>> {
    warn!("the file index is only available on unix; globbing locally");
    None
}

/// Duplicate the real stdout for protocol use, then redirect fd 1 to
/// stderr so stray writes land in the diagnostic stream.
#[cfg(unix)]
fn redirect_stdout() -> Box<dyn Write> {
    use std::os::unix::io::FromRawFd;

    unsafe {
        let protocol_fd = libc::dup(libc::STDOUT_FILENO);
        if protocol_fd < 0 {
            return Box::new(io::stdout());
        }
        libc::dup2(libc::STDERR_FILENO, libc::STDOUT_FILENO);
        Box::new(std::fs::File::from_raw_fd(protocol_fd))
    }
}

#[cfg(not(unix))]
fn redirect_stdout() -> Box<dyn Write> {
    Box::new(io::stdout())
}
