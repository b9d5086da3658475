//! # CUPS Backend Entry Points
//!
//! Implements the two invocation shapes the spooler uses:
//!
//! | argv                                              | mode      |
//! |---------------------------------------------------|-----------|
//! | `phomemo`                                         | discovery |
//! | `phomemo job-id user title copies options [file]` | print     |
//!
//! Discovery writes one `direct ...` line per printer to stdout. Print
//! mode reads the device URI from the `DEVICE_URI` environment variable,
//! the raster stream from `file` (or stdin), and streams the job out.
//!
//! All diagnostics go to stderr with the spooler's level prefixes
//! (`DEBUG:`, `INFO:`, `WARNING:`, `ERROR:`); `STATE:` lines update the
//! queue's printer-state-reasons while the job runs.

use std::env;
use std::fs::File;
use std::io::{self, Read};

use crate::discovery;
use crate::error::PhomemoError;
use crate::job::{self, JobOptions};
use crate::profile::{Model, ModelProfile};
use crate::raster::RasterReader;
use crate::transport::DeviceTransport;
use crate::uri::DeviceUri;

/// Logger writing records to stderr with the spooler's level prefixes.
/// The scheduler filters these by its own LogLevel, so everything down to
/// debug is always emitted.
struct CupsLogger;

static LOGGER: CupsLogger = CupsLogger;

impl log::Log for CupsLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let prefix = match record.level() {
            log::Level::Error => "ERROR",
            log::Level::Warn => "WARNING",
            log::Level::Info => "INFO",
            log::Level::Debug | log::Level::Trace => "DEBUG",
        };
        eprintln!("{}: {}", prefix, record.args());
    }

    fn flush(&self) {}
}

/// Route `log` output to stderr in spooler format. Harmless if a logger
/// is already installed.
pub fn init_logging() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Debug);
    }
}

/// Environment variable forcing the model when the device name cannot be
/// resolved (USB without a product-id match, renamed Bluetooth devices).
const ENV_MODEL: &str = "PHOMEMO_MODEL";

/// Environment variable overriding the media type code for queues that
/// feed continuous or black-mark media.
const ENV_MEDIA_TYPE: &str = "PHOMEMO_MEDIA_TYPE";

struct PrintArgs<'a> {
    job_id: &'a str,
    user: &'a str,
    copies: &'a str,
    file: Option<&'a str>,
}

enum Invocation<'a> {
    Discovery,
    Print(PrintArgs<'a>),
    Usage,
}

fn classify(args: &[String]) -> Invocation<'_> {
    match args.len() {
        1 => Invocation::Discovery,
        // job-id user title copies options [file]
        6 | 7 => Invocation::Print(PrintArgs {
            job_id: &args[1],
            user: &args[2],
            copies: &args[4],
            file: args.get(6).map(String::as_str),
        }),
        _ => Invocation::Usage,
    }
}

/// Backend entry point. Returns the process exit code.
pub fn run(args: &[String]) -> i32 {
    match classify(args) {
        Invocation::Discovery => {
            for record in discovery::discover() {
                println!("{}", record.device_line());
            }
            0
        }
        Invocation::Print(print) => match print_job(&print) {
            Ok(pages) => {
                log::info!("job {} complete, {} page(s)", print.job_id, pages);
                0
            }
            Err(e) => {
                eprintln!("ERROR: {}", e);
                1
            }
        },
        Invocation::Usage => {
            let name = args.first().map(String::as_str).unwrap_or("phomemo");
            eprintln!("Usage: {} job-id user title copies options [file]", name);
            1
        }
    }
}

fn print_job(args: &PrintArgs<'_>) -> Result<u32, PhomemoError> {
    let uri_string = env::var("DEVICE_URI")
        .map_err(|_| PhomemoError::InvalidUri("DEVICE_URI is not set".to_string()))?;
    let uri = DeviceUri::parse(&uri_string)?;

    log::debug!(
        "job {} for {}, {} copies, device {}",
        args.job_id,
        args.user,
        args.copies,
        uri
    );

    let input: Box<dyn Read> = match args.file {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin().lock()),
    };
    let mut reader = RasterReader::new(input)?;

    let profile = resolve_profile(&uri)?;
    log::info!("printing as {}", profile.model.label());

    let options = job_options();

    eprintln!("STATE: +connecting-to-device");
    let mut transport = match DeviceTransport::open(&uri) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("STATE: -connecting-to-device");
            return Err(e);
        }
    };
    eprintln!("STATE: -connecting-to-device");

    eprintln!("STATE: +sending-data");
    let result = job::run_print_job(&mut reader, &mut transport, &profile, &options);
    eprintln!("STATE: -sending-data");
    let pages = result?;

    if pages > 0 {
        // Copies are already unrolled into extra raster pages upstream;
        // here we only wait for the printer to drain its buffer.
        eprintln!("STATE: +receiving-data");
        transport.wait_for_completion();
        eprintln!("STATE: -receiving-data");
    }

    transport.close();
    Ok(pages)
}

/// Pick the model profile for `uri`.
///
/// Order: explicit `PHOMEMO_MODEL` override, then the paired-device name
/// for Bluetooth printers, then the generic 384 px profile. An override
/// that names an unknown model is a hard error rather than a silent
/// fallback.
fn resolve_profile(uri: &DeviceUri) -> Result<ModelProfile, PhomemoError> {
    if let Ok(name) = env::var(ENV_MODEL) {
        let model = Model::parse(&name)?;
        log::debug!("model {} forced via {}", model.label(), ENV_MODEL);
        return Ok(ModelProfile::for_model(model));
    }

    if let DeviceUri::Bluetooth(addr) = uri {
        if let Some(name) = discovery::bluetooth::device_name(addr) {
            if let Some(model) = Model::from_device_name(&name) {
                log::debug!("device {} classified as {}", name, model.label());
                return Ok(ModelProfile::for_model(model));
            }
            log::warn!("paired device {} does not look like a Phomemo printer", name);
        }
    }

    log::info!("model unknown, using generic profile");
    Ok(ModelProfile::default())
}

fn job_options() -> JobOptions {
    let mut options = JobOptions::default();
    if let Ok(value) = env::var(ENV_MEDIA_TYPE) {
        match value.parse::<u8>() {
            Ok(code) => options.media_type_default = code,
            Err(_) => log::warn!("ignoring non-numeric {}={}", ENV_MEDIA_TYPE, value),
        }
    }
    options
}

// ============================================================================
// TESTS
// ============================================================================
