use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{self, ConfigError};
use crate::core_service::{CoreService, ServiceError};
use crate::discovery::{AppProvider, FileProvider};
use crate::logging;
use crate::plugin_registry::{PluginProvider, PluginRegistry};
use crate::transport::TransportSession;

#[derive(Debug)]
pub enum RuntimeError {
    Config(ConfigError),
    Service(ServiceError),
    Io(std::io::Error),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Service(error) => write!(f, "service error: {error}"),
            Self::Io(error) => write!(f, "io error: {error}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<ConfigError> for RuntimeError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ServiceError> for RuntimeError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    /// Handle a single JSON request and exit.
    pub once: Option<String>,
    pub background: bool,
}

pub fn parse_cli_args(args: &[String]) -> Result<RunOptions, String> {
    let mut options = RunOptions::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--config requires a path".to_string())?;
                options.config_path = Some(PathBuf::from(value));
            }
            "--once" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--once requires a JSON request".to_string())?;
                options.once = Some(value.clone());
            }
            "--background" => options.background = true,
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(options)
}

pub fn run() -> Result<(), RuntimeError> {
    run_with_options(RunOptions::default())
}

pub fn run_with_options(options: RunOptions) -> Result<(), RuntimeError> {
    let config = config::load(options.config_path.as_deref())?;
    if !config.config_path.exists() {
        config::save(&config)?;
        println!(
            "[swiftlaunch-core] wrote default config to {}",
            config.config_path.display()
        );
    }

    if let Err(error) = logging::init() {
        eprintln!("[swiftlaunch-core] file logging unavailable: {error}");
    }
    println!(
        "[swiftlaunch-core] startup config_path={} history_db_path={} max_results={}",
        config.config_path.display(),
        config.history_db_path.display(),
        config.max_results,
    );

    let _single_instance = match acquire_single_instance_guard() {
        Ok(Some(guard)) => Some(guard),
        Ok(None) => {
            println!("[swiftlaunch-core] runtime already active; exiting duplicate process");
            return Ok(());
        }
        Err(error) => {
            logging::warn(&format!("single instance guard unavailable: {error}"));
            None
        }
    };

    let mut service = CoreService::new(config.clone())?;
    if config.app_roots.is_empty() {
        service.add_provider(Box::new(AppProvider::deterministic_fixture()));
        service.add_provider(Box::new(FileProvider::deterministic_fixture()));
    } else {
        service.add_provider(Box::new(AppProvider::scan_roots(&config.app_roots)));
    }

    let registry = PluginRegistry::load_from_config(&config);
    for warning in &registry.load_warnings {
        logging::warn(warning);
    }
    service.add_provider(Box::new(PluginProvider::from_registry(&registry)));

    let hydrated = service.hydrate()?;
    println!("[swiftlaunch-core] startup history_entries={hydrated}");

    let mut session = TransportSession::new(service);

    if let Some(request) = options.once {
        let response = session.handle_json(&request);
        println!("{response}");
        session.service().flush_worker();
        if let Some(event) = session.poll_history_event() {
            println!("{event}");
        }
        return Ok(());
    }

    serve_stdio(&mut session)
}

/// Line-delimited JSON over stdin/stdout; the window shell drives this.
fn serve_stdio(session: &mut TransportSession) -> Result<(), RuntimeError> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" {
            break;
        }

        let response = session.handle_json(trimmed);
        writeln!(stdout, "{response}")?;
        if let Some(event) = session.poll_history_event() {
            writeln!(stdout, "{event}")?;
        }
        stdout.flush()?;
    }

    session.service().flush_worker();
    Ok(())
}

#[cfg(target_os = "windows")]
pub struct SingleInstanceGuard {
    handle: windows_sys::Win32::Foundation::HANDLE,
}

#[cfg(target_os = "windows")]
impl Drop for SingleInstanceGuard {
    fn drop(&mut self) {
        unsafe {
            windows_sys::Win32::Foundation::CloseHandle(self.handle);
        }
    }
}

#[cfg(target_os = "windows")]
fn acquire_single_instance_guard() -> Result<Option<SingleInstanceGuard>, String> {
    use windows_sys::Win32::Foundation::GetLastError;
    use windows_sys::Win32::System::Threading::CreateMutexW;

    let mutex_name: Vec<u16> = "Local\\SwiftLaunchRuntimeSingleton"
        .encode_utf16()
        .chain(std::iter::once(0))
        .collect();
    let handle = unsafe { CreateMutexW(std::ptr::null(), 0, mutex_name.as_ptr()) };
    if handle.is_null() {
        let error = unsafe { GetLastError() };
        return Err(format!("CreateMutexW failed with error {error}"));
    }

    // ERROR_ALREADY_EXISTS
    let error = unsafe { GetLastError() };
    if error == 183 {
        unsafe {
            windows_sys::Win32::Foundation::CloseHandle(handle);
        }
        return Ok(None);
    }

    Ok(Some(SingleInstanceGuard { handle }))
}

#[cfg(not(target_os = "windows"))]
pub struct SingleInstanceGuard;

#[cfg(not(target_os = "windows"))]
fn acquire_single_instance_guard() -> Result<Option<SingleInstanceGuard>, String> {
    Ok(Some(SingleInstanceGuard))
}
