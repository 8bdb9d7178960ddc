use std::fmt::{Display, Formatter};
use std::path::Path;

/// Structured failure code at the host-action boundary. Message-substring
/// matching survives only as a compatibility fallback for hosts that report
/// opaque localized strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostErrorCode {
    TargetMissing,
    Unsupported,
    Io,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    pub code: HostErrorCode,
    pub message: String,
}

impl HostError {
    pub fn target_missing(message: impl Into<String>) -> Self {
        Self {
            code: HostErrorCode::TargetMissing,
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self {
            code: HostErrorCode::Unsupported,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self {
            code: HostErrorCode::Io,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            code: HostErrorCode::Other,
            message: message.into(),
        }
    }

    /// Structured code first; opaque message patterns as fallback.
    pub fn is_target_missing(&self) -> bool {
        self.code == HostErrorCode::TargetMissing || message_indicates_missing_target(&self.message)
    }
}

impl Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for HostError {}

/// Patterns the original host surfaces for vanished shortcuts, shortcut
/// targets, applications, and paths, in both locales it ships.
const MISSING_TARGET_PATTERNS: &[&str] = &[
    "应用程序未找到",
    "快捷方式文件不存在",
    "快捷方式目标不存在",
    "找不到",
    "路径不存在",
    "application not found",
    "shortcut file is missing",
    "shortcut target is missing",
    "path does not exist",
    "no such file",
    "not found",
    "cannot find",
];

pub fn message_indicates_missing_target(message: &str) -> bool {
    let lowered = message.to_lowercase();
    MISSING_TARGET_PATTERNS
        .iter()
        .any(|pattern| lowered.contains(&pattern.to_lowercase()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalView {
    HistoryPanel,
    Memo,
    JsonFormatter,
}

impl InternalView {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::HistoryPanel => "history",
            Self::Memo => "memo",
            Self::JsonFormatter => "json_formatter",
        }
    }
}

/// Host capability surface consumed by the dispatcher. Every primitive is
/// synchronous and resolves to success or a `HostError`.
pub trait HostActions: Send + Sync {
    fn launch_application(&self, path: &str) -> Result<(), HostError>;
    fn launch_file(&self, path: &str) -> Result<(), HostError>;
    fn open_url(&self, url: &str) -> Result<(), HostError>;
    fn copy_to_clipboard(&self, text: &str) -> Result<(), HostError>;
    fn open_view(&self, view: InternalView) -> Result<(), HostError>;
    fn run_plugin(&self, plugin_id: &str, command: &str, args: &[String]) -> Result<(), HostError>;
}

/// Process-level host implementation. Launch primitives verify the target
/// exists and hand off to the shell on Windows; other platforms stop at the
/// existence check so tests stay hermetic.
pub struct SystemHost;

impl SystemHost {
    fn require_existing_path(&self, path: &str) -> Result<(), HostError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(HostError::other("empty path"));
        }
        // scheme identifiers are resolved by the shell, not the filesystem
        if is_shell_target(trimmed) {
            return Ok(());
        }
        if !Path::new(trimmed).exists() {
            return Err(HostError::target_missing(format!(
                "path does not exist: {trimmed}"
            )));
        }
        Ok(())
    }
}

impl HostActions for SystemHost {
    fn launch_application(&self, path: &str) -> Result<(), HostError> {
        self.require_existing_path(path)?;
        shell_open(path)
    }

    fn launch_file(&self, path: &str) -> Result<(), HostError> {
        self.require_existing_path(path)?;
        shell_open(path)
    }

    fn open_url(&self, url: &str) -> Result<(), HostError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(HostError::other("empty url"));
        }
        shell_open(trimmed)
    }

    fn copy_to_clipboard(&self, text: &str) -> Result<(), HostError> {
        write_system_clipboard_text(text)
    }

    fn open_view(&self, view: InternalView) -> Result<(), HostError> {
        // views are rendered by the UI shell; the core only acknowledges
        crate::logging::info(&format!("open internal view: {}", view.tag()));
        Ok(())
    }

    fn run_plugin(&self, plugin_id: &str, command: &str, args: &[String]) -> Result<(), HostError> {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return Err(HostError::other(format!("plugin '{plugin_id}' has no command")));
        }
        std::process::Command::new(trimmed)
            .args(args)
            .spawn()
            .map(|_| ())
            .map_err(|error| match error.kind() {
                std::io::ErrorKind::NotFound => {
                    HostError::target_missing(format!("plugin command not found: {trimmed}"))
                }
                _ => HostError::io(format!("plugin '{plugin_id}' failed to start: {error}")),
            })
    }
}

/// `ms-settings:` and friends: a colon past the drive-letter position with
/// no separator before it marks a shell-resolved identifier.
fn is_shell_target(value: &str) -> bool {
    match value.find(':') {
        Some(index) => index >= 2 && !value[..index].contains(['\\', '/']),
        None => false,
    }
}

#[cfg(target_os = "windows")]
fn shell_open(target: &str) -> Result<(), HostError> {
    let status = std::process::Command::new("cmd")
        .arg("/C")
        .arg("start")
        .arg("")
        .arg(target)
        .status()
        .map_err(|error| HostError::io(format!("failed to invoke shell open: {error}")))?;
    if !status.success() {
        return Err(HostError::other(format!(
            "shell open exit status {status} for {target}"
        )));
    }
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn shell_open(_target: &str) -> Result<(), HostError> {
    // Keep tests/platform-agnostic paths stable without requiring desktop integration.
    Ok(())
}

#[cfg(target_os = "windows")]
fn write_system_clipboard_text(value: &str) -> Result<(), HostError> {
    use windows_sys::Win32::System::DataExchange::{
        CloseClipboard, EmptyClipboard, OpenClipboard, SetClipboardData, CF_UNICODETEXT,
    };
    use windows_sys::Win32::System::Memory::{
        GlobalAlloc, GlobalFree, GlobalLock, GlobalUnlock, GMEM_MOVEABLE,
    };

    let wide: Vec<u16> = value.encode_utf16().chain(std::iter::once(0)).collect();
    let bytes = wide.len() * std::mem::size_of::<u16>();
    unsafe {
        if OpenClipboard(std::ptr::null_mut()) == 0 {
            return Err(HostError::io("failed to open clipboard"));
        }
        if EmptyClipboard() == 0 {
            CloseClipboard();
            return Err(HostError::io("failed to clear clipboard"));
        }

        let mem = GlobalAlloc(GMEM_MOVEABLE, bytes);
        if mem.is_null() {
            CloseClipboard();
            return Err(HostError::io("failed to allocate clipboard memory"));
        }

        let ptr = GlobalLock(mem) as *mut u16;
        if ptr.is_null() {
            GlobalFree(mem);
            CloseClipboard();
            return Err(HostError::io("failed to lock clipboard memory"));
        }
        std::ptr::copy_nonoverlapping(wide.as_ptr(), ptr, wide.len());
        GlobalUnlock(mem);

        if SetClipboardData(CF_UNICODETEXT, mem).is_null() {
            GlobalFree(mem);
            CloseClipboard();
            return Err(HostError::io("failed to set clipboard data"));
        }

        CloseClipboard();
    }
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn write_system_clipboard_text(_value: &str) -> Result<(), HostError> {
    Err(HostError::unsupported(
        "clipboard copy is unsupported on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::{message_indicates_missing_target, HostError, HostErrorCode};

    #[test]
    fn structured_code_wins_over_message() {
        let error = HostError::target_missing("anything at all");
        assert!(error.is_target_missing());

        let other = HostError::other("disk quota exceeded");
        assert!(!other.is_target_missing());
    }

    #[test]
    fn localized_messages_classify_as_missing_target() {
        assert!(message_indicates_missing_target("启动失败: 应用程序未找到"));
        assert!(message_indicates_missing_target("快捷方式目标不存在"));
        assert!(message_indicates_missing_target("The system cannot find the file"));
        assert!(!message_indicates_missing_target("access is denied"));
    }

    #[test]
    fn fallback_applies_to_opaque_codes_only_in_classifier() {
        let opaque = HostError {
            code: HostErrorCode::Other,
            message: "launch failed: 找不到应用".to_string(),
        };
        assert!(opaque.is_target_missing());
    }
}
