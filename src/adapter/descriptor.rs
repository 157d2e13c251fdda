//! Declarative adapter descriptions and executable resolution.
//!
//! An [`AdapterDescription`] is the platform-keyed launch description an
//! adapter ships in its manifest: top-level default
//! `program`/`args`/`runtime`/`runtimeArgs` values plus up to four platform
//! override blocks. Resolution is a pure function from description,
//! platform, and extension root to the concrete [`Executable`] to spawn —
//! no I/O, no state.

use std::path::Path;

use serde::Deserialize;

use crate::{DapError, Result};

/// Host platform variants that can carry launch overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    /// Windows running natively on 32-bit x86 (no WOW64 indirection).
    WindowsX86,
    /// Any other Windows host.
    Windows,
    /// macOS.
    MacOs,
    /// Linux and other unix-likes.
    Linux,
}

impl HostPlatform {
    /// Detect the platform of the running host.
    ///
    /// On Windows, WOW64 exposes `PROCESSOR_ARCHITEW6432` to hosted
    /// processes; its absence identifies a true x86 host.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(windows) {
            if std::env::var_os("PROCESSOR_ARCHITEW6432").is_none() {
                Self::WindowsX86
            } else {
                Self::Windows
            }
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }
}

/// One platform's launch values. Absent fields fall back to the
/// description's top-level defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSpec {
    /// Adapter program path, absolute or relative to the extension root.
    pub program: Option<String>,
    /// Arguments passed to the program.
    pub args: Option<Vec<String>>,
    /// Runtime used to execute `program` (an interpreter such as `node`).
    pub runtime: Option<String>,
    /// Arguments passed to the runtime ahead of `program`.
    pub runtime_args: Option<Vec<String>>,
}

/// Declarative, platform-keyed adapter launch description.
///
/// Immutable after deserialization; resolution never mutates it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterDescription {
    /// Top-level defaults used when the selected platform block omits a
    /// field.
    #[serde(flatten)]
    pub defaults: PlatformSpec,
    /// Override for Windows hosts running natively on 32-bit x86.
    #[serde(default)]
    pub winx86: Option<PlatformSpec>,
    /// Override for Windows hosts.
    #[serde(default, alias = "windows")]
    pub win: Option<PlatformSpec>,
    /// Override for macOS hosts.
    #[serde(default)]
    pub osx: Option<PlatformSpec>,
    /// Override for Linux hosts.
    #[serde(default)]
    pub linux: Option<PlatformSpec>,
}

/// Fully resolved launch descriptor: the command to spawn and its argument
/// vector. Derived per resolution, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executable {
    /// Program or runtime binary to execute.
    pub command: String,
    /// Argument vector, in order.
    pub args: Vec<String>,
}

impl AdapterDescription {
    /// Resolve this description into the concrete executable for
    /// `platform`.
    ///
    /// The platform's override block is selected first (a Windows-x86 host
    /// prefers `winx86` and falls back to `win`); each field then falls
    /// back to the top-level defaults. A relative `program` is resolved
    /// against `extension_root`. With a `runtime`, the command is the
    /// runtime itself and the program becomes one of its arguments, after
    /// any `runtimeArgs` and before any `args`; without one, the command is
    /// the program and `args` pass through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DapError::Launch`] when neither the platform block nor the
    /// defaults name a `program`.
    pub fn resolve(&self, platform: HostPlatform, extension_root: &Path) -> Result<Executable> {
        let block = self.override_for(platform);

        let program = block
            .and_then(|b| b.program.as_deref())
            .or(self.defaults.program.as_deref());
        let args = block
            .and_then(|b| b.args.as_ref())
            .or(self.defaults.args.as_ref());
        let runtime = block
            .and_then(|b| b.runtime.as_deref())
            .or(self.defaults.runtime.as_deref());
        let runtime_args = block
            .and_then(|b| b.runtime_args.as_ref())
            .or(self.defaults.runtime_args.as_ref());

        let Some(program) = program else {
            return Err(DapError::Launch(
                "adapter description names no program for this platform".into(),
            ));
        };
        let program = absolutize(program, extension_root);
        let args = args.cloned().unwrap_or_default();

        match runtime {
            Some(runtime) => {
                let mut full = runtime_args.cloned().unwrap_or_default();
                full.push(program);
                full.extend(args);
                Ok(Executable {
                    command: runtime.to_owned(),
                    args: full,
                })
            }
            None => Ok(Executable {
                command: program,
                args,
            }),
        }
    }

    /// Select the override block for `platform`, if the description has
    /// one.
    fn override_for(&self, platform: HostPlatform) -> Option<&PlatformSpec> {
        match platform {
            HostPlatform::WindowsX86 => self.winx86.as_ref().or(self.win.as_ref()),
            HostPlatform::Windows => self.win.as_ref(),
            HostPlatform::MacOs => self.osx.as_ref(),
            HostPlatform::Linux => self.linux.as_ref(),
        }
    }
}

/// Join `program` onto `root` unless it is already absolute.
fn absolutize(program: &str, root: &Path) -> String {
    let path = Path::new(program);
    if path.is_absolute() {
        program.to_owned()
    } else {
        root.join(path).to_string_lossy().into_owned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
