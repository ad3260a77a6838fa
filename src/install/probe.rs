use log::debug;
use std::path::Path;

use crate::runtime::Runtime;

/// Runs `<binary> --version` and returns the first non-empty line it printed.
///
/// Any failure yields `None`; the probe never fails an install.
#[tracing::instrument(skip(runtime))]
pub fn probe_version<R: Runtime>(runtime: &R, binary: &Path) -> Option<String> {
    let output = match runtime.run_capture(binary, &["--version".to_string()]) {
        Ok(output) => output,
        Err(e) => {
            debug!("Version probe failed: {:#}", e);
            return None;
        }
    };

    if !output.success {
        debug!("Version probe exited unsuccessfully: {}", output.stderr.trim());
        return None;
    }

    output
        .stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{CommandOutput, MockRuntime};

    fn runtime_returning(result: anyhow::Result<CommandOutput>) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        let mut result = Some(result);
        runtime
            .expect_run_capture()
            .withf(|program, args| {
                program == Path::new("/usr/local/bin/ferro") && args == ["--version".to_string()]
            })
            .times(1)
            .returning(move |_, _| result.take().unwrap());
        runtime
    }

    #[test]
    fn test_probe_first_line() {
        let runtime = runtime_returning(Ok(CommandOutput {
            success: true,
            stdout: "\nferro 0.3.1\nbuilt 2026-01-01\n".into(),
            stderr: String::new(),
        }));
        assert_eq!(
            probe_version(&runtime, Path::new("/usr/local/bin/ferro")),
            Some("ferro 0.3.1".to_string())
        );
    }

    #[test]
    fn test_probe_nonzero_exit_is_ignored() {
        let runtime = runtime_returning(Ok(CommandOutput {
            success: false,
            stdout: "ferro 0.3.1".into(),
            stderr: "boom".into(),
        }));
        assert_eq!(probe_version(&runtime, Path::new("/usr/local/bin/ferro")), None);
    }

    #[test]
    fn test_probe_spawn_error_is_ignored() {
        let runtime = runtime_returning(Err(anyhow::anyhow!("Exec format error")));
        assert_eq!(probe_version(&runtime, Path::new("/usr/local/bin/ferro")), None);
    }

    #[test]
    fn test_probe_empty_output() {
        let runtime = runtime_returning(Ok(CommandOutput {
            success: true,
            ..Default::default()
        }));
        assert_eq!(probe_version(&runtime, Path::new("/usr/local/bin/ferro")), None);
    }
}
