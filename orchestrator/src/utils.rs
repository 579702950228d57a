use std::{
    ffi::OsString,
    io,
    num::NonZero,
    os::unix::process::ExitStatusExt,
    path::Path,
    process::{ExitStatus, Stdio},
    time::{Duration, Instant},
};

use common::{log_debug, log_error, log_warn};
use derive_more::{Deref, From};
use serde::Serialize;
use tokio::{
    io::AsyncReadExt,
    process::{Child, Command},
};

pub fn run_blocking<Fut>(f: Fut) -> Fut::Output
where
    Fut: core::future::Future,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()
        .expect("Failed to build the async runtime")
        .block_on(f)
}

/// Performance data of a single external call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    /// User and system time consumed by the child.
    pub cpu_time_s: f64,
    pub wall_time_s: f64,
    /// The exit code of the child, or the negated signal number if it was terminated by one.
    pub status_code: i32,
}

#[derive(Debug, Deref, From)]
pub struct CallOutput {
    #[deref]
    pub measurement: Measurement,
    /// Only present if the standard output was requested to be captured.
    pub stdout: Option<Vec<u8>>,
}

/// Where the standard output (or error) of a child goes.
#[derive(Debug, Clone, Default)]
pub enum OutputSink {
    #[default]
    Null,
    Inherit,
    Capture,
}

impl From<OutputSink> for Stdio {
    fn from(sink: OutputSink) -> Self {
        match sink {
            OutputSink::Null => Stdio::null(),
            OutputSink::Inherit => Stdio::inherit(),
            OutputSink::Capture => Stdio::piped(),
        }
    }
}

/// Resource limits applied to a child.
#[derive(Debug, Clone, Copy, Default)]
pub struct Limits {
    /// Enforced by the OS through `RLIMIT_CPU`, in seconds.
    pub cpu: Option<NonZero<u64>>,
    /// Enforced by killing the child once exceeded.
    pub wall: Option<Duration>,
}

impl Limits {
    pub fn new(cpu_limit_s: u64, wall_timeout_s: Option<u64>) -> Self {
        Self {
            cpu: NonZero::new(cpu_limit_s),
            wall: wall_timeout_s
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
        }
    }
}

pub struct CallParams<'a> {
    pub program: &'a Path,
    pub args: Vec<OsString>,
    pub stdout: OutputSink,
    pub stderr: OutputSink,
    pub expected_code: Option<i32>,
    pub limits: Limits,
}

impl<'a> CallParams<'a> {
    pub fn new<A: Into<OsString>>(
        program: &'a impl AsRef<Path>,
        args: impl IntoIterator<Item = A>,
    ) -> CallParams<'a> {
        CallParams {
            program: program.as_ref(),
            args: args.into_iter().map(Into::into).collect(),
            stdout: OutputSink::Null,
            stderr: OutputSink::Null,
            expected_code: None,
            limits: Limits::default(),
        }
    }

    pub fn stdout(mut self, sink: OutputSink) -> Self {
        self.stdout = sink;
        self
    }

    pub fn stderr(mut self, sink: OutputSink) -> Self {
        self.stderr = sink;
        self
    }

    pub fn expected_code(mut self, code: Option<i32>) -> Self {
        self.expected_code = code;
        self
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

/// Runs the command to completion and returns its measured performance.
/// Unless requested otherwise, both outputs of the child are discarded.
///
/// A mismatch against the expected code is only reported, the measurement is returned anyway.
pub fn measure_call(params: CallParams) -> Result<CallOutput, io::Error> {
    run_blocking(execute_measured(params))
}

#[tracing::instrument(level = "debug", skip_all, fields(program = %params.program.display()))]
pub async fn execute_measured(params: CallParams<'_>) -> Result<CallOutput, io::Error> {
    let CallParams {
        program,
        args,
        stdout,
        stderr,
        expected_code,
        limits,
    } = params;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true);
    if let Some(cpu_limit) = limits.cpu {
        apply_cpu_limit(&mut cmd, cpu_limit.get());
    }
    log_debug!("Command for execution: {:?}", cmd);

    let cpu_before = children_cpu_time()?;
    let (result, wall_time) = measure_time_async(move || run_child(cmd, limits.wall)).await;
    let (status, captured) = result?;
    let cpu_after = children_cpu_time()?;

    let measurement = Measurement {
        cpu_time_s: cpu_after.saturating_sub(cpu_before).as_secs_f64(),
        wall_time_s: wall_time.as_secs_f64(),
        status_code: status_code(status),
    };
    log_debug!("Measured: {:?}", measurement);

    if let Some(expected) = expected_code.filter(|c| *c != measurement.status_code) {
        log_error!(
            "Detected unexpected behavior of `{}` (exit code {}, expected {}), printing output",
            program.display(),
            measurement.status_code,
            expected,
        );
        log_error!(
            "STDOUT: {}",
            captured
                .as_deref()
                .map(String::from_utf8_lossy)
                .unwrap_or("<not captured>".into()),
        );
    }

    Ok(CallOutput {
        measurement,
        stdout: captured,
    })
}

async fn run_child(
    mut cmd: Command,
    wall_limit: Option<Duration>,
) -> Result<(ExitStatus, Option<Vec<u8>>), io::Error> {
    let mut child = cmd.spawn()?;
    let pipe = child.stdout.take();
    let read = async move {
        match pipe {
            Some(mut pipe) => {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf).await.map(|_| Some(buf))
            }
            None => Ok(None),
        }
    };
    let (captured, status) = tokio::join!(read, wait_with_deadline(&mut child, wall_limit));
    Ok((status?, captured?))
}

async fn wait_with_deadline(
    child: &mut Child,
    limit: Option<Duration>,
) -> Result<ExitStatus, io::Error> {
    let Some(limit) = limit else {
        return child.wait().await;
    };

    match tokio::time::timeout(limit, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            log_warn!(
                "Wall-clock limit of {}s exceeded, killing the process",
                limit.as_secs_f32()
            );
            child.kill().await?;
            child.wait().await
        }
    }
}

fn apply_cpu_limit(cmd: &mut Command, seconds: u64) {
    let limit = libc::rlimit {
        rlim_cur: seconds as libc::rlim_t,
        rlim_max: seconds as libc::rlim_t,
    };
    // SAFETY: Only `setrlimit` (async-signal-safe) runs between fork and exec.
    unsafe {
        cmd.pre_exec(move || {
            if libc::setrlimit(libc::RLIMIT_CPU, &limit) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

/// User + system time of all the terminated and waited-for children of this process.
fn children_cpu_time() -> Result<Duration, io::Error> {
    // SAFETY: `rusage` is plain data, and it is fully written on success.
    let usage = unsafe {
        let mut usage: libc::rusage = core::mem::zeroed();
        if libc::getrusage(libc::RUSAGE_CHILDREN, &mut usage) != 0 {
            return Err(io::Error::last_os_error());
        }
        usage
    };
    let to_duration = |tv: libc::timeval| {
        Duration::from_secs(tv.tv_sec as u64) + Duration::from_micros(tv.tv_usec as u64)
    };
    Ok(to_duration(usage.ru_utime) + to_duration(usage.ru_stime))
}

fn status_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|s| -s))
        .unwrap_or(-1)
}

pub fn measure_time<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let now = Instant::now();
    let result = f();
    (result, now.elapsed())
}

pub async fn measure_time_async<T, Fut: core::future::Future<Output = T>>(
    f: impl FnOnce() -> Fut,
) -> (T, Duration) {
    let now = Instant::now();
    let result = f().await;
    (result, now.elapsed())
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard};

    use super::*;

    /// CPU time of children is accounted process-wide, so the tests spawning children run one at a time.
    static CHILDREN: Mutex<()> = Mutex::new(());

    fn exclusive() -> MutexGuard<'static, ()> {
        CHILDREN.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_sleeping_child_is_wall_bound() {
        let _guard = exclusive();
        let output = measure_call(CallParams::new(&"sleep", ["0.3"])).unwrap();
        assert_eq!(output.status_code, 0);
        assert!(output.wall_time_s >= 0.3, "{:?}", output.measurement);
        assert!(output.cpu_time_s < 0.1, "{:?}", output.measurement);
    }

    #[test]
    fn test_exit_code_is_reported() {
        let _guard = exclusive();
        let output = measure_call(CallParams::new(&"sh", ["-c", "exit 20"])).unwrap();
        assert_eq!(output.status_code, 20);
    }

    #[test]
    fn test_unexpected_code_keeps_measurement() {
        let _guard = exclusive();
        let output = measure_call(
            CallParams::new(&"sh", ["-c", "echo hello; exit 3"])
                .stdout(OutputSink::Capture)
                .expected_code(Some(10)),
        )
        .unwrap();
        assert_eq!(output.status_code, 3);
        assert_eq!(output.stdout.as_deref(), Some(b"hello\n".as_slice()));
    }

    #[test]
    fn test_launch_failure() {
        let _guard = exclusive();
        let result = measure_call(CallParams::new(&"/nonexistent/summle/tool", ["x"]));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_cpu_limit_terminates_busy_child() {
        let _guard = exclusive();
        let output = measure_call(
            CallParams::new(&"sh", ["-c", "while :; do :; done"]).limits(Limits::new(1, None)),
        )
        .unwrap();
        // The soft and hard limits are equal, so the kernel may pick either signal.
        assert!(
            [-libc::SIGXCPU, -libc::SIGKILL].contains(&output.status_code),
            "{:?}",
            output.measurement
        );
        assert!(output.cpu_time_s >= 0.9, "{:?}", output.measurement);
    }

    #[test]
    fn test_wall_limit_kills_sleeping_child() {
        let _guard = exclusive();
        let output = measure_call(
            CallParams::new(&"sleep", ["10"]).limits(Limits {
                cpu: None,
                wall: Some(Duration::from_millis(200)),
            }),
        )
        .unwrap();
        assert_eq!(output.status_code, -libc::SIGKILL);
        assert!(output.wall_time_s < 5.0, "{:?}", output.measurement);
    }
}
