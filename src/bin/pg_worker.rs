//! Runs embedded `PostgreSQL` lifecycle steps for the feeds store test suite
//! when the suite itself runs as root.
//!
//! ```text
//! pg_worker <setup|start|stop> <payload.json>
//! ```
//!
//! The payload is the `WorkerPayload` written by `pg-embed-setup-unpriv`. The
//! worker reads it, switches to the `nobody` account, applies the payload
//! environment and then drives the cluster. `PostgreSQL` refuses to run as
//! root, so every step after the payload read happens unprivileged.

#[cfg(unix)]
mod unix {
    use camino::{Utf8Path, Utf8PathBuf};
    use nix::unistd::{Uid, User, initgroups, setgid, setuid};
    use pg_embedded_setup_unpriv::ambient_dir_and_path;
    use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
    use postgresql_embedded::{PostgreSQL, Status};
    use std::ffi::CString;
    use std::io::Read;
    use std::mem::ManuallyDrop;
    use std::str::FromStr;
    use thiserror::Error;

    const UNPRIVILEGED_USER: &str = "nobody";

    /// Failures reported by the worker.
    #[derive(Debug, Error)]
    pub enum WorkerError {
        /// The command line was malformed.
        #[error("usage: pg_worker <setup|start|stop> <payload.json>: {0}")]
        Usage(String),
        /// The payload file could not be read.
        #[error("failed to read payload {path}: {message}")]
        PayloadRead {
            /// Payload location.
            path: Utf8PathBuf,
            /// Underlying failure.
            message: String,
        },
        /// The payload was not valid JSON for a `WorkerPayload`.
        #[error("failed to parse payload: {0}")]
        PayloadParse(#[from] serde_json::Error),
        /// Switching to the unprivileged account failed.
        #[error("failed to switch to the nobody account: {0}")]
        PrivilegeDrop(String),
        /// The cluster step failed.
        #[error("postgres {step} failed: {message}")]
        Postgres {
            /// Lifecycle step that failed.
            step: Step,
            /// Underlying failure.
            message: String,
        },
    }

    /// Cluster lifecycle step requested on the command line.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Step {
        /// Install binaries and initialise the data directory.
        Setup,
        /// Start the server and leave it running after the worker exits.
        Start,
        /// Stop a running server.
        Stop,
    }

    impl Step {
        const fn as_str(self) -> &'static str {
            match self {
                Self::Setup => "setup",
                Self::Start => "start",
                Self::Stop => "stop",
            }
        }
    }

    impl std::fmt::Display for Step {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl FromStr for Step {
        type Err = WorkerError;

        fn from_str(value: &str) -> Result<Self, Self::Err> {
            match value {
                "setup" => Ok(Self::Setup),
                "start" => Ok(Self::Start),
                "stop" => Ok(Self::Stop),
                other => Err(WorkerError::Usage(format!("unknown step '{other}'"))),
            }
        }
    }

    /// Parses `args` (program name first) into a step and payload path.
    pub fn parse_args(
        mut args: impl Iterator<Item = String>,
    ) -> Result<(Step, Utf8PathBuf), WorkerError> {
        let _program = args.next();
        let step = args
            .next()
            .ok_or_else(|| WorkerError::Usage("missing step".to_owned()))?
            .parse::<Step>()?;
        let payload = args
            .next()
            .map(Utf8PathBuf::from)
            .ok_or_else(|| WorkerError::Usage("missing payload path".to_owned()))?;
        if let Some(extra) = args.next() {
            return Err(WorkerError::Usage(format!("unexpected argument '{extra}'")));
        }
        Ok((step, payload))
    }

    /// Executes `step` with the settings stored at `payload_path`.
    pub fn run(step: Step, payload_path: &Utf8Path) -> Result<(), WorkerError> {
        let payload = load_payload(payload_path)?;
        drop_root()?;
        let settings = payload.settings.into_settings().map_err(|err| {
            WorkerError::Usage(format!("payload settings are invalid: {err}"))
        })?;
        apply_environment(&payload.environment);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| postgres_failure(step, &err))?;
        let mut postgres = PostgreSQL::new(settings);
        match step {
            Step::Setup => runtime.block_on(async {
                postgres
                    .setup()
                    .await
                    .map_err(|err| postgres_failure(step, &err))?;
                start_if_stopped(&mut postgres, step).await
            }),
            Step::Start => {
                runtime.block_on(start_if_stopped(&mut postgres, step))?;
                // Dropping the handle would stop the server with the worker.
                let _running = ManuallyDrop::new(postgres);
                Ok(())
            }
            Step::Stop => runtime
                .block_on(postgres.stop())
                .map_err(|err| postgres_failure(step, &err)),
        }
    }

    async fn start_if_stopped(postgres: &mut PostgreSQL, step: Step) -> Result<(), WorkerError> {
        if matches!(postgres.status(), Status::Started) {
            return Ok(());
        }
        postgres
            .start()
            .await
            .map_err(|err| postgres_failure(step, &err))
    }

    fn postgres_failure(step: Step, err: &dyn std::error::Error) -> WorkerError {
        WorkerError::Postgres {
            step,
            message: err.to_string(),
        }
    }

    fn load_payload(path: &Utf8Path) -> Result<WorkerPayload, WorkerError> {
        let read_failure = |message: String| WorkerError::PayloadRead {
            path: path.to_path_buf(),
            message,
        };
        let (dir, relative) =
            ambient_dir_and_path(path).map_err(|err| read_failure(err.to_string()))?;
        let mut file = dir
            .open(relative.as_std_path())
            .map_err(|err| read_failure(err.to_string()))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|err| read_failure(err.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn drop_root() -> Result<(), WorkerError> {
        if !Uid::effective().is_root() {
            return Ok(());
        }
        let privilege = |err: nix::Error| WorkerError::PrivilegeDrop(err.to_string());
        let user = User::from_name(UNPRIVILEGED_USER)
            .map_err(privilege)?
            .ok_or_else(|| WorkerError::PrivilegeDrop("account does not exist".to_owned()))?;
        let name = CString::new(user.name.clone())
            .map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?;

        // Groups first: once the uid changes the process may no longer set them.
        initgroups(&name, user.gid).map_err(privilege)?;
        setgid(user.gid).map_err(privilege)?;
        setuid(user.uid).map_err(privilege)?;

        // SAFETY: no other thread exists yet; the runtime is built afterwards.
        unsafe {
            std::env::set_var("HOME", &user.dir);
            std::env::set_var("USER", &user.name);
            std::env::set_var("LOGNAME", &user.name);
        }
        Ok(())
    }

    fn apply_environment(environment: &[(String, Option<PlainSecret>)]) {
        for (key, value) in environment {
            // SAFETY: still single-threaded, see `drop_root`.
            unsafe {
                match value {
                    Some(secret) => std::env::set_var(key, secret.expose()),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

}

#[cfg(unix)]
fn main() -> Result<(), unix::WorkerError> {
    let (step, payload) = unix::parse_args(std::env::args())?;
    unix::run(step, &payload)
}

#[cfg(not(unix))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    Err("pg_worker only runs on Unix".into())
}
