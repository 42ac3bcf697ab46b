#![allow(dead_code)]

use pg_transfer::{
    CleanupPolicy, ConnectionProfile, GateConfig, ProcessOutput, Sleeper, Tools, TransferArtifact,
    TransferConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

pub const SOURCE_PASSWORD: &str = "source-secret";
pub const DEST_PASSWORD: &str = "dest-secret";

#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: Mutex<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

impl RecordingSleeper {
    pub fn count(&self) -> usize {
        self.sleeps.lock().unwrap().len()
    }
}

/// Artifact path in the temp dir that no other test uses.
pub fn unique_artifact() -> PathBuf {
    std::env::temp_dir().join(format!("pg_transfer_{}.sql", Uuid::new_v4().simple()))
}

pub fn test_config(max_retries: u32) -> TransferConfig {
    let mut gate = GateConfig::new("source_postgres");
    gate.max_retries = max_retries;
    gate.delay = Duration::ZERO;
    TransferConfig {
        source: ConnectionProfile::new("source_postgres", "source_db", "postgres", SOURCE_PASSWORD),
        destination: ConnectionProfile::new(
            "destination_postgres",
            "destination_db",
            "postgres",
            DEST_PASSWORD,
        ),
        gate,
        artifact: TransferArtifact::new(unique_artifact()),
        cleanup: CleanupPolicy::Keep,
        tools: Tools::default(),
    }
}

pub fn ready_output() -> std::io::Result<ProcessOutput> {
    Ok(ProcessOutput::exited(0).with_stdout("source_postgres:5432 - accepting connections\n"))
}

#[cfg(unix)]
const PG_ISREADY: &str = r#"#!/bin/sh
[ -n "$PGPASSWORD$SOURCE_PASSWORD$DEST_PASSWORD" ] && exit 9
echo "$2:5432 - accepting connections"
"#;

// Writes the source password into the dump so the importer can check where it came from.
#[cfg(unix)]
const PG_DUMP: &str = r#"#!/bin/sh
prev=""
for a in "$@"; do
  [ "$prev" = "-f" ] && out="$a"
  prev="$a"
done
[ -n "$SOURCE_PASSWORD$DEST_PASSWORD" ] && exit 6
echo "-- dumped with $PGPASSWORD" > "$out"
"#;

#[cfg(unix)]
const PSQL_TEMPLATE: &str = r#"#!/bin/sh
prev=""
for a in "$@"; do
  [ "$prev" = "-f" ] && in="$a"
  prev="$a"
done
[ "$PGPASSWORD" = "__DEST__" ] || exit 4
[ -n "$SOURCE_PASSWORD$DEST_PASSWORD" ] && exit 6
grep -q "dumped with __SOURCE__" "$in" || exit 5
exit __EXIT__
"#;

/// Temp dir holding shell stand-ins for pg_isready, pg_dump and psql.
#[cfg(unix)]
pub struct ToolDir(pub PathBuf);

#[cfg(unix)]
impl ToolDir {
    pub fn new(psql_exit: i32) -> Self {
        let dir = std::env::temp_dir().join(format!("pg_transfer_tools_{}", Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).unwrap();
        let psql = PSQL_TEMPLATE
            .replace("__DEST__", DEST_PASSWORD)
            .replace("__SOURCE__", SOURCE_PASSWORD)
            .replace("__EXIT__", &psql_exit.to_string());
        write_script(&dir.join("pg_isready"), PG_ISREADY);
        write_script(&dir.join("pg_dump"), PG_DUMP);
        write_script(&dir.join("psql"), &psql);
        ToolDir(dir)
    }

    pub fn configure(&self, config: &mut TransferConfig) {
        config.gate.program = self.tool("pg_isready");
        config.tools.pg_dump = self.tool("pg_dump");
        config.tools.psql = self.tool("psql");
    }

    /// A pg_isready that never sees the server come up.
    pub fn with_unreachable_source(self) -> Self {
        write_script(
            &self.0.join("pg_isready"),
            "#!/bin/sh\necho \"$2:5432 - no response\"\nexit 2\n",
        );
        self
    }

    pub fn tool(&self, name: &str) -> String {
        self.0.join(name).to_string_lossy().into_owned()
    }
}

#[cfg(unix)]
impl Drop for ToolDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    std::fs::write(path, body).unwrap();
    std::fs::set_permissions(
        path,
        <std::fs::Permissions as std::os::unix::fs::PermissionsExt>::from_mode(0o755),
    )
    .unwrap();
}
