#![allow(dead_code)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

/// Writes an executable shell script.
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_owned()
}

/// A model checker stand-in that appends its arguments to `log` and writes a tiny CNF
/// to the `--outfile` argument. A failing one leaves a truncated CNF behind.
pub fn stub_cbmc(dir: &Path, log: &Path, exit_code: i32) -> PathBuf {
    write_script(
        &dir.join("cbmc"),
        &format!(
            r#"out=""
prev=""
for arg in "$@"; do
    if [ "$prev" = "--outfile" ]; then out="$arg"; fi
    prev="$arg"
done
echo "$*" >> "{log}"
if [ {exit_code} -eq 0 ]; then printf 'p cnf 1 1\n1 0\n' > "$out"; else printf 'p cnf' > "$out"; fi
exit {exit_code}
"#,
            log = log.display(),
        ),
    )
}

/// A solver stand-in that appends the formula path to `log` and exits with the given code.
pub fn stub_solver(dir: &Path, name: &str, log: &Path, exit_code: i32) -> PathBuf {
    write_script(
        &dir.join(name),
        &format!(
            "echo \"$1\" >> \"{log}\"\nexit {exit_code}\n",
            log = log.display()
        ),
    )
}

pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_owned).collect())
        .unwrap_or_default()
}
