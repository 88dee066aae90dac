//! Shared fixtures for integration tests
//!
//! The external tools are stand-ins written as shell scripts honoring the
//! real argument contracts: extractor `-d src dst`, codec `-d|-e src dst`,
//! container `-u dir src` (member names on stdout) and `-p dest members...`.

// Each integration binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable shell script into `dir`.
pub fn write_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Extractor stub: "extraction" strips a 4-byte header.
pub fn extractor(dir: &Path) -> PathBuf {
    write_tool(
        dir,
        "rpxtest",
        r#"[ "$1" = "-d" ] || exit 1
tail -c +5 "$2" > "$3""#,
    )
}

/// Codec stub: decode strips a one-byte prefix, encode adds it back.
pub fn codec(dir: &Path) -> PathBuf {
    write_tool(
        dir,
        "yaz0test",
        r#"case "$1" in
-d) tail -c +2 "$2" > "$3" ;;
-e) { printf 'Z'; cat "$2"; } > "$3" ;;
*) exit 1 ;;
esac"#,
    )
}

/// Container stub: unpack splits the archive at a fixed offset into two
/// members and reports them on stdout; pack concatenates.
pub fn container(dir: &Path) -> PathBuf {
    write_tool(
        dir,
        "sarctest",
        r#"if [ "$1" = "-u" ]; then
    head -c 4 "$3" > "$2/head.bin"
    tail -c +5 "$3" > "$2/tail.bin"
    echo head.bin
    echo tail.bin
    exit 0
fi
if [ "$1" = "-p" ]; then
    dest="$2"; shift 2
    cat "$@" > "$dest"
    exit 0
fi
exit 1"#,
    )
}
