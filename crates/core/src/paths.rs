//! Sanitisation of server-supplied relative paths.
//!
//! The remote library reports file locations (`full_path`) as produced by a
//! host whose OS is unknown. Drive letters and UNC shares are therefore
//! recognised structurally instead of through [`std::path`], which only
//! understands the conventions of the machine we happen to run on.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use once_cell::sync::Lazy;
use regex::Regex;

/// Token returned when nothing safe remains of the input.
pub const CURRENT_DIR: &str = ".";

static VOLUME_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^(?:
            \\\\[?.][\\/](?:UNC[\\/][^\\/]+(?:[\\/][^\\/]*)?|[A-Za-z]:)?
          | \\\\[^\\/]+(?:[\\/][^\\/]*)?
          | [A-Za-z]:
        )",
    )
    .expect("invalid volume prefix regex")
});

/// Convert an untrusted path into a relative, traversal-free, OS-native path.
///
/// Never fails: input that cleans down to nothing yields [`CURRENT_DIR`].
/// The result is safe to join onto a trusted root without escaping it.
///
/// ```
/// use romlink_core::paths::sanitize;
///
/// assert_eq!(sanitize("../../etc/passwd"), "etc/passwd");
/// assert_eq!(sanitize(".."), ".");
/// ```
pub fn sanitize(raw: &str) -> String {
    let mut current = sanitize_once(raw);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    to_native(current)
}

/// Join `raw` onto `root` after sanitising it. The result never leaves `root`.
pub fn resolve_under(root: &Path, raw: &str) -> PathBuf {
    let relative = sanitize(raw);
    if relative == CURRENT_DIR {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

/// Strip any leading Windows volume designator, regardless of host OS.
///
/// Handles drive letters (`C:`), UNC shares (`\\server\share`), and the
/// extended/device forms (`\\?\C:`, `\\?\UNC\server\share`, `\\.\`).
/// Shares must start with two backslashes: a leading `//` is only a
/// redundant separator. Stacked prefixes are all removed.
pub fn strip_foreign_volume(path: &str) -> &str {
    let mut rest = path;
    while let Some(found) = VOLUME_PREFIX_RE.find(rest) {
        if found.end() == 0 {
            break;
        }
        rest = &rest[found.end()..];
    }
    rest
}

/// Lexically clean a `/`-separated path.
///
/// `.` segments and redundant separators disappear, `..` consumes the
/// preceding normal segment, and `..` directly under a root is dropped.
/// Leading `..` segments of a relative path are kept. An empty result
/// becomes [`CURRENT_DIR`].
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return CURRENT_DIR.to_string();
    }

    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        CURRENT_DIR.to_string()
    } else {
        joined
    }
}

fn sanitize_once(raw: &str) -> String {
    let unified = strip_foreign_volume(raw).replace('\\', "/");
    let mut cleaned = clean(&unified);

    loop {
        if let Some(rest) = cleaned.strip_prefix("../") {
            cleaned = rest.to_string();
        } else if cleaned == ".." {
            cleaned = CURRENT_DIR.to_string();
        } else {
            break;
        }
    }

    let relative = cleaned.trim_start_matches('/');
    if relative.is_empty() || relative == CURRENT_DIR {
        CURRENT_DIR.to_string()
    } else {
        relative.to_string()
    }
}

fn to_native(path: String) -> String {
    if MAIN_SEPARATOR == '/' {
        path
    } else {
        path.replace('/', &MAIN_SEPARATOR.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn native(path: &str) -> String {
        path.replace('/', &MAIN_SEPARATOR.to_string())
    }

    #[test]
    fn strips_leading_traversal() {
        assert_eq!(sanitize("../../etc/passwd"), native("etc/passwd"));
        assert_eq!(sanitize("..\\..\\etc\\passwd"), native("etc/passwd"));
    }

    #[test]
    fn bare_parent_and_empty_become_current_dir() {
        assert_eq!(sanitize(".."), ".");
        assert_eq!(sanitize(""), ".");
        assert_eq!(sanitize("."), ".");
        assert_eq!(sanitize("/"), ".");
        assert_eq!(sanitize("../.."), ".");
    }

    #[test]
    fn strips_drive_letters_on_any_host() {
        assert_eq!(sanitize("C:\\a\\b.sav"), native("a/b.sav"));
        assert_eq!(
            sanitize("C:\\Users\\x\\file.sav"),
            native("Users/x/file.sav")
        );
        assert_eq!(sanitize("d:relative\\rom.gba"), native("relative/rom.gba"));
        assert_eq!(sanitize("C:"), ".");
    }

    #[test]
    fn strips_unc_and_extended_prefixes() {
        assert_eq!(
            sanitize("\\\\nas\\roms\\gba\\zelda.gba"),
            native("gba/zelda.gba")
        );
        assert_eq!(sanitize("\\\\?\\C:\\roms\\snes.sfc"), native("roms/snes.sfc"));
        assert_eq!(
            sanitize("\\\\?\\UNC\\nas\\share\\snes.sfc"),
            native("snes.sfc")
        );
        assert_eq!(sanitize("\\\\.\\device\\x"), native("device/x"));
    }

    #[test]
    fn doubled_forward_slashes_keep_every_segment() {
        assert_eq!(sanitize("//roms/gba/game.gba"), native("roms/gba/game.gba"));
        assert_eq!(sanitize("/library//roms"), native("library/roms"));
        assert_ne!(sanitize("//a/b/x.sav"), sanitize("//c/d/x.sav"));
        assert_eq!(sanitize("//etc"), "etc");
        assert_eq!(strip_foreign_volume("//roms/gba"), "//roms/gba");
    }

    #[test]
    fn absolute_unix_paths_become_relative() {
        assert_eq!(
            sanitize("/library/roms/n64/mario.z64"),
            native("library/roms/n64/mario.z64")
        );
        assert_eq!(sanitize("/../../etc/shadow"), native("etc/shadow"));
    }

    #[test]
    fn interior_traversal_is_resolved_lexically() {
        assert_eq!(
            sanitize("roms/./gba//../snes/game.sfc"),
            native("roms/snes/game.sfc")
        );
        assert_eq!(sanitize("a\\..\\..\\b"), "b");
        assert_eq!(sanitize("a/../../../b/c"), native("b/c"));
    }

    #[test]
    fn stacked_prefixes_do_not_survive() {
        assert_eq!(sanitize("C:C:\\x"), "x");
        assert_eq!(sanitize("../C:/x"), "x");
        assert_eq!(sanitize("/D:/x"), "x");
    }

    #[test]
    fn sanitize_is_idempotent_on_samples() {
        for sample in [
            "../../etc/passwd",
            "C:\\a\\b.sav",
            "\\\\srv\\share\\..\\x",
            "roms/gba/Golden Sun (USA).gba",
            "...",
            "a/.../b",
        ] {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn clean_matches_lexical_semantics() {
        assert_eq!(clean(""), ".");
        assert_eq!(clean("a//b/./c/.."), "a/b");
        assert_eq!(clean("/../a"), "/a");
        assert_eq!(clean("../../a"), "../../a");
        assert_eq!(clean("a/../.."), "..");
        assert_eq!(clean("/"), "/");
    }

    #[test]
    fn strip_foreign_volume_leaves_plain_paths_alone() {
        assert_eq!(strip_foreign_volume("roms/gba"), "roms/gba");
        assert_eq!(strip_foreign_volume("C:\\roms"), "\\roms");
        assert_eq!(strip_foreign_volume("\\\\srv\\share\\roms"), "\\roms");
        assert_eq!(strip_foreign_volume("/abs"), "/abs");
    }

    #[test]
    fn resolve_under_stays_inside_root() {
        let root = Path::new("/srv/library");
        assert_eq!(
            resolve_under(root, "../../etc/passwd"),
            root.join("etc").join("passwd")
        );
        assert_eq!(resolve_under(root, ".."), root.to_path_buf());
        assert!(resolve_under(root, "C:\\Windows\\x").starts_with(root));
    }
}
