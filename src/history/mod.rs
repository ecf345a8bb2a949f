use std::env;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFamily {
    Zsh,
    Bash,
    Fish,
    PowerShell,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct HistorySource {
    pub family: ShellFamily,
    pub path: PathBuf,
}

impl HistorySource {
    fn new(family: ShellFamily, path: PathBuf) -> Self {
        Self { family, path }
    }
}

/// Find the active shell's history file. Returns `None` when no known or
/// probed history file exists; history is optional enrichment, so callers
/// treat `None` as "no context" rather than an error.
pub fn locate() -> Option<HistorySource> {
    if cfg!(windows) {
        if let Some(source) = locate_psreadline() {
            return Some(source);
        }
    }

    let home = dirs::home_dir()?;
    let shell = env::var("SHELL").unwrap_or_default();
    let histfile = env::var("HISTFILE").ok();

    resolve_source(
        &shell,
        histfile.as_deref().filter(|v| !v.is_empty()),
        &home,
    )
}

// PSReadLine keeps one history file per PowerShell generation; the
// Windows PowerShell 5.x location is checked before the 7+ one.
fn locate_psreadline() -> Option<HistorySource> {
    let appdata = dirs::config_dir()?;
    let candidates = [
        appdata
            .join("Microsoft")
            .join("Windows")
            .join("PowerShell")
            .join("PSReadLine")
            .join("ConsoleHost_history.txt"),
        appdata
            .join("Microsoft")
            .join("PowerShell")
            .join("PSReadLine")
            .join("ConsoleHost_history.txt"),
    ];

    candidates
        .into_iter()
        .find(|path| path.exists())
        .map(|path| HistorySource::new(ShellFamily::PowerShell, path))
}

// A user-set HISTFILE wins over the shell's default path; a default path
// that does not exist falls through to probing the common locations.
fn resolve_source(
    shell: &str,
    histfile_override: Option<&str>,
    home: &Path,
) -> Option<HistorySource> {
    if shell.contains("zsh") {
        if let Some(histfile) = histfile_override {
            return Some(HistorySource::new(
                ShellFamily::Zsh,
                PathBuf::from(histfile),
            ));
        }
        let default = home.join(".zsh_history");
        if default.exists() {
            return Some(HistorySource::new(ShellFamily::Zsh, default));
        }
    } else if shell.contains("bash") {
        if let Some(histfile) = histfile_override {
            return Some(HistorySource::new(
                ShellFamily::Bash,
                PathBuf::from(histfile),
            ));
        }
        let default = home.join(".bash_history");
        if default.exists() {
            return Some(HistorySource::new(ShellFamily::Bash, default));
        }
    } else if shell.contains("fish") {
        let mac = home
            .join("Library")
            .join("Application Support")
            .join("fish")
            .join("fish_history");
        if mac.exists() {
            return Some(HistorySource::new(ShellFamily::Fish, mac));
        }
        let linux = home.join(".local").join("share").join("fish").join("fish_history");
        if linux.exists() {
            return Some(HistorySource::new(ShellFamily::Fish, linux));
        }
    }

    probe_default_paths(home)
}

fn probe_default_paths(home: &Path) -> Option<HistorySource> {
    let candidates = [
        (ShellFamily::Zsh, home.join(".zsh_history")),
        (ShellFamily::Bash, home.join(".bash_history")),
        (
            ShellFamily::Fish,
            home.join(".local").join("share").join("fish").join("fish_history"),
        ),
        (
            ShellFamily::Fish,
            home.join("Library")
                .join("Application Support")
                .join("fish")
                .join("fish_history"),
        ),
    ];

    candidates
        .into_iter()
        .find(|(_, path)| path.exists())
        .map(|(family, path)| HistorySource::new(family, path))
}

/// Read the last `max_lines` non-empty lines of a file without loading it
/// entirely, scanning backward in fixed-size chunks. Any I/O failure yields
/// an empty result.
pub fn read_tail(path: &Path, max_lines: usize) -> Vec<String> {
    match read_tail_inner(path, max_lines) {
        Ok(lines) => lines,
        Err(err) => {
            debug!("history tail read failed for {}: {}", path.display(), err);
            Vec::new()
        }
    }
}

fn read_tail_inner(path: &Path, max_lines: usize) -> std::io::Result<Vec<String>> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    if size == 0 || max_lines == 0 {
        return Ok(Vec::new());
    }

    // The +1 guards against an uncounted partial line at the window start.
    let needed_newlines = max_lines + 1;

    let mut position = size;
    let mut accumulated: Vec<u8> = Vec::new();

    while position > 0 && count_newlines(&accumulated) < needed_newlines {
        let read_len = CHUNK_SIZE.min(position as usize);
        position -= read_len as u64;
        file.seek(SeekFrom::Start(position))?;

        let mut chunk = vec![0u8; read_len];
        file.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&accumulated);
        accumulated = chunk;
    }

    // Decode once at the end so chunk boundaries cannot split UTF-8 sequences.
    let text = String::from_utf8_lossy(&accumulated);
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_string())
        .collect();

    if lines.len() > max_lines {
        lines.drain(..lines.len() - max_lines);
    }
    Ok(lines)
}

fn count_newlines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\n').count()
}

fn zsh_entry_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^: \d+:\d+;(.*)$").expect("valid zsh history pattern"))
}

/// Turn raw history lines into logical commands for the given shell family,
/// reconstructing multi-line commands where the format splits them across
/// physical lines. Returns at most `max_entries` commands, oldest first.
pub fn parse(raw_lines: &[String], family: ShellFamily, max_entries: usize) -> Vec<String> {
    let mut entries = match family {
        ShellFamily::Zsh => parse_zsh(raw_lines),
        ShellFamily::Fish => parse_fish(raw_lines),
        _ => parse_plain(raw_lines),
    };

    if entries.len() > max_entries {
        entries.drain(..entries.len() - max_entries);
    }
    entries
}

// zsh extended format: `: <start>:<elapsed>;<command>`. A line that does not
// start with a colon continues the previous entry.
fn parse_zsh(lines: &[String]) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    for line in lines {
        if let Some(caps) = zsh_entry_pattern().captures(line) {
            entries.push(caps[1].to_string());
        } else if !line.starts_with(':') {
            if let Some(last) = entries.last_mut() {
                last.push('\n');
                last.push_str(line);
            }
        }
    }
    entries
}

// fish format: `- cmd: <command>`, with two-space-indented continuation lines.
fn parse_fish(lines: &[String]) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    let mut in_entry = false;
    for line in lines {
        if let Some(command) = line.strip_prefix("- cmd: ") {
            entries.push(command.to_string());
            in_entry = true;
        } else if in_entry && line.starts_with("  ") {
            if let Some(last) = entries.last_mut() {
                last.push('\n');
                last.push_str(&line[2..]);
            }
        } else {
            in_entry = false;
        }
    }
    entries
}

// bash and unknown formats: one command per line, skipping `#` timestamp
// comments written by HISTTIMEFORMAT.
fn parse_plain(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .collect()
}

/// Locate, read, and parse the active shell's history in one call.
pub fn recent_commands(max_commands: usize) -> Vec<String> {
    let Some(source) = locate() else {
        debug!("no shell history file found");
        return Vec::new();
    };
    debug!(
        "reading shell history from {} ({:?})",
        source.path.display(),
        source.family
    );

    // Multi-line entries collapse several physical lines into one command,
    // so scan a wider raw window than the number of entries requested.
    let raw = read_tail(&source.path, max_commands.saturating_mul(4));
    parse(&raw, source.family, max_commands)
}
