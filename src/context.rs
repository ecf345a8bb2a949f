use std::env;
use std::fs;

use tracing::debug;

use crate::config::ContextConfig;
use crate::history;

const MAX_LISTING_ENTRIES: usize = 50;

#[derive(Debug)]
pub struct EnvironmentContext {
    pub os: String,
    pub arch: String,
    pub shell: String,
    pub cwd: String,
    pub home: String,
}

impl EnvironmentContext {
    pub fn gather() -> Self {
        let shell = env::var("SHELL")
            .ok()
            .and_then(|value| value.rsplit('/').next().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());

        let cwd = env::current_dir()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());

        let home = dirs::home_dir()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            os: env::consts::OS.to_string(),
            arch: env::consts::ARCH.to_string(),
            shell,
            cwd,
            home,
        }
    }

    pub fn render(&self) -> String {
        format!(
            "Operating System: {} ({})\n\
             Shell: {}\n\
             Current Working Directory: {}\n\
             Home Directory: {}",
            self.os, self.arch, self.shell, self.cwd, self.home
        )
    }
}

/// Names in the working directory, directories marked with a trailing slash.
/// Capped and sorted; a read failure degrades to a placeholder string.
pub fn directory_listing() -> String {
    match fs::read_dir(".") {
        Ok(dir) => {
            let mut names: Vec<String> = dir
                .filter_map(|entry| entry.ok())
                .map(|entry| {
                    let mut name = entry.file_name().to_string_lossy().into_owned();
                    if entry.file_type().map(|kind| kind.is_dir()).unwrap_or(false) {
                        name.push('/');
                    }
                    name
                })
                .collect();
            names.sort();
            names.truncate(MAX_LISTING_ENTRIES);
            if names.is_empty() {
                "(empty directory)".to_string()
            } else {
                names.join("\n")
            }
        }
        Err(err) => {
            debug!("directory listing failed: {}", err);
            "Unable to get directory listing".to_string()
        }
    }
}

/// Recent-commands block for the system prompt. Empty when history context
/// is disabled or no commands could be read.
pub fn build_history_block(context: &ContextConfig) -> String {
    if !context.enabled {
        return String::new();
    }
    let commands = history::recent_commands(context.max_history_commands);
    render_history_block(&commands)
}

fn render_history_block(commands: &[String]) -> String {
    if commands.is_empty() {
        return String::new();
    }

    let mut block = String::from("\n--- RECENT COMMANDS ---\n");
    block.push_str("Recent shell commands (most recent last):\n");
    for (idx, command) in commands.iter().enumerate() {
        block.push_str(&format!("{}. {}\n", idx + 1, command));
    }
    block.push_str("--- END COMMAND HISTORY ---\n");
    block
}
