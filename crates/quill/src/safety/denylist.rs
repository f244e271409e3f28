//! Deterministic denylist for destructive shell commands.
//!
//! The check is lexical and errs towards denial. Quotes are dropped, then the
//! line is split into simple commands on newlines, `;`, `&`, `|`, parentheses
//! and backticks, which also opens up subshells and command substitutions.
//! Privilege wrappers and leading environment assignments are peeled off,
//! `sh -c` style scripts are matched as commands of their own, and each
//! simple command is matched against a fixed set of destructive shapes.

/// Top-level directories whose recursive deletion is catastrophic.
const PROTECTED_DIRECTORIES: &[&str] = &[
    "bin", "boot", "dev", "etc", "home", "lib", "lib64", "opt", "proc", "root", "sbin", "sys",
    "usr", "var",
];

/// Spellings of the invoking user's home directory.
const HOME_PREFIXES: &[&str] = &["${HOME}", "$HOME", "~"];

/// Partitioning and filesystem-formatting tools.
const DISK_TOOLS: &[&str] = &["fdisk", "parted", "sfdisk", "wipefs", "gdisk", "cfdisk"];

/// Block device prefixes that must never be written directly.
const RAW_DEVICES: &[&str] = &["/dev/sd", "/dev/nvme", "/dev/hd", "/dev/vd", "/dev/disk", "/dev/mmcblk"];

/// Wrappers that run the rest of the line as another command.
const WRAPPERS: &[&str] = &["sudo", "doas", "command", "exec", "nohup", "eval", "time", "{", "!"];

/// Shells whose `-c` argument is itself a command line.
const SHELLS: &[&str] = &["sh", "bash", "zsh", "dash", "ksh"];

/// Characters that end a simple command once quotes are gone.
const SEPARATORS: &[char] = &['\n', ';', '&', '|', '(', ')', '`'];

/// Returns why `command` is denied, if it is.
pub(super) fn match_command(command: &str) -> Option<&'static str> {
    if is_fork_bomb(command) {
        return Some("fork bomb");
    }
    if writes_raw_device(command) {
        return Some("redirect onto a raw disk device");
    }
    let unquoted: String = command.chars().filter(|ch| !matches!(ch, '"' | '\'')).collect();
    split_simple_commands(&unquoted)
        .into_iter()
        .find_map(|segment| match_simple(&segment))
}

fn split_simple_commands(command: &str) -> Vec<Vec<&str>> {
    command
        .split(SEPARATORS)
        .map(|part| unwrap_prefixes(part.split_whitespace().collect()))
        .filter(|tokens| !tokens.is_empty())
        .collect()
}

fn unwrap_prefixes(mut tokens: Vec<&str>) -> Vec<&str> {
    loop {
        match tokens.first() {
            Some(first) if WRAPPERS.contains(first) => {
                tokens.remove(0);
                while tokens.first().is_some_and(|token| token.starts_with('-')) {
                    tokens.remove(0);
                }
            }
            Some(first) if is_env_assignment(first) || *first == "env" => {
                tokens.remove(0);
            }
            _ => return tokens,
        }
    }
}

fn is_env_assignment(token: &str) -> bool {
    token.split_once('=').is_some_and(|(name, _)| {
        !name.is_empty() && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    })
}

fn program_name(token: &str) -> &str {
    token.rsplit('/').next().unwrap_or(token)
}

fn match_simple(tokens: &[&str]) -> Option<&'static str> {
    let (program, arguments) = tokens.split_first()?;
    let program = program_name(program);
    match program {
        shell if SHELLS.contains(&shell) => match_shell_script(arguments),
        "rm" if is_recursive_root_delete(arguments) => Some("recursive delete of a protected path"),
        "dd" if arguments.iter().any(|arg| {
            arg.strip_prefix("of=")
                .is_some_and(|target| target.starts_with("/dev/") && target != "/dev/null")
        }) =>
        {
            Some("raw disk write with dd")
        }
        "chmod" | "chown" if is_recursive(arguments) && targets_root(arguments) => {
            Some("recursive permission change on the filesystem root")
        }
        name if name.starts_with("mkfs") => Some("filesystem formatting tool"),
        name if DISK_TOOLS.contains(&name) => Some("disk partitioning tool"),
        "shutdown" | "reboot" | "halt" | "poweroff" => Some("system power command"),
        _ => None,
    }
}

/// Matches the script passed to `sh -c` (or `-ec`, `-lc` and friends).
fn match_shell_script(arguments: &[&str]) -> Option<&'static str> {
    let flag = arguments.iter().position(|arg| {
        arg.starts_with('-') && !arg.starts_with("--") && arg.contains('c')
    })?;
    let script = unwrap_prefixes(arguments.get(flag + 1..)?.to_vec());
    match_simple(&script)
}

fn is_recursive(arguments: &[&str]) -> bool {
    arguments.iter().any(|arg| {
        *arg == "--recursive"
            || (arg.starts_with('-')
                && !arg.starts_with("--")
                && arg.chars().skip(1).any(|ch| ch == 'r' || ch == 'R'))
    })
}

fn targets_root(arguments: &[&str]) -> bool {
    arguments
        .iter()
        .any(|arg| deletion_target(arg) == Some(Target::Root))
}

fn is_recursive_root_delete(arguments: &[&str]) -> bool {
    if arguments.contains(&"--no-preserve-root") {
        return true;
    }
    is_recursive(arguments)
        && arguments.iter().any(|arg| match deletion_target(arg) {
            Some(Target::Root | Target::Home) => true,
            Some(Target::TopLevel(name)) => PROTECTED_DIRECTORIES.contains(&name.as_str()),
            None => false,
        })
}

/// What an absolute or home-relative argument resolves to lexically.
#[derive(Debug, PartialEq, Eq)]
enum Target {
    Root,
    Home,
    TopLevel(String),
}

/// Resolves `arg` after collapsing `.`, `..`, repeated slashes and a
/// trailing `*`, which removes the directory's contents.
///
/// Returns `None` for relative paths and for anything deeper than one level
/// below the root.
fn deletion_target(arg: &str) -> Option<Target> {
    let (home, rest) = match HOME_PREFIXES
        .iter()
        .find_map(|prefix| arg.strip_prefix(prefix))
    {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => (true, rest),
        Some(_) => return None,
        None if arg.starts_with('/') => (false, arg),
        None => return None,
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    if segments.last() == Some(&"*") {
        segments.pop();
    }

    match (home, segments.as_slice()) {
        (true, []) => Some(Target::Home),
        (false, []) => Some(Target::Root),
        (false, [name]) => Some(Target::TopLevel((*name).to_owned())),
        _ => None,
    }
}

fn writes_raw_device(command: &str) -> bool {
    command.match_indices('>').any(|(index, _)| {
        let rest = command
            .get(index + 1..)
            .unwrap_or_default()
            .trim_start_matches(['>', '|'])
            .trim_start();
        RAW_DEVICES.iter().any(|device| rest.starts_with(device))
    })
}

/// Detects the classic `name(){ name|name& };name` shape, whitespace-insensitive.
fn is_fork_bomb(command: &str) -> bool {
    let compact: String = command.chars().filter(|ch| !ch.is_whitespace()).collect();
    let Some((name, rest)) = compact.split_once("(){") else {
        return false;
    };
    let name = name.rsplit([';', '&', '|']).next().unwrap_or(name);
    if name.is_empty() {
        return false;
    }
    rest.starts_with(&format!("{name}|{name}&"))
}
