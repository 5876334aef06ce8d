//! `.netrc` credential lookup
//!
//! Supports the token grammar used by ftp/curl/Python's netrc: `machine`,
//! `default`, `login`, `password`, `account` and `macdef` (whose body runs to
//! the next blank line and is skipped). Values may be double-quoted to carry
//! whitespace, with `\` escaping the next character.

use std::path::{Path, PathBuf};

/// A login/password pair for one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Entry {
    login: String,
    account: String,
    password: String,
}

impl Entry {
    fn credentials(&self) -> Credentials {
        Credentials {
            login: self.login.clone(),
            password: self.password.clone(),
        }
    }
}

/// Parsed netrc file
#[derive(Debug, Clone, Default)]
pub struct Netrc {
    machines: Vec<(String, Entry)>,
    default: Option<Entry>,
}

enum Target {
    Machine(String),
    Default,
}

impl Netrc {
    /// Parse netrc content
    ///
    /// Unknown tokens are ignored rather than rejected.
    pub fn parse(content: &str) -> Self {
        let mut netrc = Netrc::default();
        let mut current: Option<(Target, Entry)> = None;

        let mut lines = content.lines();
        while let Some(line) = lines.next() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }

            let mut tokens = tokenize(line).into_iter();
            while let Some(token) = tokens.next() {
                match token.as_str() {
                    "machine" => {
                        netrc.finish(current.take());
                        if let Some(host) = tokens.next() {
                            current = Some((Target::Machine(host), Entry::default()));
                        }
                    }
                    "default" => {
                        netrc.finish(current.take());
                        current = Some((Target::Default, Entry::default()));
                    }
                    "login" | "user" => {
                        if let (Some((_, entry)), Some(value)) = (current.as_mut(), tokens.next()) {
                            entry.login = value;
                        }
                    }
                    "password" => {
                        if let (Some((_, entry)), Some(value)) = (current.as_mut(), tokens.next()) {
                            entry.password = value;
                        }
                    }
                    "account" => {
                        if let (Some((_, entry)), Some(value)) = (current.as_mut(), tokens.next()) {
                            entry.account = value;
                        }
                    }
                    "macdef" => {
                        netrc.finish(current.take());
                        for body in lines.by_ref() {
                            if body.trim().is_empty() {
                                break;
                            }
                        }
                        break;
                    }
                    _ => {}
                }
            }
        }
        netrc.finish(current);

        netrc
    }

    /// Load and parse a netrc file
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Credentials for `host`, falling back to the `default` entry
    pub fn authenticator(&self, host: &str) -> Option<Credentials> {
        self.machines
            .iter()
            .find(|(name, _)| name == host)
            .map(|(_, entry)| entry.credentials())
            .or_else(|| self.default.as_ref().map(Entry::credentials))
    }

    fn finish(&mut self, current: Option<(Target, Entry)>) {
        match current {
            Some((Target::Machine(host), entry)) => self.machines.push((host, entry)),
            Some((Target::Default, entry)) => self.default = Some(entry),
            None => {}
        }
    }
}

/// Split a line into whitespace-separated tokens, honoring double quotes
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        if c == '"' {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => token.extend(chars.next()),
                    _ => token.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                chars.next();
                if c == '\\' {
                    token.extend(chars.next());
                } else {
                    token.push(c);
                }
            }
        }
        tokens.push(token);
    }

    tokens
}

/// Default netrc location (`~/.netrc`)
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".netrc"))
}
