//! `interfaces(5)` file parser.
//!
//! Understands the subset needed to feed addons: `auto` / `allow-auto`
//! lines, `iface NAME [FAMILY METHOD]` stanzas and their indented
//! attribute lines. Repeated attributes accumulate values, backslash
//! continuation lines are joined.

use std::collections::HashSet;

use ifupdown_addon::Interface;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: attribute '{key}' outside of an iface stanza")]
    AttributeOutsideStanza { line: usize, key: String },

    #[error("line {line}: iface without a name")]
    MissingIfaceName { line: usize },

    #[error("line {line}: iface {name}: expected both address family and method")]
    IncompleteIfaceLine { line: usize, name: String },
}

/// Joins continuation lines, dropping comments and blanks.
/// Yields `(first line number, logical line)`.
fn logical_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in input.lines().enumerate() {
        let trimmed = raw.trim();
        if pending.is_none() && (trimmed.is_empty() || trimmed.starts_with('#')) {
            continue;
        }

        let (start, mut text) = pending.take().unwrap_or((idx + 1, String::new()));
        if !text.is_empty() {
            text.push(' ');
        }

        match trimmed.strip_suffix('\\') {
            Some(head) => {
                text.push_str(head.trim_end());
                pending = Some((start, text));
            }
            None => {
                text.push_str(trimmed);
                lines.push((start, text));
            }
        }
    }

    if let Some(last) = pending {
        lines.push(last);
    }
    lines
}

/// Parses an interfaces file into records, in stanza order.
pub fn parse_interfaces(input: &str) -> Result<Vec<Interface>, ParseError> {
    let mut ifaces: Vec<Interface> = Vec::new();
    let mut auto: HashSet<String> = HashSet::new();
    let mut in_stanza = false;

    for (line, text) in logical_lines(input) {
        let (keyword, rest) = match text.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (text.as_str(), ""),
        };

        match keyword {
            "auto" | "allow-auto" => {
                auto.extend(rest.split_whitespace().map(str::to_string));
                in_stanza = false;
            }
            "iface" => {
                let mut words = rest.split_whitespace();
                let name = words.next().ok_or(ParseError::MissingIfaceName { line })?;

                let mut iface = Interface::new(name);
                match (words.next(), words.next()) {
                    (Some(family), Some(method)) => {
                        iface.addr_family = Some(family.to_string());
                        iface.method = Some(method.to_string());
                    }
                    (Some(_), None) => {
                        return Err(ParseError::IncompleteIfaceLine {
                            line,
                            name: name.to_string(),
                        })
                    }
                    _ => {}
                }

                debug!(iface = %name, line, "Parsed iface stanza");
                ifaces.push(iface);
                in_stanza = true;
            }
            "mapping" | "source" | "source-directory" => {
                warn!(line, keyword, "Skipping unsupported stanza");
                in_stanza = false;
            }
            _ if keyword.starts_with("allow-") => {
                in_stanza = false;
            }
            key => {
                let iface = match ifaces.last_mut() {
                    Some(iface) if in_stanza => iface,
                    _ => {
                        return Err(ParseError::AttributeOutsideStanza {
                            line,
                            key: key.to_string(),
                        })
                    }
                };
                iface.config.append(key, rest);
            }
        }
    }

    for iface in &mut ifaces {
        iface.auto = auto.contains(&iface.name);
    }

    Ok(ifaces)
}
