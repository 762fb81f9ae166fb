//! Rendering of translated interfaces and alias tables.

use clap::ValueEnum;
use ifupdown_addon::{AliasIndex, Interface};
use serde::Serialize;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// `interfaces(5)` text for interfaces, one line per alias otherwise.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Lines of one `iface` stanza, preceded by its `auto` line if any.
fn stanza_lines(iface: &Interface) -> Vec<String> {
    let mut lines = Vec::new();
    if iface.auto {
        lines.push(format!("auto {}", iface.name));
    }

    lines.push(match (&iface.addr_family, &iface.method) {
        (Some(family), Some(method)) => format!("iface {} {} {}", iface.name, family, method),
        _ => format!("iface {}", iface.name),
    });

    for (key, values) in iface.config.iter() {
        lines.extend(values.iter().map(|value| {
            if value.is_empty() {
                format!("    {}", key)
            } else {
                format!("    {} {}", key, value)
            }
        }));
    }
    lines
}

/// Renders interfaces back to `interfaces(5)` syntax, stanzas separated
/// by a blank line.
pub fn interfaces_to_text(ifaces: &[Interface]) -> String {
    ifaces
        .iter()
        .map(|iface| {
            let mut stanza = stanza_lines(iface).join("\n");
            stanza.push('\n');
            stanza
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_interfaces(ifaces: &[Interface], format: Format) -> serde_json::Result<String> {
    match format {
        Format::Text => Ok(interfaces_to_text(ifaces)),
        Format::Json => serde_json::to_string_pretty(ifaces),
    }
}

#[derive(Debug, Serialize)]
struct AliasRow<'a> {
    alias: &'a str,
    attribute: &'a str,
}

#[derive(Debug, Serialize)]
struct ConflictRow<'a> {
    alias: &'a str,
    overridden: &'a str,
    attribute: &'a str,
}

#[derive(Debug, Serialize)]
struct AliasReport<'a> {
    addon: &'a str,
    aliases: Vec<AliasRow<'a>>,
    conflicts: Vec<ConflictRow<'a>>,
}

/// Renders an alias index, sorted by alias, followed by any collisions.
pub fn render_aliases(addon: &str, index: &AliasIndex, format: Format) -> serde_json::Result<String> {
    let report = AliasReport {
        addon,
        aliases: index
            .iter()
            .map(|(alias, attribute)| AliasRow { alias, attribute })
            .collect(),
        conflicts: index
            .conflicts()
            .iter()
            .map(|c| ConflictRow {
                alias: &c.alias,
                overridden: &c.first,
                attribute: &c.second,
            })
            .collect(),
    };

    match format {
        Format::Json => serde_json::to_string_pretty(&report),
        Format::Text => {
            let mut out = String::new();
            for row in &report.aliases {
                out.push_str(&format!("{} -> {}\n", row.alias, row.attribute));
            }
            for row in &report.conflicts {
                out.push_str(&format!(
                    "# conflict: '{}' claimed by '{}' and '{}', using '{}'\n",
                    row.alias, row.overridden, row.attribute, row.attribute
                ));
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifupdown_addon::{AddonMetadata, AttributeDescriptor};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_interfaces_to_text() {
        let mut lo = Interface::new("lo");
        lo.auto = true;
        lo.addr_family = Some("inet".to_string());
        lo.method = Some("loopback".to_string());

        let swp1 = Interface::new("swp1")
            .with_attr("mtu", "9216")
            .with_attr("address", "10.0.0.1/24")
            .with_attr("address", "10.0.1.1/24")
            .with_attr("bridge-vlan-aware", "");

        assert_eq!(
            interfaces_to_text(&[lo, swp1]),
            "auto lo\niface lo inet loopback\n\n\
             iface swp1\n    mtu 9216\n    address 10.0.0.1/24\n    address 10.0.1.1/24\n    bridge-vlan-aware\n"
        );
    }

    #[test]
    fn test_interfaces_to_text_edges() {
        assert_eq!(interfaces_to_text(&[]), "");

        let mut eth0 = Interface::new("eth0");
        eth0.addr_family = Some("inet".to_string());
        assert_eq!(interfaces_to_text(&[eth0]), "iface eth0\n");
    }

    #[test]
    fn test_render_interfaces_json() {
        let json = render_interfaces(&[Interface::new("eth0").with_attr("mtu", "1500")], Format::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "eth0");
        assert_eq!(value[0]["config"][0][0], "mtu");
        assert_eq!(value[0]["config"][0][1][0], "1500");
    }

    #[test]
    fn test_render_aliases() {
        let metadata = AddonMetadata::new()
            .attr("mtu", AttributeDescriptor::new().alias("link-mtu"))
            .attr("a", AttributeDescriptor::new().alias("x"))
            .attr("b", AttributeDescriptor::new().alias("x"));
        let index = AliasIndex::build(&metadata);

        assert_eq!(
            render_aliases("link", &index, Format::Text).unwrap(),
            "link-mtu -> mtu\nx -> b\n# conflict: 'x' claimed by 'a' and 'b', using 'b'\n"
        );

        let json = render_aliases("link", &index, Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["addon"], "link");
        assert_eq!(value["aliases"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["conflicts"][0]["overridden"], "a");
    }
}
