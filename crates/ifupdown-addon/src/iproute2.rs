//! Route-table accessor backed by the `ip` command.
//!
//! Changes can be queued between [`IpRoute2::batch_start`] and
//! [`IpRoute2::batch_commit`]; the queue is then handed to
//! `ip -force -batch -` in one process.

use tracing::{debug, info};

use crate::defaults;
use crate::error::AddonResult;
use crate::shell::{self, shellquote};

/// One line of `ip route show` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// Prefix, or `default`.
    pub destination: String,
    pub gateway: Option<String>,
    pub dev: Option<String>,
    pub protocol: Option<String>,
    pub metric: Option<u32>,
}

impl RouteEntry {
    pub fn is_default(&self) -> bool {
        self.destination == "default"
    }
}

/// Parses one line of `ip route show`. Returns `None` for blank lines.
pub fn parse_route_line(line: &str) -> Option<RouteEntry> {
    let mut tokens = line.split_whitespace();
    let mut destination = tokens.next()?;

    // Route type prefixes ("unreachable 10.0.0.0/8", "blackhole ...")
    if matches!(destination, "unicast" | "unreachable" | "blackhole" | "prohibit" | "local") {
        destination = tokens.next()?;
    }

    let mut entry = RouteEntry {
        destination: destination.to_string(),
        gateway: None,
        dev: None,
        protocol: None,
        metric: None,
    };

    while let Some(token) = tokens.next() {
        match token {
            "via" => entry.gateway = tokens.next().map(str::to_string),
            "dev" => entry.dev = tokens.next().map(str::to_string),
            "proto" => entry.protocol = tokens.next().map(str::to_string),
            "metric" => entry.metric = tokens.next().and_then(|m| m.parse().ok()),
            _ => {}
        }
    }

    Some(entry)
}

/// `ip route` front end.
#[derive(Debug, Clone)]
pub struct IpRoute2 {
    ip_cmd: String,
    dry_run: bool,
    batch: Option<Vec<String>>,
    /// Commands not executed because of dry-run mode.
    skipped: Vec<String>,
}

impl Default for IpRoute2 {
    fn default() -> Self {
        Self::new()
    }
}

impl IpRoute2 {
    pub fn new() -> Self {
        Self {
            ip_cmd: defaults::IP_CMD.to_string(),
            dry_run: false,
            batch: None,
            skipped: Vec::new(),
        }
    }

    /// Creates an accessor that records changes instead of applying them.
    /// Queries still run.
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::new()
        }
    }

    /// Uses another `ip` binary.
    pub fn with_ip_cmd(mut self, ip_cmd: impl Into<String>) -> Self {
        self.ip_cmd = ip_cmd.into();
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Changes skipped in dry-run mode, as `ip` argument strings.
    pub fn skipped_commands(&self) -> &[String] {
        &self.skipped
    }

    /// Starts queueing changes instead of running them one by one.
    pub fn batch_start(&mut self) {
        if self.batch.is_none() {
            self.batch = Some(Vec::new());
        }
    }

    pub fn in_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Number of queued changes.
    pub fn batch_len(&self) -> usize {
        self.batch.as_ref().map_or(0, Vec::len)
    }

    /// Runs the queued changes. An empty or absent batch is a no-op.
    pub fn batch_commit(&mut self) -> AddonResult<()> {
        let lines = match self.batch.take() {
            Some(lines) if !lines.is_empty() => lines,
            _ => return Ok(()),
        };

        if self.dry_run {
            for line in &lines {
                info!(command = %line, "[DRY RUN] Would run batched ip command");
            }
            self.skipped.extend(lines);
            return Ok(());
        }

        debug!(count = lines.len(), "Committing ip batch");
        let mut input = lines.join("\n");
        input.push('\n');
        shell::exec_with_input(&format!("{} -force -batch -", self.ip_cmd), &input).map(|_| ())
    }

    fn apply(&mut self, args: String) -> AddonResult<()> {
        if let Some(batch) = self.batch.as_mut() {
            batch.push(args);
            return Ok(());
        }

        if self.dry_run {
            info!(command = %args, "[DRY RUN] Would run ip command");
            self.skipped.push(args);
            return Ok(());
        }

        shell::exec_or_fail(&format!("{} {}", self.ip_cmd, args)).map(|_| ())
    }

    /// Lists the routes of one table.
    pub fn route_show(&self, table: &str) -> AddonResult<Vec<RouteEntry>> {
        let output = shell::exec_or_fail(&format!(
            "{} route show table {}",
            self.ip_cmd,
            shellquote(table)
        ))?;

        Ok(output.lines().filter_map(parse_route_line).collect())
    }

    /// Gateways of the default routes of one table.
    pub fn default_gateways(&self, table: &str) -> AddonResult<Vec<String>> {
        Ok(self
            .route_show(table)?
            .into_iter()
            .filter(RouteEntry::is_default)
            .filter_map(|r| r.gateway)
            .collect())
    }

    /// Adds (or replaces) a route.
    pub fn route_add(
        &mut self,
        destination: &str,
        gateway: Option<&str>,
        dev: Option<&str>,
        table: &str,
    ) -> AddonResult<()> {
        let mut args = format!("route replace {}", shellquote(destination));
        if let Some(gateway) = gateway {
            args.push_str(&format!(" via {}", shellquote(gateway)));
        }
        if let Some(dev) = dev {
            args.push_str(&format!(" dev {}", shellquote(dev)));
        }
        args.push_str(&format!(" table {}", shellquote(table)));
        self.apply(args)
    }

    pub fn route_del(&mut self, destination: &str, table: &str) -> AddonResult<()> {
        self.apply(format!(
            "route del {} table {}",
            shellquote(destination),
            shellquote(table)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_default_route() {
        let entry = parse_route_line("default via 10.0.0.1 dev eth0 proto static metric 20").unwrap();
        assert!(entry.is_default());
        assert_eq!(entry.gateway.as_deref(), Some("10.0.0.1"));
        assert_eq!(entry.dev.as_deref(), Some("eth0"));
        assert_eq!(entry.protocol.as_deref(), Some("static"));
        assert_eq!(entry.metric, Some(20));
    }

    #[test]
    fn test_parse_connected_route() {
        let entry =
            parse_route_line("10.0.0.0/24 dev eth0 proto kernel scope link src 10.0.0.2").unwrap();
        assert_eq!(
            entry,
            RouteEntry {
                destination: "10.0.0.0/24".to_string(),
                gateway: None,
                dev: Some("eth0".to_string()),
                protocol: Some("kernel".to_string()),
                metric: None,
            }
        );
    }

    #[test]
    fn test_parse_typed_route() {
        let entry = parse_route_line("unreachable 192.0.2.0/24 proto static").unwrap();
        assert_eq!(entry.destination, "192.0.2.0/24");
        assert!(parse_route_line("   ").is_none());
    }

    #[test]
    fn test_dry_run_records_changes() {
        let mut ip = IpRoute2::dry_run();
        ip.route_add("10.1.0.0/16", Some("10.0.0.1"), None, "main")
            .unwrap();
        ip.route_del("default", "100").unwrap();

        assert_eq!(
            ip.skipped_commands(),
            &[
                "route replace \"10.1.0.0/16\" via \"10.0.0.1\" table \"main\"".to_string(),
                "route del \"default\" table \"100\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_batch_queues_until_commit() {
        let mut ip = IpRoute2::dry_run();
        ip.batch_start();
        ip.route_add("default", Some("10.0.0.1"), Some("eth0"), "main")
            .unwrap();
        ip.route_del("10.9.0.0/16", "main").unwrap();

        assert!(ip.in_batch());
        assert_eq!(ip.batch_len(), 2);
        assert!(ip.skipped_commands().is_empty());

        ip.batch_commit().unwrap();
        assert!(!ip.in_batch());
        assert_eq!(ip.skipped_commands().len(), 2);
    }

    #[test]
    fn test_empty_batch_commit_is_noop() {
        let mut ip = IpRoute2::new();
        ip.batch_start();
        ip.batch_commit().unwrap();
        ip.batch_commit().unwrap();
        assert!(!ip.in_batch());
    }

    #[test]
    fn test_route_show_with_fake_ip() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("ip");
        std::fs::write(
            &script,
            "echo 'default via 10.0.0.1 dev eth0'\n\
             echo '10.0.0.0/24 dev eth0 proto kernel scope link src 10.0.0.2'\n",
        )
        .unwrap();

        let ip = IpRoute2::new().with_ip_cmd(format!("/bin/sh {}", script.display()));
        let routes = ip.route_show("main").unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(ip.default_gateways("main").unwrap(), vec!["10.0.0.1"]);
    }
}
