use serde::{Deserialize, Serialize};

/// Sentinel pattern reported when a command clears the deny table but no
/// allow prefix matches.
pub const NONE_MATCHED: &str = "<none-matched>";

/// Dangerous fragments, scanned in order. The first hit wins.
const DENY_PATTERNS: &[&str] = &[
    // destructive file operations
    "rm ", "rm\t", "rmdir", "del ", "shred",
    // process termination
    "kill ", "killall", "pkill",
    // power state
    "shutdown", "reboot", "halt", "poweroff",
    // disk formatting
    "mkfs", "dd ", "format",
    // permissions and ownership
    "chmod", "chown",
    "mv ", "cp ",
    // network fetchers
    "curl ", "wget ",
    // redirection
    "> ", ">> ", "| rm",
    // privilege escalation
    "sudo", "su ",
    // package managers
    "apt ", "yum ", "dnf ", "pip ",
    "npm ", "npx ",
    "systemctl stop", "systemctl disable",
    "iptables",
    // account management
    "passwd", "useradd", "userdel",
    "eval ", "exec ",
    "base64 -d",
    // command substitution
    "$(", "`",
];

/// Read-only programs a command may start with.
const ALLOW_PREFIXES: &[&str] = &[
    "ps ", "ps\n", "top ", "pgrep ",
    "free", "vmstat",
    "df ", "df\n", "du ", "lsblk",
    "netstat", "ss ", "ip ",
    "uname", "uptime", "hostname", "whoami", "date",
    "cat /proc/", "head ", "tail ", "wc ",
    "ls ", "ls\n", "find ",
    "env", "printenv", "echo $",
    "grep ",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum PolicyDecision {
    Allowed,
    Denied { matched_pattern: String },
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allowed)
    }

    pub fn matched_pattern(&self) -> Option<&str> {
        match self {
            PolicyDecision::Allowed => None,
            PolicyDecision::Denied { matched_pattern } => Some(matched_pattern),
        }
    }

    /// Human-readable reason shown to the operator. `None` when allowed.
    pub fn reason(&self) -> Option<String> {
        match self {
            PolicyDecision::Allowed => None,
            PolicyDecision::Denied { matched_pattern } if matched_pattern == NONE_MATCHED => Some(
                "Command not in safe list. Only read-only system commands are allowed.".to_string(),
            ),
            PolicyDecision::Denied { matched_pattern } => Some(format!(
                "Blocked: command contains dangerous pattern \"{}\"",
                matched_pattern.trim()
            )),
        }
    }
}

/// Deny-list plus allow-prefix classifier for free-form commands.
///
/// This is text matching, not a sandbox. It cannot prove an allowed string
/// is inert.
#[derive(Debug, Clone)]
pub struct PolicyGate {
    deny_patterns: Vec<String>,
    allow_prefixes: Vec<String>,
}

impl PolicyGate {
    pub fn new() -> Self {
        Self {
            deny_patterns: DENY_PATTERNS.iter().map(|p| p.to_string()).collect(),
            allow_prefixes: ALLOW_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Built-in tables plus operator supplied deny patterns, appended after
    /// the built-in ones. Empty patterns are ignored since they would match
    /// everything.
    pub fn with_extra_denials<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut gate = Self::new();
        for pattern in extra {
            let pattern: String = pattern.into();
            if !pattern.is_empty() {
                gate.deny_patterns.push(pattern);
            }
        }
        gate
    }

    pub fn evaluate(&self, command: &str) -> PolicyDecision {
        let normalized = command.trim().to_lowercase();
        // End of input counts as whitespace, so "xargs kill" still hits "kill ".
        let scanned = format!("{} ", normalized);

        // Deny scan runs first so an allowed prefix cannot mask a later fragment.
        for pattern in &self.deny_patterns {
            if scanned.contains(&pattern.to_lowercase()) {
                return PolicyDecision::Denied {
                    matched_pattern: pattern.clone(),
                };
            }
        }

        let allowed = self
            .allow_prefixes
            .iter()
            .any(|prefix| normalized.starts_with(prefix.as_str()) || normalized == prefix.trim());

        if allowed {
            PolicyDecision::Allowed
        } else {
            PolicyDecision::Denied {
                matched_pattern: NONE_MATCHED.to_string(),
            }
        }
    }

    pub fn deny_patterns(&self) -> &[String] {
        &self.deny_patterns
    }

    pub fn allow_prefixes(&self) -> &[String] {
        &self.allow_prefixes
    }
}

impl Default for PolicyGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rm_rf_denied_with_pattern() {
        let gate = PolicyGate::new();
        let decision = gate.evaluate("rm -rf /var/log/*");
        assert_eq!(
            decision,
            PolicyDecision::Denied {
                matched_pattern: "rm ".to_string()
            }
        );
        assert!(decision.reason().unwrap().contains("\"rm\""));
    }

    #[test]
    fn test_ps_pipeline_allowed() {
        let gate = PolicyGate::new();
        assert_eq!(
            gate.evaluate("ps aux --sort=-%mem | head -30"),
            PolicyDecision::Allowed
        );
    }

    #[test]
    fn test_allowed_prefix_with_dangerous_tail() {
        let gate = PolicyGate::new();
        let decision = gate.evaluate("ps aux | xargs rm -f");
        assert_eq!(decision.matched_pattern(), Some("rm "));
    }

    #[test]
    fn test_case_insensitive_match() {
        let gate = PolicyGate::new();
        assert!(!gate.evaluate("PS aux; SUDO ls").is_allowed());
        assert!(gate.evaluate("  FREE -h  ").is_allowed());
    }

    #[test]
    fn test_bare_program_allowed() {
        let gate = PolicyGate::new();
        assert!(gate.evaluate("ps").is_allowed());
        assert!(gate.evaluate("df").is_allowed());
        assert!(gate.evaluate("uptime").is_allowed());
    }

    #[test]
    fn test_unknown_program_denied() {
        let gate = PolicyGate::new();
        let decision = gate.evaluate("python3 -c 'print(1)'");
        assert_eq!(decision.matched_pattern(), Some(NONE_MATCHED));
        assert!(decision.reason().unwrap().contains("not in safe list"));
    }

    #[test]
    fn test_empty_command_denied() {
        let gate = PolicyGate::new();
        assert!(!gate.evaluate("   ").is_allowed());
    }

    #[test]
    fn test_substitution_and_redirection_denied() {
        let gate = PolicyGate::new();
        assert_eq!(gate.evaluate("echo $(whoami)").matched_pattern(), Some("$("));
        assert_eq!(gate.evaluate("ls `pwd`").matched_pattern(), Some("`"));
        assert_eq!(gate.evaluate("df -h > /tmp/x").matched_pattern(), Some("> "));
    }

    #[test]
    fn test_first_match_wins() {
        let gate = PolicyGate::new();
        // "sudo" appears later in the table than "rm ".
        assert_eq!(gate.evaluate("sudo rm -rf /").matched_pattern(), Some("rm "));
    }

    #[test]
    fn test_trailing_pattern_at_end_of_command() {
        let gate = PolicyGate::new();
        assert_eq!(gate.evaluate("ps aux kill ").matched_pattern(), Some("kill "));
        assert_eq!(
            gate.evaluate("ps -o pid= | xargs kill").matched_pattern(),
            Some("kill ")
        );
        assert_eq!(gate.evaluate("ps aux | xargs rm").matched_pattern(), Some("rm "));
        assert_eq!(gate.evaluate("df -h >").matched_pattern(), Some("> "));
        assert_eq!(gate.evaluate("ps aux | su").matched_pattern(), Some("su "));
    }

    #[test]
    fn test_trailing_space_does_not_deny_plain_reads() {
        let gate = PolicyGate::new();
        for command in ["free", "uptime", "hostname", "env", "date", "ps", "lsblk"] {
            assert!(gate.evaluate(command).is_allowed(), "{} was denied", command);
        }
    }

    #[test]
    fn test_extra_denials_appended() {
        let gate = PolicyGate::with_extra_denials(["/etc/shadow", ""]);
        assert_eq!(gate.deny_patterns().len(), DENY_PATTERNS.len() + 1);
        assert_eq!(
            gate.evaluate("grep root /etc/shadow").matched_pattern(),
            Some("/etc/shadow")
        );
        assert!(gate.evaluate("grep root /etc/group").is_allowed());
    }

    #[test]
    fn test_allowed_has_no_reason() {
        assert!(PolicyDecision::Allowed.reason().is_none());
    }
}
