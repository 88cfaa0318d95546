use serde::Serialize;
use sysgate_executor::ShellCommand;
use sysgate_interpreter::ResultShape;

const PS_COLUMNS: &[&str] = &[
    "USER", "PID", "%CPU", "%MEM", "VSZ", "RSS", "TTY", "STAT", "START", "TIME", "COMMAND",
];
const FREE_COLUMNS: &[&str] = &["total", "used", "free", "shared", "buff/cache", "available"];
const MEMINFO_COLUMNS: &[&str] = &["FIELD", "VALUE"];

/// Name of the entry that also carries the parsed health card values.
pub const SUMMARY: &str = "summary";

/// Probe commands behind the health cards: memory, disk, CPU, uptime.
pub const SUMMARY_PROBES: [&str; 4] = ["free", "df -h", "cat /proc/stat | head -1", "uptime"];

/// A pre-approved pipeline. Never built from caller text, so it skips the
/// policy gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub command: &'static str,
    pub category: &'static str,
    pub shape: ResultShape,
    pub columns: &'static [&'static str],
}

impl CatalogEntry {
    pub fn shell_command(&self) -> ShellCommand {
        ShellCommand::new(self.command)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.to_string()).collect()
    }

    pub fn is_summary(&self) -> bool {
        self.name == SUMMARY
    }
}

const fn entry(
    name: &'static str,
    command: &'static str,
    category: &'static str,
    shape: ResultShape,
    columns: &'static [&'static str],
) -> CatalogEntry {
    CatalogEntry {
        name,
        command,
        category,
        shape,
        columns,
    }
}

static ENTRIES: &[CatalogEntry] = &[
    entry(
        "health",
        "echo \"=== UPTIME ===\" && uptime && echo \"\" && echo \"=== MEMORY ===\" && free -h && echo \"\" && echo \"=== DISK ===\" && df -h && echo \"\" && echo \"=== LOAD ===\" && cat /proc/loadavg",
        "system",
        ResultShape::PlainText,
        &[],
    ),
    entry(
        "cpu",
        "cat /proc/stat | head -1 && echo \"\" && cat /proc/loadavg",
        "cpu",
        ResultShape::PlainText,
        &[],
    ),
    entry("memory", "free -h", "memory", ResultShape::Table, FREE_COLUMNS),
    entry("disk", "df -h", "disk", ResultShape::ProgressBar, &[]),
    entry("uptime", "uptime", "system", ResultShape::PlainText, &[]),
    entry(
        "processes",
        "ps aux --sort=-%mem | head -30",
        "processes",
        ResultShape::Table,
        PS_COLUMNS,
    ),
    entry(
        "processes_cpu",
        "ps aux --sort=-%cpu | head -30",
        "processes",
        ResultShape::Table,
        PS_COLUMNS,
    ),
    entry(
        "top_memory",
        "ps aux --sort=-%mem | head -15",
        "processes",
        ResultShape::Table,
        PS_COLUMNS,
    ),
    entry(
        "top_cpu",
        "ps aux --sort=-%cpu | head -15",
        "processes",
        ResultShape::Table,
        PS_COLUMNS,
    ),
    entry("network", "cat /proc/net/dev", "network", ResultShape::PlainText, &[]),
    entry("hostname", "hostname && uname -a", "system", ResultShape::PlainText, &[]),
    entry("loadavg", "cat /proc/loadavg", "cpu", ResultShape::PlainText, &[]),
    entry("meminfo", "cat /proc/meminfo", "memory", ResultShape::Table, MEMINFO_COLUMNS),
    entry("cpuinfo", "cat /proc/cpuinfo | head -30", "cpu", ResultShape::PlainText, &[]),
    entry(
        SUMMARY,
        "echo \"MEM:\" && free | grep Mem && echo \"DISK:\" && df / | tail -1 && echo \"UP:\" && uptime -p 2>/dev/null || uptime && echo \"LOAD:\" && cat /proc/loadavg",
        "system",
        ResultShape::PlainText,
        &[],
    ),
];

/// Symbolic metric names mapped to fixed pipelines.
#[derive(Debug, Clone, Copy)]
pub struct CommandCatalog {
    entries: &'static [CatalogEntry],
}

impl CommandCatalog {
    pub fn new() -> Self {
        Self { entries: ENTRIES }
    }

    pub fn resolve(&self, name: &str) -> Option<&'static CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &'static CatalogEntry> {
        self.entries.iter()
    }
}

impl Default for CommandCatalog {
    fn default() -> Self {
        Self::new()
    }
}
