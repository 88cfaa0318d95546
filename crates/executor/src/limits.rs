use rlimit::{setrlimit, Resource};
use serde::{Deserialize, Serialize};

const CPU_SECONDS: u64 = 30;
const FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024; // 10MB
const OPEN_FILES: u64 = 256;

/// Per-child rlimits, applied between fork and exec. `None` leaves the
/// inherited limit untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    pub cpu_seconds: Option<u64>,
    pub max_file_bytes: Option<u64>,
    pub max_open_files: Option<u64>,
    pub max_memory_bytes: Option<u64>,
}

impl ResourceLimits {
    pub fn unlimited() -> Self {
        Self {
            cpu_seconds: None,
            max_file_bytes: None,
            max_open_files: None,
            max_memory_bytes: None,
        }
    }

    /// Runs inside the forked child, so it must stay allocation free.
    pub fn apply(&self) -> std::io::Result<()> {
        if let Some(cpu) = self.cpu_seconds {
            setrlimit(Resource::CPU, cpu, cpu)?;
        }
        if let Some(size) = self.max_file_bytes {
            setrlimit(Resource::FSIZE, size, size)?;
        }
        if let Some(files) = self.max_open_files {
            setrlimit(Resource::NOFILE, files, files)?;
        }
        if let Some(memory) = self.max_memory_bytes {
            setrlimit(Resource::AS, memory, memory)?;
        }
        Ok(())
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_seconds: Some(CPU_SECONDS),
            max_file_bytes: Some(FILE_SIZE_BYTES),
            max_open_files: Some(OPEN_FILES),
            max_memory_bytes: None,
        }
    }
}
