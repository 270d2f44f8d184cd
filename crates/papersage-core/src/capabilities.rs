//! Compute resources available to the embedding backend.
//!
//! Hardware is detected once by the binary via [`ComputeResources::discover`]
//! and handed to the embedder explicitly; library code never probes the host.

use serde::{Deserialize, Serialize};

/// CPU and accelerator budget for inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResources {
    /// Number of CPU cores usable for inference.
    pub cpu_cores: usize,
    /// Number of accelerators (GPUs) detected.
    pub accelerators: usize,
}

impl ComputeResources {
    /// Explicit resources, e.g. for tests.
    pub fn new(cpu_cores: usize, accelerators: usize) -> Self {
        Self {
            cpu_cores: cpu_cores.max(1),
            accelerators,
        }
    }

    /// Single core, no accelerator.
    pub fn cpu_only() -> Self {
        Self::new(1, 0)
    }

    /// Discover the resources of the current system.
    pub fn discover() -> Self {
        Self::new(num_cpus(), Self::detect_accelerators())
    }

    /// Intra-op thread count for an inference session.
    ///
    /// Half the cores, capped at 8, so request handling keeps some headroom.
    pub fn intra_threads(&self) -> usize {
        (self.cpu_cores / 2).clamp(1, 8)
    }

    pub fn has_accelerator(&self) -> bool {
        self.accelerators > 0
    }

    fn detect_accelerators() -> usize {
        #[cfg(target_os = "linux")]
        {
            // NVIDIA exposes one device node per GPU
            let discrete = (0..16)
                .take_while(|i| std::fs::metadata(format!("/dev/nvidia{}", i)).is_ok())
                .count();
            if discrete > 0 {
                return discrete;
            }
            // Jetson
            if std::fs::metadata("/dev/nvhost-gpu").is_ok() {
                return 1;
            }
            0
        }
        #[cfg(not(target_os = "linux"))]
        {
            0
        }
    }
}

impl Default for ComputeResources {
    fn default() -> Self {
        Self::cpu_only()
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
