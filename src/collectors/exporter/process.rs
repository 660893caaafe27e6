use prometheus::{Gauge, IntGauge, Opts, Registry};
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use sysinfo::{Pid, System};
use tracing::{debug, instrument, warn};

/// Resource usage of the exporter process itself.
#[derive(Clone)]
pub struct ProcessCollector {
    cpu_percent: Gauge,
    cpu_cores: IntGauge,
    resident_memory_bytes: IntGauge,
    virtual_memory_bytes: IntGauge,
    open_fds: IntGauge,
    start_time_seconds: Gauge,
    system: Arc<Mutex<SystemState>>,
    pid: Pid,
}

struct SystemState {
    system: System,
    last_refresh: Option<Instant>,
}

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(format!("informix_exporter_process_{name}"), help)
}

impl ProcessCollector {
    /// # Errors
    ///
    /// Returns an error if a metric cannot be created.
    pub fn new() -> prometheus::Result<Self> {
        let cpu_percent = Gauge::with_opts(opts(
            "cpu_percent",
            "Current CPU usage percentage (matches ps %cpu, can exceed 100%)",
        ))?;
        let cpu_cores = IntGauge::with_opts(opts(
            "cpu_cores",
            "Number of CPU cores available on the system",
        ))?;
        let resident_memory_bytes = IntGauge::with_opts(opts(
            "resident_memory_bytes",
            "Resident memory size in bytes (RSS)",
        ))?;
        let virtual_memory_bytes = IntGauge::with_opts(opts(
            "virtual_memory_bytes",
            "Virtual memory size in bytes (VSZ)",
        ))?;
        let open_fds = IntGauge::with_opts(opts("open_fds", "Number of open file descriptors"))?;
        let start_time_seconds = Gauge::with_opts(opts(
            "start_time_seconds",
            "Start time of the process since unix epoch in seconds",
        ))?;

        let system = System::new_all();
        cpu_cores.set(i64::try_from(system.cpus().len().max(1)).unwrap_or(0));
        start_time_seconds.set(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs_f64(),
        );

        Ok(Self {
            cpu_percent,
            cpu_cores,
            resident_memory_bytes,
            virtual_memory_bytes,
            open_fds,
            start_time_seconds,
            system: Arc::new(Mutex::new(SystemState {
                system,
                last_refresh: None,
            })),
            pid: Pid::from(std::process::id() as usize),
        })
    }

    /// # Errors
    ///
    /// Returns an error if a metric is already registered.
    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.cpu_percent.clone()))?;
        registry.register(Box::new(self.cpu_cores.clone()))?;
        registry.register(Box::new(self.resident_memory_bytes.clone()))?;
        registry.register(Box::new(self.virtual_memory_bytes.clone()))?;
        registry.register(Box::new(self.open_fds.clone()))?;
        registry.register(Box::new(self.start_time_seconds.clone()))?;
        Ok(())
    }

    fn set_memory(&self, system: &System) {
        if let Some(process) = system.process(self.pid) {
            self.resident_memory_bytes
                .set(i64::try_from(process.memory()).unwrap_or(0));
            self.virtual_memory_bytes
                .set(i64::try_from(process.virtual_memory()).unwrap_or(0));
        }
    }

    /// Refresh process stats. CPU usage is only sampled once the sysinfo
    /// minimum interval has passed; memory is updated every time.
    #[instrument(skip(self), level = "debug")]
    pub fn refresh(&self) {
        let now = Instant::now();

        let mut state = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("System mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        };

        if state
            .last_refresh
            .is_some_and(|last| now.duration_since(last) < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)
        {
            self.set_memory(&state.system);
            return;
        }

        state.system.refresh_all();
        state.last_refresh = Some(now);
        self.set_memory(&state.system);

        if let Some(process) = state.system.process(self.pid) {
            self.cpu_percent.set(f64::from(process.cpu_usage()));
        }

        #[cfg(target_os = "linux")]
        if let Ok(entries) = std::fs::read_dir(format!("/proc/{}/fd", self.pid)) {
            self.open_fds.set(i64::try_from(entries.count()).unwrap_or(0));
        }

        debug!(
            cpu_percent = self.cpu_percent.get(),
            rss_mb = self.resident_memory_bytes.get() / 1024 / 1024,
            fds = self.open_fds.get(),
            "collected process metrics"
        );
    }
}
