//! Real-time process setup for the control loop (Linux: mlockall, SCHED_FIFO, affinity).
//!
//! Every step is best effort: a failure is logged and the loop still runs.

use crate::cli::RtLock;

#[derive(Debug, Clone, Copy)]
pub struct RtOptions {
    pub enabled: bool,
    pub prio: Option<i32>,
    pub lock: Option<RtLock>,
    pub cpu: Option<usize>,
}

#[cfg(target_os = "linux")]
pub fn setup_rt_once(opts: RtOptions) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !opts.enabled {
        return;
    }
    RT_ONCE.get_or_init(|| {
        let lock = opts.lock.unwrap_or(RtLock::os_default());
        match linux::lock_memory(lock) {
            Ok(()) => tracing::info!(?lock, "rt: memory lock applied"),
            Err(e) => tracing::warn!(error = %e, ?lock, "rt: mlockall failed"),
        }
        match linux::set_fifo_priority(opts.prio) {
            Ok(prio) => tracing::info!(prio, "rt: SCHED_FIFO enabled"),
            Err(e) => tracing::warn!(error = %e, "rt: SCHED_FIFO not applied"),
        }
        let cpu = opts.cpu.unwrap_or(0);
        match linux::pin_to_cpu(cpu) {
            Ok(()) => tracing::info!(cpu, "rt: pinned to cpu"),
            Err(e) => tracing::warn!(error = %e, cpu, "rt: affinity not applied"),
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(opts: RtOptions) {
    if opts.enabled {
        tracing::warn!("rt: real-time mode is only supported on Linux; ignoring --rt");
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use super::RtLock;
    use std::io;

    const CAP_SYS_NICE: u64 = 1 << 23;

    fn check(rc: libc::c_int) -> io::Result<()> {
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    fn memlock_limit_kib() -> Option<u64> {
        let mut rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: rlim is a valid, writable rlimit.
        let rc = unsafe { libc::getrlimit(libc::RLIMIT_MEMLOCK, &mut rlim) };
        (rc == 0 && rlim.rlim_cur != libc::RLIM_INFINITY).then(|| rlim.rlim_cur / 1024)
    }

    pub fn lock_memory(lock: RtLock) -> eyre::Result<()> {
        let flags = match lock {
            RtLock::None => return Ok(()),
            RtLock::Current => libc::MCL_CURRENT,
            RtLock::All => libc::MCL_CURRENT | libc::MCL_FUTURE,
        };
        // SAFETY: mlockall takes only flags.
        let first = check(unsafe { libc::mlockall(flags) });
        let Err(err) = first else {
            return Ok(());
        };
        let retryable = matches!(err.raw_os_error(), Some(libc::EPERM | libc::ENOMEM));
        if lock == RtLock::All && retryable {
            // SAFETY: as above.
            if check(unsafe { libc::mlockall(libc::MCL_CURRENT) }).is_ok() {
                tracing::warn!(error = %err, "rt: mlockall(current|future) failed; locked current pages only");
                return Ok(());
            }
        }
        let limit = memlock_limit_kib()
            .map(|kib| format!("{kib} KiB"))
            .unwrap_or_else(|| "unlimited".to_string());
        eyre::bail!("{err} (memlock limit: {limit}; needs CAP_IPC_LOCK or a larger 'ulimit -l')")
    }

    fn has_cap_sys_nice() -> bool {
        let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
            return false;
        };
        status
            .lines()
            .filter_map(|l| l.strip_prefix("CapEff:"))
            .filter_map(|hex| u64::from_str_radix(hex.trim(), 16).ok())
            .any(|caps| caps & CAP_SYS_NICE != 0)
    }

    pub fn set_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
        // SAFETY: geteuid has no preconditions.
        let euid = unsafe { libc::geteuid() };
        if euid != 0 && !has_cap_sys_nice() {
            eyre::bail!(
                "needs CAP_SYS_NICE or root (euid {euid}); try 'sudo setcap cap_sys_nice=ep <binary>'"
            );
        }
        // SAFETY: plain queries on a valid policy constant.
        let (min, max) = unsafe {
            (
                libc::sched_get_priority_min(libc::SCHED_FIFO),
                libc::sched_get_priority_max(libc::SCHED_FIFO),
            )
        };
        let (min, max) = if min < 0 || max < 0 { (1, 99) } else { (min, max) };
        let wanted = prio.unwrap_or(max).clamp(min, max);
        let param = libc::sched_param {
            sched_priority: wanted,
        };
        // SAFETY: param outlives the call; pid 0 is the calling process.
        check(unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) })?;
        Ok(wanted)
    }

    pub fn pin_to_cpu(cpu: usize) -> eyre::Result<()> {
        let capacity = std::mem::size_of::<libc::cpu_set_t>() * 8;
        if cpu >= capacity {
            eyre::bail!("cpu {cpu} exceeds cpu_set_t capacity {capacity}");
        }
        // SAFETY: cpu_set_t is plain data; zeroed is a valid empty set.
        let mut allowed: libc::cpu_set_t = unsafe { std::mem::zeroed() };
        let size = std::mem::size_of::<libc::cpu_set_t>();
        // SAFETY: allowed is a valid cpu_set_t of `size` bytes.
        check(unsafe { libc::sched_getaffinity(0, size, &mut allowed) })?;
        // SAFETY: cpu < capacity checked above.
        if !unsafe { libc::CPU_ISSET(cpu, &allowed) } {
            eyre::bail!("cpu {cpu} not permitted by the current affinity mask");
        }
        // SAFETY: as above.
        let mut desired: libc::cpu_set_t = unsafe { std::mem::zeroed() };
        unsafe {
            libc::CPU_ZERO(&mut desired);
            libc::CPU_SET(cpu, &mut desired);
        }
        // SAFETY: desired is a valid cpu_set_t of `size` bytes.
        check(unsafe { libc::sched_setaffinity(0, size, &desired) })?;
        Ok(())
    }
}
