//! Real-time scheduling helpers (Linux SCHED_FIFO / mlockall).

use crate::cli::RtLock;

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>, lock: RtLock) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        match apply_mem_lock(lock) {
            Ok(()) => tracing::info!(mode = ?lock, "memory locked"),
            Err(e) => tracing::warn!(error = %e, "mlockall failed; continuing unlocked"),
        }
        match apply_fifo_priority(prio) {
            Ok(p) => tracing::info!(prio = p, "SCHED_FIFO enabled"),
            Err(e) => tracing::warn!(error = %e, "SCHED_FIFO unavailable; continuing"),
        }
    });
}

#[cfg(target_os = "linux")]
fn apply_mem_lock(lock: RtLock) -> std::io::Result<()> {
    let flags = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => libc::MCL_CURRENT,
        RtLock::All => libc::MCL_CURRENT | libc::MCL_FUTURE,
    };
    // SAFETY: mlockall takes no pointers.
    let rc = unsafe { libc::mlockall(flags) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Apply SCHED_FIFO, clamping `prio` to the system range. Returns the priority used.
#[cfg(target_os = "linux")]
fn apply_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
    // SAFETY: plain integer queries.
    let (min, max) = unsafe {
        (
            libc::sched_get_priority_min(libc::SCHED_FIFO),
            libc::sched_get_priority_max(libc::SCHED_FIFO),
        )
    };
    if min < 0 || max < 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    let p = prio.unwrap_or(max / 2).clamp(min, max);
    let param = libc::sched_param { sched_priority: p };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    let rc = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        eyre::bail!("sched_setscheduler: {err}; hint: needs CAP_SYS_NICE or root");
    }
    Ok(p)
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>, _lock: RtLock) {
    if rt {
        tracing::warn!("--rt is only supported on Linux; ignoring");
    }
}
