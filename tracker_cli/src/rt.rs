//! CPU affinity for the control thread (Linux `sched_setaffinity`).

#[cfg(target_os = "linux")]
/// Capacity of cpu_set_t in CPU indices (bits).
const MAX_CPUSET_BITS: usize = std::mem::size_of::<libc::cpu_set_t>() * 8;

/// Pin the calling thread to `cpu` if the current affinity mask allows it.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(cpu: usize) -> eyre::Result<()> {
    use libc::{CPU_ISSET, CPU_SET, CPU_ZERO, cpu_set_t};

    let online = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if online < 1 {
        eyre::bail!("_SC_NPROCESSORS_ONLN < 1");
    }
    if i64::try_from(cpu).unwrap_or(i64::MAX) >= i64::from(online) {
        eyre::bail!("requested CPU {cpu} >= online {online}");
    }
    if cpu >= MAX_CPUSET_BITS {
        eyre::bail!("requested CPU {cpu} exceeds cpu_set_t capacity {MAX_CPUSET_BITS}");
    }

    let mut allowed: cpu_set_t = unsafe { std::mem::zeroed() };
    let rc = unsafe {
        CPU_ZERO(&mut allowed);
        libc::sched_getaffinity(0, std::mem::size_of::<cpu_set_t>(), &mut allowed)
    };
    if rc != 0 {
        return Err(eyre::Report::new(std::io::Error::last_os_error()).wrap_err("sched_getaffinity"));
    }
    if !unsafe { CPU_ISSET(cpu, &allowed) } {
        eyre::bail!("CPU {cpu} not permitted by current affinity mask");
    }

    let mut desired: cpu_set_t = unsafe { std::mem::zeroed() };
    let rc = unsafe {
        CPU_ZERO(&mut desired);
        CPU_SET(cpu, &mut desired);
        // pid 0: the calling thread
        libc::sched_setaffinity(0, std::mem::size_of::<cpu_set_t>(), &desired)
    };
    if rc != 0 {
        return Err(eyre::Report::new(std::io::Error::last_os_error()).wrap_err("sched_setaffinity"));
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(cpu: usize) -> eyre::Result<()> {
    eyre::bail!("CPU pinning (cpu {cpu}) is only supported on Linux")
}

/// Apply pinning on the control thread; failures are logged, never fatal.
pub fn pin_control_thread(cpu: Option<usize>) {
    let Some(cpu) = cpu else {
        return;
    };
    match pin_current_thread(cpu) {
        Ok(()) => tracing::info!(cpu, "control thread pinned"),
        Err(err) => tracing::warn!(cpu, error = %err, "affinity not applied"),
    }
}
