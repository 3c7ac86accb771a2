#![allow(non_snake_case)]
//! Host-facing entry points.
//!
//! The simulator loads this module and drives it through four C-compatible
//! functions. The host ABI forces one piece of global state: a single bridge
//! instance behind a mutex, populated in `Init`, cleared in `Shutdown`,
//! checked for presence in every entry point. Nothing is allowed to unwind
//! across the boundary; every entry point is wrapped in `catch_unwind` and
//! failure degrades to "no output this tick".

use aerobridge_core::codec::encode_message;
use aerobridge_core::utils::init_logger;
use aerobridge_core::{Bridge, BridgeConfig};
use parking_lot::Mutex;
use std::ffi::{c_int, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, warn};

/// Interface version expected by the host SDK's loader.
pub const INTERFACE_VERSION: c_int = 2;

static BRIDGE: Mutex<Option<Bridge>> = Mutex::new(None);

/// Version query; the host refuses to load on a mismatch.
#[no_mangle]
pub extern "C" fn Aerofly_FS_4_External_DLL_GetInterfaceVersion() -> c_int {
    INTERFACE_VERSION
}

/// Construct the bridge. Returns 1 on success, 0 on failure (the host then
/// unloads the module).
#[no_mangle]
pub extern "C" fn Aerofly_FS_4_External_DLL_Init(_module_handle: *mut c_void) -> c_int {
    let outcome = catch_unwind(|| {
        let config = match BridgeConfig::from_env() {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "bad environment configuration, using defaults");
                BridgeConfig::default()
            }
        };
        init_logger(&config.log_level);
        Bridge::init(config)
    });

    match outcome {
        Ok(Ok(bridge)) => {
            *BRIDGE.lock() = Some(bridge);
            1
        }
        Ok(Err(e)) => {
            error!(error = %e, "bridge init failed");
            0
        }
        Err(_) => {
            error!("bridge init panicked");
            0
        }
    }
}

/// Per-tick callback.
///
/// `received_bytes` is the simulator's packed message stream; translated
/// commands are written back into `out_bytes` up to `out_capacity` bytes,
/// whole messages only. Output counters are always written (zero on any
/// failure path).
///
/// # Safety
///
/// Pointers must be valid for the advertised lengths; `out_len` and
/// `out_msg_count` must be writable. The host guarantees all of this.
#[no_mangle]
pub unsafe extern "C" fn Aerofly_FS_4_External_DLL_Update(
    dt: f64,
    received_bytes: *const u8,
    received_len: u32,
    _received_msg_count: u32,
    out_bytes: *mut u8,
    out_len: *mut u32,
    out_msg_count: *mut u32,
    out_capacity: u32,
) {
    if !out_len.is_null() {
        *out_len = 0;
    }
    if !out_msg_count.is_null() {
        *out_msg_count = 0;
    }

    let input: &[u8] = if received_bytes.is_null() || received_len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(received_bytes, received_len as usize)
    };

    let result = catch_unwind(AssertUnwindSafe(|| {
        let mut guard = BRIDGE.lock();
        let bridge = guard.as_mut()?;
        Some(bridge.tick(input, dt))
    }));

    let messages = match result {
        Ok(Some(messages)) => messages,
        Ok(None) => return,
        Err(_) => {
            error!("tick panicked; output suppressed");
            return;
        }
    };

    if messages.is_empty() || out_bytes.is_null() || out_len.is_null() || out_msg_count.is_null()
    {
        return;
    }

    let capacity = out_capacity as usize;
    let mut written = 0usize;
    let mut count = 0u32;
    let mut encoded = Vec::with_capacity(64);
    for msg in &messages {
        encoded.clear();
        encode_message(msg, &mut encoded);
        if written + encoded.len() > capacity {
            warn!(
                dropped = messages.len() - count as usize,
                "host output buffer full, dropping remaining commands"
            );
            break;
        }
        std::ptr::copy_nonoverlapping(encoded.as_ptr(), out_bytes.add(written), encoded.len());
        written += encoded.len();
        count += 1;
    }

    *out_len = written as u32;
    *out_msg_count = count;
}

/// Tear the bridge down. Idempotent; a second call is a no-op.
#[no_mangle]
pub extern "C" fn Aerofly_FS_4_External_DLL_Shutdown() {
    let result = catch_unwind(|| {
        if let Some(mut bridge) = BRIDGE.lock().take() {
            bridge.shutdown();
        }
    });
    if result.is_err() {
        error!("shutdown panicked");
    }
}
