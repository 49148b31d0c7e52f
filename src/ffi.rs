//! C ABI for UI hosts. Every string result is heap JSON owned by the caller
//! and must be handed back to [`free_json`].

use std::ffi::{c_char, c_int, CStr, CString};
use std::ptr;
use std::sync::OnceLock;

use log::{debug, error, info};
use serde::Serialize;
use serde_json::json;

use crate::cache::TleCache;
use crate::config::{CoordFormat, Observer};
use crate::error::Result;
use crate::init_logger;
use crate::propagation::satellite_info;
use crate::track::ground_tracks;
use crate::visibility::visible_satellites;

static CACHE: OnceLock<TleCache> = OnceLock::new();

fn cache() -> &'static TleCache {
    CACHE.get_or_init(TleCache::new)
}

fn read_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

fn into_c_json(json: String) -> *mut c_char {
    // serde_json escapes control characters, so there is no interior NUL.
    CString::new(json)
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

fn respond<T: Serialize>(caller: &str, result: Result<T>) -> *mut c_char {
    let json = match result {
        Ok(value) => serde_json::to_string(&value)
            .unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string()),
        Err(e) => {
            error!("[{caller}] {e}");
            json!({ "error": e.to_string() }).to_string()
        }
    };
    into_c_json(json)
}

/// Blank-line separated TLE records.
fn split_records(text: &str) -> Vec<Vec<&str>> {
    let mut records = Vec::new();
    let mut current = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        records.push(current);
    }
    records
}

#[no_mangle]
pub extern "C" fn free_json(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        let _ = CString::from_raw(ptr);
    }
}

#[no_mangle]
pub extern "C" fn tle_parse_json(tle_text: *const c_char) -> *mut c_char {
    init_logger();
    let Some(text) = read_str(tle_text) else {
        return ptr::null_mut();
    };
    respond("tle_parse_json", cache().parse(text.as_str()))
}

/// 1 when the TLE is well formed with matching checksums, otherwise 0.
#[no_mangle]
pub extern "C" fn tle_is_valid(tle_text: *const c_char) -> c_int {
    init_logger();
    let Some(text) = read_str(tle_text) else {
        return 0;
    };
    c_int::from(cache().is_valid(text.as_str()))
}

#[no_mangle]
pub extern "C" fn tle_satellite_info_json(
    tle_text: *const c_char,
    timestamp_ms: i64,
    lat: f64,
    lng: f64,
    height_km: f64,
) -> *mut c_char {
    init_logger();
    let Some(text) = read_str(tle_text) else {
        return ptr::null_mut();
    };
    debug!("[tle_satellite_info_json] t={timestamp_ms} observer=({lat}, {lng}, {height_km})");
    let observer = Observer::new(lat, lng, height_km);
    respond(
        "tle_satellite_info_json",
        satellite_info(cache(), text.as_str(), timestamp_ms, &observer),
    )
}

/// Ground tracks as nested `[lng, lat]` arrays.
#[no_mangle]
pub extern "C" fn tle_ground_tracks_json(
    tle_text: *const c_char,
    start_ms: i64,
    step_ms: i64,
) -> *mut c_char {
    init_logger();
    let Some(text) = read_str(tle_text) else {
        return ptr::null_mut();
    };
    info!("[tle_ground_tracks_json] start={start_ms} step={step_ms}");
    respond(
        "tle_ground_tracks_json",
        ground_tracks(cache(), text.as_str(), start_ms, step_ms, CoordFormat::LngLat),
    )
}

#[no_mangle]
pub extern "C" fn tle_visible_satellites_json(
    tles_text: *const c_char,
    lat: f64,
    lng: f64,
    height_km: f64,
    elevation_threshold: f64,
    timestamp_ms: i64,
) -> *mut c_char {
    init_logger();
    let Some(text) = read_str(tles_text) else {
        return ptr::null_mut();
    };
    let records = split_records(&text);
    let observer = Observer::new(lat, lng, height_km);
    let visible = visible_satellites(
        cache(),
        &observer,
        records.iter().map(Vec::as_slice),
        elevation_threshold,
        timestamp_ms,
    );
    info!(
        "[tle_visible_satellites_json] {} of {} above {elevation_threshold}°",
        visible.len(),
        records.len()
    );
    respond("tle_visible_satellites_json", Ok(visible))
}

#[no_mangle]
pub extern "C" fn tle_clear_cache() {
    init_logger();
    cache().clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_split_on_blank_lines() {
        let text = "A\n1 x\n2 y\n\n\r\n1 z\r\n2 w\n\n";
        assert_eq!(
            split_records(text),
            vec![vec!["A", "1 x", "2 y"], vec!["1 z", "2 w"]]
        );
    }

    #[test]
    fn null_input_gives_null_output() {
        assert!(tle_parse_json(ptr::null()).is_null());
        assert_eq!(tle_is_valid(ptr::null()), 0);
        free_json(ptr::null_mut());
    }
}
