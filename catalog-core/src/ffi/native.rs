/// C ABI bindings for native hosts
///
/// Exposes hashing, the entry codec and catalog handles as C-compatible
/// functions. The host owns every handle, buffer and string it receives and
/// must release them with the matching `wc_*_free` / `wc_free_*` call.
///
/// Status codes: `1`/`0` for yes/no answers, negative values for errors
/// (`WC_ERR_INVALID_ARG` for null pointers or non-UTF-8 strings,
/// `WC_ERR_MALFORMED` for rejected bytes).
///
/// Build:
///   cargo build -p catalog-core --release
///
/// Link libcatalog_core.a (or the shared library) and declare the functions
/// in a C header.
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::slice;

use crate::bridge::{self, CatalogHandle};

pub const WC_OK: i32 = 0;
pub const WC_ERR_INVALID_ARG: i32 = -1;
pub const WC_ERR_MALFORMED: i32 = -2;

// ─────────────────────── Helper: Byte buffer for returning data ───────────────────────

/// Owned byte buffer returned to the host
/// The host must call wc_free_buffer() when done
#[repr(C)]
pub struct WCBuffer {
    pub data: *mut u8,
    pub len: usize,
    pub cap: usize,
}

impl WCBuffer {
    fn from_vec(v: Vec<u8>) -> Self {
        let mut v = std::mem::ManuallyDrop::new(v);
        WCBuffer {
            data: v.as_mut_ptr(),
            len: v.len(),
            cap: v.capacity(),
        }
    }

    fn null() -> Self {
        WCBuffer {
            data: ptr::null_mut(),
            len: 0,
            cap: 0,
        }
    }
}

unsafe fn str_arg<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

unsafe fn bytes_arg<'a>(data: *const u8, len: usize) -> Option<&'a [u8]> {
    if data.is_null() {
        return if len == 0 { Some(&[][..]) } else { None };
    }
    Some(slice::from_raw_parts(data, len))
}

fn string_out(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c) => c.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ─────────────────────── Core Init ───────────────────────

/// Get the library version string (free with wc_free_string)
#[no_mangle]
pub extern "C" fn wc_version() -> *mut c_char {
    string_out(crate::VERSION.to_string())
}

// ─────────────────────── Hashing (FNV-1a) ───────────────────────

/// Hash a C string
///
/// # Safety
/// `text` must be a valid C string, `out_hash` must point to a u32
#[no_mangle]
pub unsafe extern "C" fn wc_hash_string(text: *const c_char, out_hash: *mut u32) -> i32 {
    if out_hash.is_null() {
        return WC_ERR_INVALID_ARG;
    }
    match str_arg(text) {
        Some(text) => {
            *out_hash = bridge::hash_string(text);
            WC_OK
        }
        None => WC_ERR_INVALID_ARG,
    }
}

/// Render a hash as 8 hex digits (free with wc_free_string)
#[no_mangle]
pub extern "C" fn wc_hash_to_hex(hash: u32) -> *mut c_char {
    string_out(bridge::hash_to_hex(hash))
}

/// Content id of a C string, or null on bad input (free with wc_free_string)
///
/// # Safety
/// `text` must be a valid C string
#[no_mangle]
pub unsafe extern "C" fn wc_content_id(text: *const c_char) -> *mut c_char {
    match str_arg(text) {
        Some(text) => string_out(bridge::content_id(text)),
        None => ptr::null_mut(),
    }
}

// ─────────────────────── Entry codec ───────────────────────

/// Encode an entry into a frame
/// Returns a null buffer on bad input (free with wc_free_buffer)
///
/// # Safety
/// All string arguments must be valid C strings
#[no_mangle]
pub unsafe extern "C" fn wc_encode_entry(
    source_url: *const c_char,
    magnet: *const c_char,
    title: *const c_char,
    added_by: *const c_char,
    preview: *const c_char,
    timestamp: i64,
) -> WCBuffer {
    let (Some(source_url), Some(magnet), Some(title), Some(added_by), Some(preview)) = (
        str_arg(source_url),
        str_arg(magnet),
        str_arg(title),
        str_arg(added_by),
        str_arg(preview),
    ) else {
        return WCBuffer::null();
    };

    match bridge::encode_entry(source_url, magnet, title, added_by, preview, timestamp) {
        Ok(bytes) => WCBuffer::from_vec(bytes),
        Err(_) => WCBuffer::null(),
    }
}

/// Decode a frame into a JSON object, or null if malformed
/// (free with wc_free_string)
///
/// # Safety
/// `data` must point to `len` readable bytes
#[no_mangle]
pub unsafe extern "C" fn wc_decode_entry_json(data: *const u8, len: usize) -> *mut c_char {
    let Some(bytes) = bytes_arg(data, len) else {
        return ptr::null_mut();
    };
    match bridge::decode_entry_json(bytes) {
        Ok(json) => string_out(json),
        Err(_) => ptr::null_mut(),
    }
}

/// Frame length declared by the header, or a negative status
///
/// # Safety
/// `data` must point to `len` readable bytes
#[no_mangle]
pub unsafe extern "C" fn wc_size_of(data: *const u8, len: usize) -> i64 {
    let Some(bytes) = bytes_arg(data, len) else {
        return WC_ERR_INVALID_ARG as i64;
    };
    match bridge::size_of(bytes) {
        Ok(size) => size as i64,
        Err(_) => WC_ERR_MALFORMED as i64,
    }
}

// ─────────────────────── Catalog handles ───────────────────────

/// Create an empty catalog (free with wc_catalog_free)
#[no_mangle]
pub extern "C" fn wc_catalog_new() -> *mut CatalogHandle {
    Box::into_raw(Box::new(CatalogHandle::new()))
}

/// Free a catalog handle
///
/// # Safety
/// `handle` must come from wc_catalog_new and not be used afterwards
#[no_mangle]
pub unsafe extern "C" fn wc_catalog_free(handle: *mut CatalogHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Offer an entry. Returns 1 if stored, 0 if an existing entry was kept
///
/// # Safety
/// `handle` must be live, string arguments must be valid C strings
#[no_mangle]
pub unsafe extern "C" fn wc_catalog_add_entry(
    handle: *mut CatalogHandle,
    source_url: *const c_char,
    magnet: *const c_char,
    title: *const c_char,
    added_by: *const c_char,
    preview: *const c_char,
    timestamp: i64,
) -> i32 {
    let Some(catalog) = handle.as_mut() else {
        return WC_ERR_INVALID_ARG;
    };
    let (Some(source_url), Some(magnet), Some(title), Some(added_by), Some(preview)) = (
        str_arg(source_url),
        str_arg(magnet),
        str_arg(title),
        str_arg(added_by),
        str_arg(preview),
    ) else {
        return WC_ERR_INVALID_ARG;
    };
    catalog.add_entry(source_url, magnet, title, added_by, preview, timestamp) as i32
}

/// Decode a received frame and offer it. Returns 1/0 like wc_catalog_add_entry
///
/// # Safety
/// `handle` must be live, `data` must point to `len` readable bytes
#[no_mangle]
pub unsafe extern "C" fn wc_catalog_apply_frame(
    handle: *mut CatalogHandle,
    data: *const u8,
    len: usize,
) -> i32 {
    let (Some(catalog), Some(bytes)) = (handle.as_mut(), bytes_arg(data, len)) else {
        return WC_ERR_INVALID_ARG;
    };
    match catalog.apply_frame(bytes) {
        Ok(stored) => stored as i32,
        Err(_) => WC_ERR_MALFORMED,
    }
}

/// Merge `other` into `handle`. Returns the number of changed entries
///
/// # Safety
/// Both handles must be live
#[no_mangle]
pub unsafe extern "C" fn wc_catalog_merge_from(
    handle: *mut CatalogHandle,
    other: *const CatalogHandle,
) -> i64 {
    if ptr::eq(handle, other) {
        // Merging a replica into itself changes nothing.
        return if handle.is_null() { WC_ERR_INVALID_ARG as i64 } else { 0 };
    }
    let (Some(catalog), Some(other)) = (handle.as_mut(), other.as_ref()) else {
        return WC_ERR_INVALID_ARG as i64;
    };
    catalog.merge_from(other) as i64
}

/// Summary string for `key`, "" if absent, null on bad arguments
/// (free with wc_free_string)
///
/// # Safety
/// `handle` must be live, `key` must be a valid C string
#[no_mangle]
pub unsafe extern "C" fn wc_catalog_get_entry(
    handle: *const CatalogHandle,
    key: *const c_char,
) -> *mut c_char {
    let (Some(catalog), Some(key)) = (handle.as_ref(), str_arg(key)) else {
        return ptr::null_mut();
    };
    string_out(catalog.get_entry(key))
}

/// Returns 1 if `key` is present, 0 if not
///
/// # Safety
/// `handle` must be live, `key` must be a valid C string
#[no_mangle]
pub unsafe extern "C" fn wc_catalog_has_entry(
    handle: *const CatalogHandle,
    key: *const c_char,
) -> i32 {
    let (Some(catalog), Some(key)) = (handle.as_ref(), str_arg(key)) else {
        return WC_ERR_INVALID_ARG;
    };
    catalog.has_entry(key) as i32
}

/// Stored timestamp for `key`, 0 if absent or on bad arguments
///
/// # Safety
/// `handle` must be live, `key` must be a valid C string
#[no_mangle]
pub unsafe extern "C" fn wc_catalog_get_timestamp(
    handle: *const CatalogHandle,
    key: *const c_char,
) -> i64 {
    match (handle.as_ref(), str_arg(key)) {
        (Some(catalog), Some(key)) => catalog.get_timestamp(key),
        _ => 0,
    }
}

/// Number of entries, or a negative status
///
/// # Safety
/// `handle` must be live
#[no_mangle]
pub unsafe extern "C" fn wc_catalog_count(handle: *const CatalogHandle) -> i64 {
    match handle.as_ref() {
        Some(catalog) => catalog.get_count() as i64,
        None => WC_ERR_INVALID_ARG as i64,
    }
}

/// Snapshot of the whole catalog (free with wc_free_buffer)
///
/// # Safety
/// `handle` must be live
#[no_mangle]
pub unsafe extern "C" fn wc_catalog_export(handle: *const CatalogHandle) -> WCBuffer {
    match handle.as_ref().map(CatalogHandle::export_state) {
        Some(Ok(bytes)) => WCBuffer::from_vec(bytes),
        _ => WCBuffer::null(),
    }
}

/// Merge a snapshot. Returns the number of changed entries or a negative status
///
/// # Safety
/// `handle` must be live, `data` must point to `len` readable bytes
#[no_mangle]
pub unsafe extern "C" fn wc_catalog_import(
    handle: *mut CatalogHandle,
    data: *const u8,
    len: usize,
) -> i64 {
    let (Some(catalog), Some(bytes)) = (handle.as_mut(), bytes_arg(data, len)) else {
        return WC_ERR_INVALID_ARG as i64;
    };
    match catalog.import_state(bytes) {
        Ok(changed) => changed as i64,
        Err(_) => WC_ERR_MALFORMED as i64,
    }
}

// ─────────────────────── Memory Management ───────────────────────

/// Free a string allocated by Rust
///
/// # Safety
/// `s` must be a pointer returned by a `wc_*` function that returns a string
#[no_mangle]
pub unsafe extern "C" fn wc_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Free a byte buffer allocated by Rust
///
/// # Safety
/// Must be called with the exact WCBuffer returned by a `wc_*` function
#[no_mangle]
pub unsafe extern "C" fn wc_free_buffer(buf: WCBuffer) {
    if !buf.data.is_null() {
        drop(Vec::from_raw_parts(buf.data, buf.len, buf.cap));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
