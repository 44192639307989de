//! Dynamic module symbol loading over `dlopen(3)`.
use std::{
    ffi::{CStr, CString, c_void},
    os::unix::ffi::OsStrExt,
    path::Path,
};

use tracing::debug;

use crate::error::ModuleError;

/// A symbol resolved from a dynamically loaded module.
///
/// Owns the library handle for as long as the symbol is alive and closes it
/// on drop, so the resolved address never outlives its backing store. The
/// handle is move-only; there can be no more than one reference to the
/// backing store at a time.
#[derive(Debug)]
pub struct ModSymbol {
    handle: *mut c_void,
    addr: *mut c_void,
}

impl ModSymbol {
    /// Raw address of the resolved symbol.
    pub fn addr(&self) -> *const c_void {
        self.addr
    }

    /// Reinterprets the symbol address as a function pointer of type `T`.
    ///
    /// # Safety
    ///
    /// `T` must be a function pointer type whose signature matches the
    /// symbol actually exported by the module.
    pub unsafe fn as_fn<T>(&self) -> T {
        // A function pointer is pointer-sized on every supported target.
        unsafe { std::mem::transmute_copy::<*mut c_void, T>(&self.addr) }
    }
}

impl Drop for ModSymbol {
    fn drop(&mut self) {
        unsafe { libc::dlclose(self.handle) };
    }
}

/// Resolves `symbol` from the module at `module`, loading it with RTLD_NOW.
///
/// On a symbol miss the freshly opened module is closed again before the
/// error is returned. Errors carry the loader-reported reason alongside the
/// module path.
pub fn load_symbol(
    symbol: &str,
    module: impl AsRef<Path>,
) -> Result<ModSymbol, ModuleError> {
    let module = module.as_ref();

    let c_path = CString::new(module.as_os_str().as_bytes()).map_err(|_| {
        ModuleError::OpenFailed {
            path: module.to_path_buf(),
            reason: "path contains an interior NUL byte".into(),
        }
    })?;
    let c_symbol = CString::new(symbol).map_err(|_| ModuleError::SymbolNotFound {
        symbol: symbol.into(),
        path: module.to_path_buf(),
        reason: "symbol name contains an interior NUL byte".into(),
    })?;

    let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW) };
    if handle.is_null() {
        return Err(ModuleError::OpenFailed {
            path: module.to_path_buf(),
            reason: dlerror_string(),
        });
    }

    let addr = unsafe { libc::dlsym(handle, c_symbol.as_ptr()) };
    if addr.is_null() {
        let reason = dlerror_string();
        unsafe { libc::dlclose(handle) };
        return Err(ModuleError::SymbolNotFound {
            symbol: symbol.into(),
            path: module.to_path_buf(),
            reason,
        });
    }

    debug!("resolved '{symbol}' from {}", module.display());
    Ok(ModSymbol { handle, addr })
}

/// Last loader error as a readable string.
fn dlerror_string() -> String {
    let msg = unsafe { libc::dlerror() };
    if msg.is_null() {
        return "unknown loader error".into();
    }
    unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
}
