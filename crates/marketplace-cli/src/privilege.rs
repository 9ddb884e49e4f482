/// Whether spicetify will refuse to run unless `--bypass-admin` is passed.
pub fn is_admin_user() -> bool {
    let user = std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_default();
    let elevated = process_is_elevated();
    tracing::debug!(user = %user, elevated, "checked administrator rights");
    has_admin_rights(elevated, &user)
}

/// An elevated process counts regardless of the account name; the built-in
/// administrator accounts count even when the elevation query is unavailable.
pub(crate) fn has_admin_rights(elevated: bool, user: &str) -> bool {
    elevated || is_admin_name(user)
}

pub(crate) fn is_admin_name(user: &str) -> bool {
    let user = user.trim();
    user.eq_ignore_ascii_case("administrator") || user.eq_ignore_ascii_case("root")
}

#[cfg(unix)]
pub(crate) fn process_is_elevated() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(windows)]
pub(crate) fn process_is_elevated() -> bool {
    use std::ffi::c_void;

    use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};
    use windows_sys::Win32::Security::{
        GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY,
    };
    use windows_sys::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    let mut token: HANDLE = std::ptr::null_mut();
    // SAFETY: the pseudo handle from GetCurrentProcess needs no cleanup, and
    // `token` is closed below once opened.
    if unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) } == 0 {
        tracing::warn!("could not open process token; assuming not elevated");
        return false;
    }

    let mut elevation = TOKEN_ELEVATION { TokenIsElevated: 0 };
    let mut returned = 0_u32;
    // SAFETY: the buffer is a TOKEN_ELEVATION and its exact size is passed.
    let queried = unsafe {
        GetTokenInformation(
            token,
            TokenElevation,
            (&mut elevation as *mut TOKEN_ELEVATION).cast::<c_void>(),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        )
    };
    // SAFETY: `token` was opened above and is not used afterwards.
    unsafe { CloseHandle(token) };

    if queried == 0 {
        tracing::warn!("could not query token elevation; assuming not elevated");
        return false;
    }
    elevation.TokenIsElevated != 0
}

#[cfg(not(any(unix, windows)))]
pub(crate) fn process_is_elevated() -> bool {
    false
}
