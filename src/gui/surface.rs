use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use crate::core::RenderSurface;

/// Map a native window handle onto the surface kinds an engine can bind to.
/// Wayland and other handle kinds have nothing to embed into.
pub fn surface_from_raw(handle: RawWindowHandle) -> Option<RenderSurface> {
    match handle {
        RawWindowHandle::Xlib(h) => Some(RenderSurface::XWindow(h.window as u64)),
        RawWindowHandle::Xcb(h) => Some(RenderSurface::XWindow(h.window.get() as u64)),
        RawWindowHandle::Win32(h) => Some(RenderSurface::Hwnd(h.hwnd.get())),
        RawWindowHandle::AppKit(h) => Some(RenderSurface::NsView(h.ns_view.as_ptr() as usize)),
        _ => None,
    }
}

pub fn surface_of(window: &impl HasWindowHandle) -> Option<RenderSurface> {
    match window.window_handle() {
        Ok(handle) => surface_from_raw(handle.as_raw()),
        Err(e) => {
            log::warn!("Window handle unavailable: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raw_window_handle::{
        AppKitWindowHandle, Win32WindowHandle, WaylandWindowHandle, XcbWindowHandle,
        XlibWindowHandle,
    };
    use std::num::{NonZeroIsize, NonZeroU32};
    use std::ptr::NonNull;

    #[test]
    fn test_x11_handles() {
        let xlib = XlibWindowHandle::new(0x3a00007);
        assert_eq!(
            surface_from_raw(RawWindowHandle::Xlib(xlib)),
            Some(RenderSurface::XWindow(0x3a00007))
        );

        let xcb = XcbWindowHandle::new(NonZeroU32::new(42).unwrap());
        assert_eq!(
            surface_from_raw(RawWindowHandle::Xcb(xcb)),
            Some(RenderSurface::XWindow(42))
        );
    }

    #[test]
    fn test_win32_handle() {
        let win32 = Win32WindowHandle::new(NonZeroIsize::new(0x1234).unwrap());
        assert_eq!(
            surface_from_raw(RawWindowHandle::Win32(win32)),
            Some(RenderSurface::Hwnd(0x1234))
        );
    }

    #[test]
    fn test_appkit_handle() {
        let mut view = 0u8;
        let ptr = NonNull::from(&mut view).cast();
        let appkit = AppKitWindowHandle::new(ptr);
        assert_eq!(
            surface_from_raw(RawWindowHandle::AppKit(appkit)),
            Some(RenderSurface::NsView(ptr.as_ptr() as usize))
        );
    }

    #[test]
    fn test_wayland_has_no_surface() {
        let mut surface = 0u8;
        let wayland = WaylandWindowHandle::new(NonNull::from(&mut surface).cast());
        assert_eq!(surface_from_raw(RawWindowHandle::Wayland(wayland)), None);
    }
}
