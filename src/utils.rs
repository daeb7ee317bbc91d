//! 平台相关的辅助工具：panic hook 与控制台日志。

pub fn set_panic_hook() {
    // 让 wasm 中的 panic 信息输出到浏览器控制台。
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// `format!`-style logging to the browser console; a no-op off wasm.
macro_rules! log {
    ($($t:tt)*) => {{
        #[cfg(target_arch = "wasm32")]
        {
            web_sys::console::log_1(&format!($($t)*).into());
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            if false {
                let _ = format!($($t)*);
            }
        }
    }};
}

pub(crate) use log;
