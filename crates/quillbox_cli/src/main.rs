//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `quillbox_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("quillbox_core ping={}", quillbox_core::ping());
    println!("quillbox_core version={}", quillbox_core::core_version());
}
