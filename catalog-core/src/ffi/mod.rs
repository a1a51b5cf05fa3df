// Host bindings

// WASM bindings (compiled for wasm32-unknown-unknown with `--features wasm`)
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub mod wasm;

// C ABI bindings for native hosts
#[cfg(not(target_arch = "wasm32"))]
pub mod native;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub use wasm::*;

#[cfg(not(target_arch = "wasm32"))]
pub use native::*;
