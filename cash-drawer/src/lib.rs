//! # cash-drawer
//!
//! Cash drawer driver. Drawers are wired to the kick-out connector of a
//! receipt printer, so opening one means sending an ESC/POS `ESC p` pulse
//! to that printer over raw TCP (port 9100).
//!
//! ```ignore
//! use cash_drawer::{CashDrawer, NetworkCashDrawer};
//!
//! let drawer = NetworkCashDrawer::new("192.168.1.100", 9100)?;
//! drawer.open().await?;
//! ```

mod drawer;
mod error;

pub use drawer::{CashDrawer, NetworkCashDrawer, PULSE_PIN_2, PULSE_PIN_5};
pub use error::{DrawerError, DrawerResult};
