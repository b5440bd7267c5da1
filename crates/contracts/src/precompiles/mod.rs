pub mod limit_order_hook;
pub mod pool_manager;

use alloy_primitives::{Address, address};

pub use limit_order_hook::*;
pub use pool_manager::*;

pub const POOL_MANAGER_ADDRESS: Address = address!("0x9A11000000000000000000000000000000000000");
pub const LIMIT_ORDER_HOOK_ADDRESS: Address =
    address!("0x10C0000000000000000000000000000000000000");

alloy_sol_types::sol! {
    /// Error returned when a function selector is not recognized
    #[derive(Debug, PartialEq, Eq)]
    error UnknownFunctionSelector(bytes4 selector);
}

impl UnknownFunctionSelector {
    /// Creates the error for the given selector.
    pub fn new(selector: [u8; 4]) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}
