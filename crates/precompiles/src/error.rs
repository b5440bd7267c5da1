use alloy_primitives::{Bytes, hex};
use alloy_sol_types::{Panic, PanicKind, SolError, SolInterface};
use revm::precompile::{PrecompileError, PrecompileOutput, PrecompileResult};
use tickorder_contracts::precompiles::{
    LimitOrderHookError, PoolManagerError, UnknownFunctionSelector,
};

/// Top-level error type for all precompile operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickOrderPrecompileError {
    /// Error from the limit order hook
    #[error("Limit order hook error: {0:?}")]
    LimitOrderHook(LimitOrderHookError),

    /// Error from the pool manager
    #[error("Pool manager error: {0:?}")]
    PoolManager(PoolManagerError),

    /// Solidity-style panic, raised by checked arithmetic
    #[error("Panic({0:?})")]
    Panic(PanicKind),

    #[error("Unknown function selector: {0:?}")]
    UnknownFunctionSelector([u8; 4]),

    #[error("Fatal precompile error: {0:?}")]
    Fatal(String),
}

/// Result type alias for precompile operations
pub type Result<T> = std::result::Result<T, TickOrderPrecompileError>;

impl TickOrderPrecompileError {
    pub fn under_overflow() -> Self {
        Self::Panic(PanicKind::UnderOverflow)
    }

    pub fn division_by_zero() -> Self {
        Self::Panic(PanicKind::DivisionByZero)
    }

    /// ABI-encoded revert data for this error, or `None` for errors that must halt execution.
    pub fn revert_data(&self) -> Option<Bytes> {
        let bytes = match self {
            Self::LimitOrderHook(e) => e.abi_encode().into(),
            Self::PoolManager(e) => e.abi_encode().into(),
            Self::Panic(kind) => Panic::from(*kind).abi_encode().into(),
            Self::UnknownFunctionSelector(selector) => {
                UnknownFunctionSelector::new(*selector).abi_encode().into()
            }
            Self::Fatal(_) => return None,
        };
        Some(bytes)
    }
}

impl From<LimitOrderHookError> for TickOrderPrecompileError {
    fn from(err: LimitOrderHookError) -> Self {
        Self::LimitOrderHook(err)
    }
}

impl From<PoolManagerError> for TickOrderPrecompileError {
    fn from(err: PoolManagerError) -> Self {
        Self::PoolManager(err)
    }
}

/// Extension trait to convert `Result<T, TickOrderPrecompileError>` into `PrecompileResult`
pub trait IntoPrecompileResult<T> {
    fn into_precompile_result(self, gas: u64, encode_ok: impl FnOnce(T) -> Bytes)
    -> PrecompileResult;
}

impl<T> IntoPrecompileResult<T> for Result<T> {
    fn into_precompile_result(
        self,
        gas: u64,
        encode_ok: impl FnOnce(T) -> Bytes,
    ) -> PrecompileResult {
        match self {
            Ok(res) => Ok(PrecompileOutput::new(gas, encode_ok(res))),
            Err(TickOrderPrecompileError::Fatal(msg)) => Err(PrecompileError::Fatal(msg)),
            Err(err) => Err(PrecompileError::Other(hex::encode(
                err.revert_data().unwrap_or_default(),
            ))),
        }
    }
}
