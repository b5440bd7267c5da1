pub use ILimitOrderHook::{
    ILimitOrderHookErrors as LimitOrderHookError, ILimitOrderHookEvents as LimitOrderHookEvent,
};

alloy_sol_types::sol! {
    /// Resting limit orders pinned to a single tick range of a pool.
    ///
    /// Depositors pool liquidity into one order per `(poolId, tickLower, zeroForOne)` slot. When
    /// the pool price crosses the whole range, the hook pulls the liquidity out of the pool and
    /// keeps the proceeds until each depositor withdraws their pro-rata share.
    ///
    /// `zeroForOne = true` sells asset0 while the price rises, `false` sells asset1 while the
    /// price falls. Ticks are `int32` so they map onto native Rust integers.
    #[derive(Debug, PartialEq, Eq)]
    #[allow(clippy::too_many_arguments)]
    interface ILimitOrderHook {
        struct Order {
            bool filled;
            address asset0;
            address asset1;
            uint128 settled0Total;
            uint128 settled1Total;
            uint128 liquidityTotal;
            uint128 proceeds0;
            uint128 proceeds1;
        }

        // Orders
        function place(bytes32 poolId, int32 tickLower, bool zeroForOne, uint128 liquidity) external returns (uint128 orderId);
        function kill(bytes32 poolId, int32 tickLower, bool zeroForOne, address to) external returns (uint128 amount0, uint128 amount1);
        function withdraw(uint128 orderId, address to) external returns (uint128 amount0, uint128 amount1);

        // Pool manager notifications
        function afterInitialize(bytes32 poolId, int32 tick) external;
        function afterSwap(bytes32 poolId, int32 tick) external;

        // Views
        function orderAt(bytes32 poolId, int32 tickLower, bool zeroForOne) external view returns (uint128);
        function getOrder(uint128 orderId) external view returns (Order memory);
        function contributionOf(uint128 orderId, address depositor) external view returns (uint128);
        function nextOrderId() external view returns (uint128);
        function observedTick(bytes32 poolId) external view returns (int32);

        // Events
        event Place(address indexed owner, uint128 indexed orderId, bytes32 indexed poolId, int32 tickLower, bool zeroForOne, uint128 liquidity);
        event Fill(uint128 indexed orderId, bytes32 indexed poolId, int32 tickLower, bool zeroForOne, uint128 amount0, uint128 amount1);
        event Kill(address indexed owner, uint128 indexed orderId, bytes32 indexed poolId, int32 tickLower, bool zeroForOne, uint128 liquidity);
        event Withdraw(address indexed owner, uint128 indexed orderId, uint128 liquidity, uint128 amount0, uint128 amount1);

        // Errors
        error ZeroSize();
        error InRange();
        error CrossedRange();
        error NoActiveOrder();
        error InsufficientContribution();
        error AlreadyFilled();
        error NotFilled();
        error ClosedOrder();
        error OnlyPoolManager();
        error Locked();
        error PoolNotObserved();
        error HookNotAttached();
    }
}
