pub use IPoolManager::{
    IPoolManagerErrors as PoolManagerError, IPoolManagerEvents as PoolManagerEvent,
};

alloy_sol_types::sol! {
    /// Discretized-price pool engine.
    ///
    /// Every pool trades `asset0` against `asset1` on a grid of ticks spaced `tickSpacing`
    /// apart. Liquidity is provided over aligned tick ranges, swaps move the pool tick to a
    /// requested limit, and balances are kept as internal claims.
    #[derive(Debug, PartialEq, Eq)]
    #[allow(clippy::too_many_arguments)]
    interface IPoolManager {
        struct PoolKey {
            address asset0;
            address asset1;
            int32 tickSpacing;
            address hooks;
        }

        struct Pool {
            address asset0;
            address asset1;
            int32 tickSpacing;
            address hooks;
            int32 tick;
            uint128 reserve0;
            uint128 reserve1;
        }

        // Pools
        function initialize(PoolKey memory key, int32 tick) external returns (bytes32 poolId);
        function getPoolId(PoolKey memory key) external pure returns (bytes32);
        function getPool(bytes32 poolId) external view returns (Pool memory);

        // Liquidity
        function addLiquidity(bytes32 poolId, int32 tickLower, int32 tickUpper, bytes32 salt, uint128 liquidity) external returns (uint128 amount0, uint128 amount1);
        function removeLiquidity(bytes32 poolId, int32 tickLower, int32 tickUpper, bytes32 salt, uint128 liquidity, address to) external returns (uint128 amount0, uint128 amount1);
        function positionLiquidity(bytes32 poolId, address owner, int32 tickLower, int32 tickUpper, bytes32 salt) external view returns (uint128);
        function rangeLiquidity(bytes32 poolId, int32 tickLower) external view returns (uint128);

        // Swaps
        function swap(bytes32 poolId, int32 tickLimit) external returns (uint128 amountIn, uint128 amountOut);

        // Claims
        function balanceOf(address owner, address asset) external view returns (uint128);
        function transfer(address to, address asset, uint128 amount) external;

        // Events
        event Initialize(bytes32 indexed poolId, address indexed asset0, address indexed asset1, int32 tickSpacing, address hooks, int32 tick);
        event ModifyLiquidity(bytes32 indexed poolId, address indexed owner, int32 tickLower, int32 tickUpper, bytes32 salt, uint128 liquidity, bool added);
        event Swap(bytes32 indexed poolId, address indexed sender, int32 tickBefore, int32 tickAfter, uint128 amountIn, uint128 amountOut);
        event Transfer(address indexed from, address indexed to, address indexed asset, uint128 amount);

        // Errors
        error PoolNotInitialized();
        error PoolAlreadyInitialized();
        error InvalidAssets();
        error InvalidTickSpacing();
        error TickOutOfBounds(int32 tick);
        error MisalignedRange();
        error ZeroLiquidity();
        error InsufficientBalance(uint128 available, uint128 required);
        error InsufficientLiquidity();
        error InsufficientReserves();
    }
}
