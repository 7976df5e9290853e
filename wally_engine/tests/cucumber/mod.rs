mod setups;
mod steps;

pub use wallet_world::WalletWorld;
