use cucumber::given;

use crate::cucumber::{wallet_world::WalletSystem, WalletWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut WalletWorld) {
    let system = WalletSystem::new().await;
    world.system = Some(system);
}
