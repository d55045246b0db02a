use dsreg_ledger::EntityLedger;
use dsreg_store::KeyValueLedger;
use tracing::{debug, info};

use crate::config::SeedUser;
use crate::error::ChaincodeResult;

/// Create every seed user that does not exist yet.
///
/// Returns how many users were created; running it again creates none.
pub fn init<L: KeyValueLedger + ?Sized>(
    ledger: &EntityLedger<L>,
    seeds: &[SeedUser],
) -> ChaincodeResult<usize> {
    let mut created = 0;
    for seed in seeds {
        if ledger.users().user_exists(&seed.id)? {
            debug!(user = %seed.id, "seed user already present");
            continue;
        }
        ledger.users().create_user(&seed.id, &seed.name)?;
        created += 1;
    }
    info!(created, seeds = seeds.len(), "bootstrap complete");
    Ok(created)
}
