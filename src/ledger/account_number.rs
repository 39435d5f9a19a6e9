use rand::Rng;

pub const ACCOUNT_NUMBER_WIDTH: usize = 9;
const ACCOUNT_NUMBER_SPACE: u32 = 1_000_000_000;

/// Draws a uniformly random, zero-padded nine-digit account number.
///
/// Collisions are not checked here; the store's unique constraint catches
/// them and account creation retries with a fresh number.
pub fn generate_account_number() -> String {
    let n = rand::thread_rng().gen_range(0..ACCOUNT_NUMBER_SPACE);
    format!("{:0width$}", n, width = ACCOUNT_NUMBER_WIDTH)
}

pub fn is_well_formed(account_number: &str) -> bool {
    account_number.len() == ACCOUNT_NUMBER_WIDTH
        && account_number.bytes().all(|b| b.is_ascii_digit())
}
